use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io;

use crate::error::CollectError;
use crate::host::HostSystem;

#[derive(Debug, Clone)]
enum Entry {
    File(String),
    Symlink(String),
    Dir,
}

#[derive(Debug, Clone)]
pub(crate) struct FakeHost {
    entries: BTreeMap<String, Entry>,
    commands: HashMap<String, String>,
    root: bool,
    root_filesystem_bytes: Option<u64>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            commands: HashMap::new(),
            root: true,
            root_filesystem_bytes: None,
        }
    }
}

impl FakeHost {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn file(mut self, path: &str, contents: &str) -> Self {
        self.entries
            .insert(path.to_string(), Entry::File(contents.to_string()));
        self
    }

    pub(crate) fn symlink(mut self, path: &str, target: &str) -> Self {
        self.entries
            .insert(path.to_string(), Entry::Symlink(target.to_string()));
        self
    }

    pub(crate) fn dir(mut self, path: &str) -> Self {
        self.entries.insert(path.to_string(), Entry::Dir);
        self
    }

    pub(crate) fn command(mut self, command_line: &str, stdout: &str) -> Self {
        self.commands
            .insert(command_line.to_string(), stdout.to_string());
        self
    }

    pub(crate) fn unprivileged(mut self) -> Self {
        self.root = false;
        self
    }

    pub(crate) fn root_filesystem(mut self, bytes: u64) -> Self {
        self.root_filesystem_bytes = Some(bytes);
        self
    }

    fn not_found(path: &str) -> io::Error {
        io::Error::new(io::ErrorKind::NotFound, path.to_string())
    }
}

impl HostSystem for FakeHost {
    fn read_file(&self, path: &str) -> io::Result<String> {
        match self.entries.get(path) {
            Some(Entry::File(contents)) => Ok(contents.clone()),
            _ => Err(Self::not_found(path)),
        }
    }

    fn list_directory(&self, path: &str) -> io::Result<Vec<String>> {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let children = self
            .entries
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter_map(|rest| rest.split('/').next())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>();
        if children.is_empty() && !matches!(self.entries.get(path), Some(Entry::Dir)) {
            return Err(Self::not_found(path));
        }
        Ok(children.into_iter().collect())
    }

    fn read_symlink(&self, path: &str) -> io::Result<String> {
        match self.entries.get(path) {
            Some(Entry::Symlink(target)) => Ok(target.clone()),
            Some(_) => Err(io::Error::new(io::ErrorKind::InvalidInput, path.to_string())),
            None => Err(Self::not_found(path)),
        }
    }

    fn path_exists(&self, path: &str) -> bool {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        self.entries.contains_key(path) || self.entries.keys().any(|key| key.starts_with(&prefix))
    }

    fn run_command(&self, argv: &[&str]) -> Result<String, CollectError> {
        self.commands
            .get(&argv.join(" "))
            .cloned()
            .ok_or_else(|| CollectError::CommandNotFound {
                command: argv.first().copied().unwrap_or_default().to_string(),
            })
    }

    fn command_available(&self, name: &str) -> bool {
        self.commands
            .keys()
            .any(|line| line.split(' ').next() == Some(name))
    }

    fn is_root(&self) -> bool {
        self.root
    }

    fn root_filesystem_bytes(&self) -> io::Result<u64> {
        self.root_filesystem_bytes
            .ok_or_else(|| Self::not_found("/"))
    }
}
