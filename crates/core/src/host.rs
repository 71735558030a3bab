use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use nix::unistd::Uid;
use sysinfo::Disks;
use tracing::debug;

use crate::error::CollectError;

pub trait HostSystem {
    fn read_file(&self, path: &str) -> io::Result<String>;

    fn read_attribute(&self, path: &str) -> io::Result<String> {
        self.read_file(path).map(|value| value.trim().to_string())
    }

    fn list_directory(&self, path: &str) -> io::Result<Vec<String>>;

    fn read_symlink(&self, path: &str) -> io::Result<String>;

    fn path_exists(&self, path: &str) -> bool;

    // Runs `argv` and returns its stdout. A non-zero exit status is not an
    // error: LVM tools print partial output and fail when unprivileged.
    fn run_command(&self, argv: &[&str]) -> Result<String, CollectError>;

    fn command_available(&self, name: &str) -> bool;

    fn is_root(&self) -> bool;

    fn root_filesystem_bytes(&self) -> io::Result<u64>;
}

#[derive(Debug, Clone)]
pub struct LinuxHost {
    root: PathBuf,
}

impl Default for LinuxHost {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxHost {
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("/"),
        }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl HostSystem for LinuxHost {
    fn read_file(&self, path: &str) -> io::Result<String> {
        fs::read_to_string(self.resolve(path))
    }

    fn list_directory(&self, path: &str) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.resolve(path))? {
            names.push(entry?.file_name().to_string_lossy().to_string());
        }
        Ok(names)
    }

    fn read_symlink(&self, path: &str) -> io::Result<String> {
        fs::read_link(self.resolve(path)).map(|target| target.to_string_lossy().to_string())
    }

    fn path_exists(&self, path: &str) -> bool {
        // symlink_metadata so dangling links (common in /sys) still count
        fs::symlink_metadata(self.resolve(path)).is_ok()
    }

    fn run_command(&self, argv: &[&str]) -> Result<String, CollectError> {
        let Some((program, args)) = argv.split_first() else {
            return Err(CollectError::Parse {
                what: "command line".to_string(),
                detail: "empty argv".to_string(),
            });
        };
        let command_line = argv.join(" ");
        debug!("running `{command_line}`");

        let output = Command::new(program)
            .args(args)
            .env("LC_ALL", "C")
            .output()
            .map_err(|source| CollectError::spawn(*program, source))?;

        if !output.status.success() {
            debug!(
                "`{}` exited with {:?}: {}",
                command_line,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn command_available(&self, name: &str) -> bool {
        which::which(name).is_ok()
    }

    fn is_root(&self) -> bool {
        Uid::effective().is_root()
    }

    fn root_filesystem_bytes(&self) -> io::Result<u64> {
        let disks = Disks::new_with_refreshed_list();
        disks
            .list()
            .iter()
            .find(|disk| disk.mount_point() == Path::new("/"))
            .map(|disk| disk.total_space())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no filesystem mounted on /"))
    }
}
