use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("`{command}` is not installed")]
    CommandNotFound { command: String },

    #[error("permission denied running `{command}`")]
    PermissionDenied { command: String },

    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {what}: {detail}")]
    Parse { what: String, detail: String },
}

impl CollectError {
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { command: path },
            _ => Self::Io { path, source },
        }
    }

    pub fn spawn(command: impl Into<String>, source: io::Error) -> Self {
        let command = command.into();
        match source.kind() {
            io::ErrorKind::NotFound => Self::CommandNotFound { command },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { command },
            _ => Self::Spawn { command, source },
        }
    }
}
