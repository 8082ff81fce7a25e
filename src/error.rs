use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a sync run.
///
/// Ignorable remote failures (`mkdir -p` on an existing directory, listing a
/// directory that does not exist yet) never surface here.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("local path does not exist: {}", path.display())]
    LocalPathNotFound { path: PathBuf },

    #[error("local path is not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    #[error("local path has no UTF-8 remote name: {}", path.display())]
    NonUtf8Path { path: PathBuf },

    #[error("invalid exclude pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("command returned code {code} - \"{stderr}\" ({command})")]
    RemoteCommand {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("{command} did not finish within {secs}s")]
    Timeout { command: String, secs: u64 },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }
}
