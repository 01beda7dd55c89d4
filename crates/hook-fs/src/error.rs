//! Error types for hook-fs

use std::path::PathBuf;

/// Result type for hook-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in hook-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No cache directory available on this platform")]
    NoCacheDir,

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
