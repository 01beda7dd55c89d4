//! Error types for hook-model

use std::path::PathBuf;

/// Result type for hook-model operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building the manifest model
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Manifest not found (searched for .hooks.yaml upward from {start})")]
    ManifestNotFound { start: PathBuf },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Repository {repo} has no pinned revision")]
    MissingRevision { repo: String },

    #[error("Hook {id} not found in repository {repo}")]
    DefinitionNotFound { repo: String, id: String },

    #[error("Local hook {id} must declare an entry and a language")]
    LocalHookIncomplete { id: String },

    #[error("Invalid pattern {pattern:?} for hook {id}: {message}")]
    InvalidPattern {
        id: String,
        pattern: String,
        message: String,
    },

    #[error(transparent)]
    Fs(#[from] hook_fs::Error),
}
