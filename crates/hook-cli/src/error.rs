//! Error types for hook-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from the execution engine
    #[error(transparent)]
    Engine(#[from] hook_engine::Error),

    /// Error from the manifest model
    #[error(transparent)]
    Model(#[from] hook_model::Error),

    /// Error from the filesystem layer
    #[error(transparent)]
    Fs(#[from] hook_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
