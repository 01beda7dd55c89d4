//! Error types for hook-engine
//!
//! Only failures that prevent the run from starting at all surface as
//! errors here. Anything scoped to a single hook instance (fetch,
//! environment, execution) is captured in its [`Outcome`] instead, so
//! one broken hook never silences the rest of the suite.
//!
//! [`Outcome`]: crate::outcome::Outcome

use std::path::PathBuf;

/// Result type for hook-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a run before any hook executes
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not a git repository: {path}")]
    NotARepository { path: PathBuf },

    #[error(transparent)]
    Git(#[from] git2::Error),

    #[error(transparent)]
    Model(#[from] hook_model::Error),

    #[error(transparent)]
    Fs(#[from] hook_fs::Error),
}
