//! Error types for hook-store

/// Result type for hook-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the source cache and environment resolver.
///
/// Fetch and environment failures carry the identity they are scoped
/// to: a fetch failure is fatal to one repository block, an environment
/// failure to the instances sharing one cache key. Neither aborts the
/// rest of a run; the aggregator records them per instance.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to fetch {locator}@{rev}: {message}")]
    SourceFetch {
        locator: String,
        rev: String,
        message: String,
    },

    #[error("Failed to materialize environment {cache_key}: {message}")]
    Environment { cache_key: String, message: String },

    #[error(transparent)]
    Fs(#[from] hook_fs::Error),
}

impl Error {
    pub fn source_fetch(locator: impl Into<String>, rev: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceFetch {
            locator: locator.into(),
            rev: rev.into(),
            message: message.into(),
        }
    }

    pub fn environment(cache_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Environment {
            cache_key: cache_key.into(),
            message: message.into(),
        }
    }
}
