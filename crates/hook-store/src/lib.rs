//! Persisted stores for Hook Manager
//!
//! Two content-addressed on-disk stores back every run: the source cache
//! (pinned hook definition checkouts) and the environment store
//! (isolated per-hook runtimes). Both live under the shared cache
//! layout, are safe to delete wholesale and are rebuilt lazily.

pub mod env;
pub mod error;
pub mod source;

pub use env::{EnvBackend, EnvHandle, EnvResolver, EnvSpec};
pub use error::{Error, Result};
pub use source::{SourceCache, source_key};
