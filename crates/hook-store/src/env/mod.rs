//! Execution environments
//!
//! An environment is an isolated, dependency-pinned runtime a hook's
//! program executes in. Environments are content-addressed by
//! (language, version, sorted dependency set), materialized lazily on
//! first use and persisted across invocations.

mod backend;
mod resolver;
mod spec;

pub use backend::{EnvBackend, NodeBackend, PythonBackend};
pub use resolver::{EnvHandle, EnvResolver};
pub use spec::EnvSpec;
