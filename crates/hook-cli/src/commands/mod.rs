//! Command implementations

mod clean;
mod list;
mod run;

pub use clean::run_clean;
pub use list::{run_list, run_validate};
pub use run::run_hooks;

use crate::error::Result;
use hook_model::Manifest;
use std::path::PathBuf;

/// Discover and load the manifest, returning the repository root it
/// governs alongside the parsed model.
fn load_manifest() -> Result<(PathBuf, Manifest)> {
    let cwd = std::env::current_dir()?;
    let path = Manifest::discover(&cwd)?;
    let manifest = Manifest::load(&path)?;
    let root = path
        .parent()
        .map(PathBuf::from)
        .unwrap_or(cwd);
    Ok((root, manifest))
}

/// Build the multi-threaded runtime the engine runs on.
fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}
