//! On-disk cache layout
//!
//! All persisted state lives under a single cache root, content-addressed
//! per subdirectory. The whole tree is safe to delete; it is rebuilt
//! lazily on the next run.

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable overriding the cache root location.
pub const HOME_ENV: &str = "HOOK_MANAGER_HOME";

/// Directory name under the platform cache dir.
const CACHE_DIR_NAME: &str = "hook-manager";

/// Resolved cache layout for one process.
///
/// Holds the root plus the two content-addressed stores: fetched hook
/// source checkouts and materialized execution environments.
#[derive(Debug, Clone)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    /// Resolve the cache root from `HOOK_MANAGER_HOME` or the platform
    /// cache directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCacheDir`] if neither source yields a path.
    pub fn discover() -> Result<Self> {
        if let Some(home) = std::env::var_os(HOME_ENV) {
            return Ok(Self {
                root: PathBuf::from(home),
            });
        }
        let base = dirs::cache_dir().ok_or(Error::NoCacheDir)?;
        Ok(Self {
            root: base.join(CACHE_DIR_NAME),
        })
    }

    /// Create a layout rooted at an explicit path (used by tests and by
    /// `hook clean`).
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding fetched source checkouts, keyed by source checksum.
    pub fn sources_dir(&self) -> PathBuf {
        self.root.join("sources")
    }

    /// Directory holding materialized environments, keyed by env checksum.
    pub fn envs_dir(&self) -> PathBuf {
        self.root.join("envs")
    }

    /// Ensure both store directories exist.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    pub fn ensure(&self) -> Result<()> {
        for dir in [self.sources_dir(), self.envs_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        }
        Ok(())
    }

    /// Delete the entire cache tree.
    ///
    /// Missing directories are not an error; the cache is rebuilt lazily.
    pub fn evict(&self) -> Result<()> {
        tracing::info!(root = %self.root.display(), "evicting cache");
        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(&self.root, e)),
        }
    }
}
