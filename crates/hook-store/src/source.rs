//! Content-addressed source cache
//!
//! `fetch(locator, rev)` pins a hook source repository at one revision
//! under the cache root. A second fetch of the same pair is a no-op
//! returning the cached checkout. A `.ready` marker distinguishes a
//! complete checkout from one torn by an interrupted earlier run.

use crate::{Error, Result};
use backoff::ExponentialBackoff;
use hook_fs::CacheLayout;
use std::path::PathBuf;
use std::time::Duration;

/// Marker file written after a checkout completes.
const READY_MARKER: &str = ".ready";

/// Cache key for a (locator, revision) pair.
///
/// The key is the hex digest of the pair, so distinct revisions of one
/// locator occupy distinct checkouts.
pub fn source_key(locator: &str, rev: &str) -> String {
    let checksum = hook_fs::compute_content_checksum(&format!("{locator}@{rev}"));
    checksum
        .strip_prefix("sha256:")
        .unwrap_or(&checksum)
        .to_string()
}

/// The on-disk store of pinned source checkouts.
pub struct SourceCache {
    layout: CacheLayout,
}

impl SourceCache {
    pub fn new(layout: CacheLayout) -> Self {
        Self { layout }
    }

    /// Path a given (locator, rev) pair resolves to, fetched or not.
    pub fn checkout_path(&self, locator: &str, rev: &str) -> PathBuf {
        self.layout.sources_dir().join(source_key(locator, rev))
    }

    /// Fetch `locator` pinned at `rev`, returning the checkout path.
    ///
    /// Idempotent: a complete cached checkout is returned without any
    /// network traffic. Transient network failures are retried with
    /// exponential backoff before the fetch is reported failed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceFetch`] when the locator is unreachable
    /// or the revision unknown; the caller scopes this to the one
    /// repository block that named the pair.
    pub fn fetch(&self, locator: &str, rev: &str) -> Result<PathBuf> {
        let dest = self.checkout_path(locator, rev);
        if dest.join(READY_MARKER).is_file() {
            tracing::debug!(locator, rev, "source cache hit");
            return Ok(dest);
        }

        // A directory without the marker is a torn checkout from an
        // interrupted run; rebuild it from scratch.
        if dest.exists() {
            std::fs::remove_dir_all(&dest)
                .map_err(|e| hook_fs::Error::io(&dest, e))?;
        }
        self.layout.ensure()?;

        tracing::info!(locator, rev, "fetching source");
        let policy = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..ExponentialBackoff::default()
        };
        let repo = backoff::retry(policy, || {
            git2::Repository::clone(locator, &dest).map_err(|e| {
                // A failed clone can leave a partial directory behind,
                // which would make the retry fail on a non-empty dest.
                let _ = std::fs::remove_dir_all(&dest);
                // Only network-class failures are worth retrying; a bad
                // URL or auth failure will not heal.
                if e.class() == git2::ErrorClass::Net {
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        })
        .map_err(|e| {
            let _ = std::fs::remove_dir_all(&dest);
            Error::source_fetch(locator, rev, flatten_backoff(e))
        })?;

        self.checkout_revision(&repo, rev).map_err(|e| {
            let _ = std::fs::remove_dir_all(&dest);
            Error::source_fetch(locator, rev, e.message())
        })?;

        hook_fs::io::write_text(&dest.join(READY_MARKER), &format!("{locator}@{rev}\n"))?;
        Ok(dest)
    }

    /// Check out `rev` as a detached head.
    fn checkout_revision(&self, repo: &git2::Repository, rev: &str) -> std::result::Result<(), git2::Error> {
        let (object, _reference) = repo.revparse_ext(rev)?;
        repo.checkout_tree(
            &object,
            Some(git2::build::CheckoutBuilder::default().force()),
        )?;
        repo.set_head_detached(object.id())?;
        Ok(())
    }
}

fn flatten_backoff(err: backoff::Error<git2::Error>) -> String {
    match err {
        backoff::Error::Permanent(e) => e.message().to_string(),
        backoff::Error::Transient { err, .. } => {
            format!("{} (retries exhausted)", err.message())
        }
    }
}
