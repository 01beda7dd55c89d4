//! SHA-256 checksum utilities
//!
//! Provides the single canonical checksum format (`sha256:<hex>`) used
//! throughout the workspace: environment cache keys, source checkout keys
//! and working-tree fingerprints all go through this module.

use sha2::{Digest, Sha256};
use std::path::Path;

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of string content.
///
/// Returns a string in the canonical format `"sha256:<hex>"`.
pub fn compute_content_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Compute a combined fingerprint over a set of files under `root`.
///
/// The fingerprint covers each file's relative path and content hash, with
/// paths visited in sorted order so the result is independent of the input
/// ordering. A path that does not exist (or is unreadable) contributes a
/// fixed "absent" marker instead of failing, so a hook deleting a file
/// still registers as a modification.
pub fn fingerprint_files<P: AsRef<Path>>(root: &Path, paths: &[P]) -> String {
    let mut sorted: Vec<&Path> = paths.iter().map(AsRef::as_ref).collect();
    sorted.sort();
    sorted.dedup();

    let mut hasher = Sha256::new();
    for rel in sorted {
        hasher.update(rel.as_os_str().as_encoded_bytes());
        hasher.update([0u8]);
        match std::fs::read(root.join(rel)) {
            Ok(content) => {
                let mut inner = Sha256::new();
                inner.update(&content);
                hasher.update(inner.finalize());
            }
            Err(_) => hasher.update(b"absent"),
        }
        hasher.update([0u8]);
    }
    format!("{}{:x}", PREFIX, hasher.finalize())
}
