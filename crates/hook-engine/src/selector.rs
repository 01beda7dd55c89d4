//! Per-hook file selection
//!
//! Filters the universal snapshot down to one hook instance's subset:
//! type tags first, then the exclude pattern, then the positive include
//! pattern. Patterns are extended regular expressions matched against
//! the full relative path, case-sensitive.

use crate::snapshot::FileRecord;
use crate::{Error, Result};
use hook_model::HookInstance;
use std::path::PathBuf;

/// Compute the file subset for one instance.
///
/// Selection is a pure function of the (unordered) universal set and
/// the instance's effective filters: shuffling the input never changes
/// the resulting set. An empty result is normal and means the hook is
/// skipped, not that something went wrong.
///
/// # Errors
///
/// Returns an error only for a pattern that fails to compile, which
/// instance resolution already rules out for manifest-supplied
/// patterns.
pub fn select(universal: &[FileRecord], instance: &HookInstance) -> Result<Vec<PathBuf>> {
    let files_re = compile(&instance.key.id, instance.files.as_deref())?;
    let exclude_re = compile(&instance.key.id, instance.exclude.as_deref())?;

    let mut selected: Vec<PathBuf> = universal
        .iter()
        .filter(|record| {
            instance
                .types
                .iter()
                .all(|tag| record.tags.contains(tag))
        })
        .filter(|record| {
            let path = record.path.to_string_lossy();
            if let Some(re) = &exclude_re
                && re.is_match(&path)
            {
                return false;
            }
            match &files_re {
                Some(re) => re.is_match(&path),
                None => true,
            }
        })
        .map(|record| record.path.clone())
        .collect();

    selected.sort();
    selected.dedup();
    tracing::debug!(
        hook = %instance.key,
        selected = selected.len(),
        universe = universal.len(),
        "selected files"
    );
    Ok(selected)
}

fn compile(id: &str, pattern: Option<&str>) -> Result<Option<regex::Regex>> {
    pattern
        .map(|p| {
            regex::Regex::new(p).map_err(|e| {
                Error::Model(hook_model::Error::InvalidPattern {
                    id: id.to_string(),
                    pattern: p.to_string(),
                    message: e.to_string(),
                })
            })
        })
        .transpose()
}
