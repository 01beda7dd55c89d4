//! Working-tree snapshot
//!
//! The universal file set is computed once per invocation and never
//! revisited mid-run; hooks that mutate files are only picked up by the
//! next invocation's snapshot.

use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// One file in the snapshot: its repository-relative path and type tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub tags: BTreeSet<String>,
}

/// Which files form the universal set for a run.
#[derive(Debug, Clone, Default)]
pub enum SnapshotMode {
    /// Tracked files with staged or unstaged changes relative to HEAD
    #[default]
    Changed,
    /// Every tracked file
    AllTracked,
    /// An explicit list given on the command line, bypassing git
    Explicit(Vec<PathBuf>),
}

/// Snapshot the working tree at `root`.
///
/// Paths are returned sorted; deleted-but-tracked files are excluded
/// since there is nothing on disk for a hook to check.
///
/// # Errors
///
/// Returns [`Error::NotARepository`] when `root` holds no git
/// repository and the mode needs one.
pub fn snapshot(root: &Path, mode: &SnapshotMode) -> Result<Vec<FileRecord>> {
    let paths = match mode {
        SnapshotMode::Explicit(paths) => {
            let mut sorted: Vec<PathBuf> = paths.clone();
            sorted.sort();
            sorted.dedup();
            sorted
        }
        SnapshotMode::AllTracked => tracked_files(root)?,
        SnapshotMode::Changed => changed_files(root)?,
    };

    let records = paths
        .into_iter()
        .filter(|p| root.join(p).is_file())
        .map(|path| {
            let tags = hook_fs::tags_for_path(root, &path);
            FileRecord { path, tags }
        })
        .collect();
    Ok(records)
}

fn open_repo(root: &Path) -> Result<git2::Repository> {
    git2::Repository::open(root).map_err(|_| Error::NotARepository {
        path: root.to_path_buf(),
    })
}

fn tracked_files(root: &Path) -> Result<Vec<PathBuf>> {
    let repo = open_repo(root)?;
    let index = repo.index()?;
    let mut paths: Vec<PathBuf> = index
        .iter()
        .map(|entry| PathBuf::from(String::from_utf8_lossy(&entry.path).into_owned()))
        .collect();
    paths.sort();
    Ok(paths)
}

fn changed_files(root: &Path) -> Result<Vec<PathBuf>> {
    let repo = open_repo(root)?;
    let mut options = git2::StatusOptions::new();
    options
        .include_untracked(false)
        .include_ignored(false)
        .include_unmodified(false);

    let statuses = repo.statuses(Some(&mut options))?;
    let mut paths: Vec<PathBuf> = statuses
        .iter()
        .filter_map(|entry| entry.path().map(PathBuf::from))
        .collect();
    paths.sort();
    paths.dedup();
    Ok(paths)
}
