//! Manifest parsing for `.hooks.yaml`
//!
//! The manifest is a sequence of repository blocks, each pinning one
//! source revision and listing the hook override blocks taken from it.
//! YAML merge keys (`<<: *anchor`) are a document-level templating
//! feature and are fully expanded here, before typed deserialization;
//! nothing downstream ever sees the indirection.

use crate::definition::Language;
use crate::stage::Stage;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Manifest file name looked up in the target repository.
pub const MANIFEST_FILE: &str = ".hooks.yaml";

/// Pseudo-locator for hooks defined in the target repository itself.
pub const LOCAL_REPO: &str = "local";

/// The parsed manifest: an ordered sequence of repository blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub repos: Vec<RepoBlock>,
}

/// One repository block: a source locator, a pinned revision and the
/// hook overrides drawn from that source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoBlock {
    /// Source locator: a git URL or [`LOCAL_REPO`]
    pub repo: String,

    /// Pinned revision; required unless the locator is local
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,

    #[serde(default)]
    pub hooks: Vec<HookOverride>,
}

impl RepoBlock {
    /// Whether this block uses the local pseudo-locator.
    pub fn is_local(&self) -> bool {
        self.repo == LOCAL_REPO
    }
}

/// One hook override block.
///
/// Every field except `id` is optional: present fields replace the
/// definition's defaults, except `additional_dependencies`, which append.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HookOverride {
    /// Identifier of the definition within the source repository
    pub id: String,

    /// Display name override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Disambiguates two instances of the same definition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Replaces the definition's default arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,

    /// Positive include pattern over the relative path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<String>,

    /// Replaces the definition's exclude pattern
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,

    /// Replaces the definition's type tag filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,

    /// Replaces the definition's stage set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stages: Option<Vec<Stage>>,

    /// Appended to the definition's own dependency list
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_dependencies: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_filenames: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_version: Option<String>,

    /// Entry override; required inline for local hooks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
}

impl Manifest {
    /// Parse a manifest from YAML content.
    ///
    /// Merge keys are expanded on the raw document before the typed
    /// model is built, so aliased override blocks arrive as concrete
    /// structures.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] on malformed YAML and
    /// [`Error::MissingRevision`] when a non-local block has no `rev`.
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        let mut value: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| Error::Parse {
                path: origin.to_path_buf(),
                message: e.to_string(),
            })?;
        value.apply_merge().map_err(|e| Error::Parse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;

        let manifest: Manifest =
            serde_yaml::from_value(value).map_err(|e| Error::Parse {
                path: origin.to_path_buf(),
                message: e.to_string(),
            })?;

        for block in &manifest.repos {
            if !block.is_local() && block.rev.is_none() {
                return Err(Error::MissingRevision {
                    repo: block.repo.clone(),
                });
            }
        }

        tracing::debug!(
            repos = manifest.repos.len(),
            hooks = manifest.repos.iter().map(|r| r.hooks.len()).sum::<usize>(),
            "parsed manifest"
        );
        Ok(manifest)
    }

    /// Load and parse the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = hook_fs::io::read_text(path)?;
        Self::parse(&content, path)
    }

    /// Walk up from `start` looking for [`MANIFEST_FILE`].
    ///
    /// The search stops at the first directory containing the manifest
    /// or a `.git` entry (whichever comes first); a `.git` directory
    /// without a manifest is a miss.
    pub fn discover(start: &Path) -> Result<PathBuf> {
        let mut dir = Some(start);
        while let Some(current) = dir {
            let candidate = current.join(MANIFEST_FILE);
            if candidate.is_file() {
                return Ok(candidate);
            }
            if current.join(".git").exists() {
                break;
            }
            dir = current.parent();
        }
        Err(Error::ManifestNotFound {
            start: start.to_path_buf(),
        })
    }
}
