//! Hook definition registry
//!
//! Every hook source repository carries a `hooks.yaml` at its root
//! listing the hooks it provides. Definitions are read-only once loaded;
//! user overrides never mutate them, they derive instances.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::stage::Stage;

/// Registry file name at the root of a hook source repository.
pub const REGISTRY_FILE: &str = "hooks.yaml";

/// Runtime a hook executes in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Virtualenv-isolated Python, dependencies installed with pip
    Python,
    /// Node environment, dependencies installed with npm
    Node,
    /// A script shipped inside the source repository, run directly
    Script,
    /// A program already on PATH; no environment is materialized
    System,
}

impl Language {
    /// Whether this runtime needs a materialized environment.
    pub fn needs_environment(&self) -> bool {
        matches!(self, Self::Python | Self::Node)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Python => write!(f, "python"),
            Self::Node => write!(f, "node"),
            Self::Script => write!(f, "script"),
            Self::System => write!(f, "system"),
        }
    }
}

fn default_pass_filenames() -> bool {
    true
}

/// A hook as declared by its source repository.
///
/// Owned by the repository's registry; user overrides produce derived
/// instances, never mutations of this record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookDefinition {
    /// Identifier unique within the source repository
    pub id: String,

    /// Human-readable display name
    #[serde(default)]
    pub name: Option<String>,

    /// Command template; whitespace-split, no shell interpretation.
    /// Hooks that need shell semantics declare an explicit interpreter
    /// (e.g. `sh -c ...`) as their entry.
    pub entry: String,

    pub language: Language,

    /// Default arguments appended after the entry
    #[serde(default)]
    pub args: Vec<String>,

    /// Default positive include pattern
    #[serde(default)]
    pub files: Option<String>,

    /// Default exclude pattern
    #[serde(default)]
    pub exclude: Option<String>,

    /// Default type tag filter; a file must carry every listed tag
    #[serde(default)]
    pub types: Vec<String>,

    /// Default stage set; empty means the default stage
    #[serde(default)]
    pub stages: Vec<Stage>,

    /// Dependencies installed into the hook's environment
    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default = "default_pass_filenames")]
    pub pass_filenames: bool,
}

/// The loaded registry of one source repository.
#[derive(Debug, Clone)]
pub struct DefinitionRegistry {
    hooks: Vec<HookDefinition>,
}

impl DefinitionRegistry {
    /// Load the registry from a source checkout directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `hooks.yaml` is missing or malformed.
    pub fn load(checkout: &Path) -> Result<Self> {
        let path = checkout.join(REGISTRY_FILE);
        let content = hook_fs::io::read_text(&path)?;
        Self::parse(&content, &path)
    }

    /// Parse a registry from YAML content.
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        let hooks: Vec<HookDefinition> =
            serde_yaml::from_str(content).map_err(|e| Error::Parse {
                path: origin.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(Self { hooks })
    }

    /// Build a registry from already-constructed definitions (local
    /// repositories, tests).
    pub fn from_definitions(hooks: Vec<HookDefinition>) -> Self {
        Self { hooks }
    }

    /// Look up a definition by identifier.
    pub fn get(&self, id: &str) -> Option<&HookDefinition> {
        self.hooks.iter().find(|h| h.id == id)
    }

    /// All definitions, in declaration order.
    pub fn definitions(&self) -> &[HookDefinition] {
        &self.hooks
    }
}
