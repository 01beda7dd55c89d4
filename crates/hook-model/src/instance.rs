//! Hook instance resolution
//!
//! A [`HookInstance`] is the fully-effective view of one override block
//! applied to its shared definition. Overrides replace the definition's
//! defaults field by field; only `additional_dependencies` append.
//! Resolution happens exactly once per instance per run, before any file
//! selection.

use crate::definition::{HookDefinition, Language};
use crate::manifest::{HookOverride, RepoBlock};
use crate::stage::Stage;
use crate::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Where an instance's definition came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRef {
    /// Defined inline in the target repository's manifest
    Local,
    /// Fetched from a pinned remote revision
    Remote { locator: String, rev: String },
}

impl SourceRef {
    /// Build the source reference for a repository block.
    pub fn for_block(block: &RepoBlock) -> Self {
        if block.is_local() {
            Self::Local
        } else {
            Self::Remote {
                locator: block.repo.clone(),
                // parse() already rejected remote blocks without a rev
                rev: block.rev.clone().unwrap_or_default(),
            }
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote { locator, rev } => write!(f, "{locator}@{rev}"),
        }
    }
}

/// Identity of one instance within a run.
///
/// Two override blocks may share a definition; the alias keeps them
/// distinct, so identity is (repository block, id, alias), never the id
/// alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct InstanceKey {
    /// Index of the repository block in the manifest
    pub repo: usize,
    pub id: String,
    pub alias: Option<String>,
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{}", alias),
            None => write!(f, "{}", self.id),
        }
    }
}

/// The fully-effective configuration of one hook for one run.
#[derive(Debug, Clone)]
pub struct HookInstance {
    pub key: InstanceKey,
    pub source: SourceRef,

    /// The shared, read-only definition this instance derives from
    pub definition: Arc<HookDefinition>,

    pub name: String,
    pub entry: String,
    pub args: Vec<String>,
    pub files: Option<String>,
    pub exclude: Option<String>,
    pub types: Vec<String>,
    pub stages: Vec<Stage>,
    pub pass_filenames: bool,
    pub language: Language,
    pub language_version: Option<String>,

    /// Definition dependencies followed by the override's additions
    pub dependencies: Vec<String>,
}

impl HookInstance {
    /// Whether this instance participates in the selected stage.
    pub fn runs_in(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }
}

/// Resolve one override block against its repository's definition.
///
/// For local repository blocks the override itself must carry `entry`
/// and `language`; a definition is synthesized from it.
///
/// # Errors
///
/// Returns [`Error::LocalHookIncomplete`] for underspecified local
/// hooks and [`Error::InvalidPattern`] when an effective regex does not
/// compile. Definition lookup failures are reported by the caller,
/// which owns the registry.
pub fn resolve_instance(
    repo_index: usize,
    block: &RepoBlock,
    overrides: &HookOverride,
    definition: Arc<HookDefinition>,
) -> Result<HookInstance> {
    let files = overrides
        .files
        .clone()
        .or_else(|| definition.files.clone());
    let exclude = overrides
        .exclude
        .clone()
        .or_else(|| definition.exclude.clone());
    for pattern in [&files, &exclude].into_iter().flatten() {
        if let Err(e) = regex::Regex::new(pattern) {
            return Err(Error::InvalidPattern {
                id: overrides.id.clone(),
                pattern: pattern.clone(),
                message: e.to_string(),
            });
        }
    }

    let stages = overrides
        .stages
        .clone()
        .unwrap_or_else(|| {
            if definition.stages.is_empty() {
                Stage::default_stages()
            } else {
                definition.stages.clone()
            }
        });

    let mut dependencies = definition.dependencies.clone();
    dependencies.extend(overrides.additional_dependencies.iter().cloned());

    Ok(HookInstance {
        key: InstanceKey {
            repo: repo_index,
            id: overrides.id.clone(),
            alias: overrides.alias.clone(),
        },
        source: SourceRef::for_block(block),
        name: overrides
            .name
            .clone()
            .or_else(|| definition.name.clone())
            .unwrap_or_else(|| overrides.id.clone()),
        entry: overrides.entry.clone().unwrap_or_else(|| definition.entry.clone()),
        args: overrides.args.clone().unwrap_or_else(|| definition.args.clone()),
        files,
        exclude,
        types: overrides.types.clone().unwrap_or_else(|| definition.types.clone()),
        stages,
        pass_filenames: overrides.pass_filenames.unwrap_or(definition.pass_filenames),
        language: overrides.language.unwrap_or(definition.language),
        language_version: overrides.language_version.clone(),
        dependencies,
        definition,
    })
}

/// Synthesize the definition for a local override block.
///
/// # Errors
///
/// Returns [`Error::LocalHookIncomplete`] unless the block declares both
/// an entry and a language.
pub fn local_definition(overrides: &HookOverride) -> Result<HookDefinition> {
    let (Some(entry), Some(language)) = (&overrides.entry, overrides.language) else {
        return Err(Error::LocalHookIncomplete {
            id: overrides.id.clone(),
        });
    };
    Ok(HookDefinition {
        id: overrides.id.clone(),
        name: overrides.name.clone(),
        entry: entry.clone(),
        language,
        args: Vec::new(),
        files: None,
        exclude: None,
        types: Vec::new(),
        stages: Vec::new(),
        dependencies: Vec::new(),
        pass_filenames: overrides.pass_filenames.unwrap_or(true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn definition() -> Arc<HookDefinition> {
        Arc::new(HookDefinition {
            id: "flake8".to_string(),
            name: Some("flake8".to_string()),
            entry: "flake8".to_string(),
            language: Language::Python,
            args: vec!["--max-line-length=100".to_string()],
            files: None,
            exclude: Some("^vendored/".to_string()),
            types: vec!["python".to_string()],
            stages: Vec::new(),
            dependencies: vec!["flake8".to_string()],
            pass_filenames: true,
        })
    }

    fn block() -> RepoBlock {
        RepoBlock {
            repo: "https://github.com/pycqa/flake8".to_string(),
            rev: Some("6.1.0".to_string()),
            hooks: Vec::new(),
        }
    }

    fn override_for(id: &str) -> HookOverride {
        HookOverride {
            id: id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_flow_through_when_nothing_overridden() {
        let instance =
            resolve_instance(0, &block(), &override_for("flake8"), definition()).unwrap();
        assert_eq!(instance.args, vec!["--max-line-length=100"]);
        assert_eq!(instance.exclude.as_deref(), Some("^vendored/"));
        assert_eq!(instance.stages, Stage::default_stages());
        assert!(instance.pass_filenames);
        assert_eq!(instance.key.to_string(), "flake8");
    }

    #[test]
    fn override_replaces_never_merges() {
        let mut ov = override_for("flake8");
        ov.args = Some(vec!["--select=DAR".to_string()]);
        ov.exclude = Some("^tests/".to_string());

        let instance = resolve_instance(0, &block(), &ov, definition()).unwrap();
        // Replaced wholesale: the definition's arg and exclude are gone
        assert_eq!(instance.args, vec!["--select=DAR"]);
        assert_eq!(instance.exclude.as_deref(), Some("^tests/"));
    }

    #[test]
    fn additional_dependencies_append() {
        let mut ov = override_for("flake8");
        ov.additional_dependencies = vec!["darglint".to_string()];

        let instance = resolve_instance(0, &block(), &ov, definition()).unwrap();
        assert_eq!(instance.dependencies, vec!["flake8", "darglint"]);
    }

    #[test]
    fn alias_distinguishes_two_instances_of_one_definition() {
        let mut first = override_for("flake8");
        first.alias = Some("flake8-strict".to_string());
        let mut second = override_for("flake8");
        second.alias = Some("flake8-docs".to_string());

        let a = resolve_instance(0, &block(), &first, definition()).unwrap();
        let b = resolve_instance(0, &block(), &second, definition()).unwrap();
        assert_ne!(a.key, b.key);
        assert_eq!(a.key.id, b.key.id);
        assert_eq!(a.key.to_string(), "flake8-strict");
    }

    #[test]
    fn invalid_override_pattern_is_rejected() {
        let mut ov = override_for("flake8");
        ov.files = Some("([unclosed".to_string());
        let err = resolve_instance(0, &block(), &ov, definition()).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn stage_override_replaces_default() {
        let mut ov = override_for("flake8");
        ov.stages = Some(vec![Stage::Manual]);
        let instance = resolve_instance(0, &block(), &ov, definition()).unwrap();
        assert!(instance.runs_in(Stage::Manual));
        assert!(!instance.runs_in(Stage::Commit));
    }

    #[test]
    fn local_definition_requires_entry_and_language() {
        let mut ov = override_for("fmt-check");
        let err = local_definition(&ov).unwrap_err();
        assert!(matches!(err, Error::LocalHookIncomplete { .. }));

        ov.entry = Some("cargo fmt --check".to_string());
        ov.language = Some(Language::System);
        let def = local_definition(&ov).unwrap();
        assert_eq!(def.entry, "cargo fmt --check");
        assert_eq!(def.language, Language::System);
    }
}
