//! Environment specification and cache keys

use hook_model::{HookInstance, Language};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What an execution environment must provide.
///
/// Identity is (language, version, normalized dependency set): any two
/// hook instances with an equal spec share one materialized
/// environment; any difference isolates them. Dependencies are held
/// sorted and deduplicated so declaration order never leaks into the
/// cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvSpec {
    pub language: Language,
    pub version: Option<String>,
    pub dependencies: BTreeSet<String>,
}

impl EnvSpec {
    /// Build the spec for one resolved hook instance.
    pub fn for_instance(instance: &HookInstance) -> Self {
        Self {
            language: instance.language,
            version: instance.language_version.clone(),
            dependencies: instance.dependencies.iter().cloned().collect(),
        }
    }

    /// The content-addressed cache key for this spec.
    pub fn cache_key(&self) -> String {
        let mut canonical = format!("language={}\n", self.language);
        if let Some(version) = &self.version {
            canonical.push_str(&format!("version={version}\n"));
        }
        for dep in &self.dependencies {
            canonical.push_str(&format!("dependency={dep}\n"));
        }
        let checksum = hook_fs::compute_content_checksum(&canonical);
        checksum
            .strip_prefix("sha256:")
            .unwrap_or(&checksum)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn spec(deps: &[&str]) -> EnvSpec {
        EnvSpec {
            language: Language::Python,
            version: None,
            dependencies: deps.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn equal_specs_share_a_key() {
        assert_eq!(
            spec(&["flake8", "darglint"]).cache_key(),
            spec(&["darglint", "flake8"]).cache_key()
        );
    }

    #[test]
    fn extra_dependency_isolates() {
        assert_ne!(
            spec(&["flake8"]).cache_key(),
            spec(&["flake8", "darglint"]).cache_key()
        );
    }

    #[test]
    fn version_isolates() {
        let mut with_version = spec(&["flake8"]);
        with_version.version = Some("3.12".to_string());
        assert_ne!(spec(&["flake8"]).cache_key(), with_version.cache_key());
    }

    #[test]
    fn language_isolates() {
        let mut node = spec(&[]);
        node.language = Language::Node;
        assert_ne!(spec(&[]).cache_key(), node.cache_key());
    }
}
