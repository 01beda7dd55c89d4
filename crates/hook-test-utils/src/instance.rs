//! Resolved hook instance builder

use hook_model::{HookDefinition, HookInstance, InstanceKey, Language, SourceRef, Stage};
use std::sync::Arc;

/// Build a resolved [`HookInstance`] with sensible defaults, then let
/// the closure adjust whichever effective fields the test cares about.
///
/// The default instance is a `system` hook named `demo` with
/// `pass_filenames` on, no filters and the default stage set.
pub fn instance_with(adjust: impl FnOnce(&mut HookInstance)) -> HookInstance {
    let definition = Arc::new(HookDefinition {
        id: "demo".to_string(),
        name: Some("demo".to_string()),
        entry: "demo".to_string(),
        language: Language::System,
        args: Vec::new(),
        files: None,
        exclude: None,
        types: Vec::new(),
        stages: Vec::new(),
        dependencies: Vec::new(),
        pass_filenames: true,
    });
    let mut instance = HookInstance {
        key: InstanceKey {
            repo: 0,
            id: "demo".to_string(),
            alias: None,
        },
        source: SourceRef::Local,
        name: "demo".to_string(),
        entry: "demo".to_string(),
        args: Vec::new(),
        files: None,
        exclude: None,
        types: Vec::new(),
        stages: Stage::default_stages(),
        pass_filenames: true,
        language: Language::System,
        language_version: None,
        dependencies: Vec::new(),
        definition,
    };
    adjust(&mut instance);
    instance
}
