//! Manifest model for Hook Manager
//!
//! Parses the `.hooks.yaml` manifest and the per-source `hooks.yaml`
//! definition registries, and resolves user override blocks onto shared
//! hook definitions into fully-effective [`HookInstance`] records.

pub mod definition;
pub mod error;
pub mod instance;
pub mod manifest;
pub mod stage;

pub use definition::{DefinitionRegistry, HookDefinition, Language, REGISTRY_FILE};
pub use error::{Error, Result};
pub use instance::{HookInstance, InstanceKey, SourceRef, local_definition, resolve_instance};
pub use manifest::{HookOverride, Manifest, RepoBlock, LOCAL_REPO, MANIFEST_FILE};
pub use stage::Stage;
