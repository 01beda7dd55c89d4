//! Run stages
//!
//! A stage is a named run-mode gating which hooks execute in a given
//! invocation. Every run selects exactly one stage; a hook runs when its
//! effective stage set contains the selected stage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Named run-modes a hook can be gated on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// The default stage, selected when no stage is named
    Commit,
    /// Pre-push checks
    Push,
    /// Hooks that only run when explicitly requested
    Manual,
}

impl Stage {
    /// The stage set a hook gets when neither its definition nor its
    /// override declares one.
    pub fn default_stages() -> Vec<Stage> {
        vec![Stage::Commit]
    }

    /// Parse a stage from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "commit" => Some(Self::Commit),
            "push" => Some(Self::Push),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }

    /// List all valid stage names
    pub fn all_names() -> &'static [&'static str] {
        &["commit", "push", "manual"]
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::Commit
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Commit => write!(f, "commit"),
            Self::Push => write!(f, "push"),
            Self::Manual => write!(f, "manual"),
        }
    }
}
