//! Per-hook run outcomes

use hook_model::InstanceKey;
use serde::Serialize;
use std::fmt;

/// Why a hook was skipped rather than executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// The instance's stage set does not contain the selected stage
    StageMismatch,
    /// The instance's filters matched no files
    NoFiles,
    /// Listed in the HOOK_SKIP environment variable
    UserSkip,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StageMismatch => write!(f, "stage mismatch"),
            Self::NoFiles => write!(f, "no files to check"),
            Self::UserSkip => write!(f, "skipped by request"),
        }
    }
}

/// Which resolution step failed before the hook could run.
///
/// The split matters for retries: a hook failure retries meaningfully
/// on the same environment, an environment failure does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// The manifest names an id its repository does not define
    DefinitionNotFound,
    /// The repository block's source could not be fetched
    SourceFetch,
    /// The instance's environment could not be materialized, or its
    /// program could not be spawned
    Environment,
    /// The hook's effective configuration is unusable (bad pattern,
    /// underspecified local hook, unreadable registry)
    Manifest,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefinitionNotFound => write!(f, "definition not found"),
            Self::SourceFetch => write!(f, "source fetch failed"),
            Self::Environment => write!(f, "environment failure"),
            Self::Manifest => write!(f, "invalid hook configuration"),
        }
    }
}

/// Final status of one hook instance in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum HookStatus {
    Passed,
    Failed {
        exit_code: i32,
    },
    Skipped {
        reason: SkipReason,
    },
    /// A resolution error prevented the hook from running at all
    Error {
        #[serde(rename = "error-kind")]
        kind: ErrorKind,
        message: String,
    },
    /// The run was cancelled while this hook was in flight or queued
    Incomplete,
}

/// The record of one hook instance's run, consumed by the aggregator.
///
/// `files_modified` is orthogonal to the status: a hook that exits zero
/// but rewrites files is `Passed` with the flag set ("passed but
/// modified"), which is not a failure but must stay distinguishable
/// from a clean pass.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub key: InstanceKey,
    pub name: String,
    pub status: HookStatus,
    pub files_modified: bool,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl Outcome {
    /// An outcome for a hook that never started.
    pub fn unstarted(key: InstanceKey, name: String, status: HookStatus) -> Self {
        Self {
            key,
            name,
            status,
            files_modified: false,
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: 0,
        }
    }

    /// Whether this outcome blocks a zero exit code.
    pub fn is_clean(&self) -> bool {
        matches!(self.status, HookStatus::Passed | HookStatus::Skipped { .. })
            && !self.files_modified
    }

    /// Whether this outcome represents a resolution error.
    pub fn is_error(&self) -> bool {
        matches!(self.status, HookStatus::Error { .. })
    }
}
