//! Run report and exit status
//!
//! Outcomes arrive ordered by declaration index; the report decides
//! the single aggregate exit code and renders the per-hook summary.
//! Exit codes: 0 all clean, 1 a hook failed or modified files (or the
//! run was cancelled), 2 a resolution error prevented at least one
//! hook from running at all.

use crate::outcome::{HookStatus, Outcome};
use hook_model::Stage;
use serde::Serialize;

/// Width the hook name column is padded to.
const NAME_WIDTH: usize = 40;

/// The aggregate result of one run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub stage: Stage,
    pub cancelled: bool,
    pub outcomes: Vec<Outcome>,
}

impl RunReport {
    /// The process exit code for this run.
    pub fn exit_code(&self) -> i32 {
        if self.outcomes.iter().any(Outcome::is_error) {
            return 2;
        }
        let any_failure = self.outcomes.iter().any(|o| !o.is_clean());
        if any_failure || self.cancelled {
            return 1;
        }
        0
    }

    /// Whether every outcome passed or was legitimately skipped.
    pub fn all_clean(&self) -> bool {
        self.exit_code() == 0
    }

    /// Render the plain-text report, one line per hook in declaration
    /// order, captured output indented under failing hooks.
    pub fn render_plain(&self) -> String {
        let mut out = String::new();
        for outcome in &self.outcomes {
            let status = status_label(outcome);
            out.push_str(&format!(
                "{:.<width$}{}\n",
                format!("{} ", outcome.name),
                status,
                width = NAME_WIDTH
            ));
            if !outcome.is_clean() {
                for line in outcome.stdout.lines().chain(outcome.stderr.lines()) {
                    out.push_str("    ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        if self.cancelled {
            out.push_str("\nRun cancelled; results above are incomplete.\n");
        }
        out
    }
}

/// The status column text for one outcome.
pub fn status_label(outcome: &Outcome) -> String {
    match &outcome.status {
        HookStatus::Passed if outcome.files_modified => "Passed (files modified)".to_string(),
        HookStatus::Passed => "Passed".to_string(),
        HookStatus::Failed { exit_code } => {
            if outcome.files_modified {
                format!("Failed (exit {exit_code}, files modified)")
            } else {
                format!("Failed (exit {exit_code})")
            }
        }
        HookStatus::Skipped { reason } => format!("Skipped ({reason})"),
        HookStatus::Error { kind, message } => format!("Error ({kind}: {message})"),
        HookStatus::Incomplete => "Incomplete".to_string(),
    }
}
