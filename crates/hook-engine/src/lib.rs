//! Execution engine for Hook Manager
//!
//! Takes a parsed manifest and a working tree and produces a run
//! report: snapshots the tree once, resolves override blocks into hook
//! instances, selects each instance's file subset, executes hooks on a
//! bounded worker pool inside their resolved environments and folds the
//! outcomes in declaration order.

pub mod error;
pub mod executor;
pub mod outcome;
pub mod report;
pub mod runner;
pub mod selector;
pub mod snapshot;

pub use error::{Error, Result};
pub use outcome::{ErrorKind, HookStatus, Outcome, SkipReason};
pub use report::RunReport;
pub use runner::{InstanceSummary, RunConfig, Runner, SKIP_ENV, skip_from_env};
pub use selector::select;
pub use snapshot::{FileRecord, SnapshotMode, snapshot};
