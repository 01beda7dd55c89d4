//! CLI argument parsing using clap derive

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Hook Manager - Run declarative check hooks against your repository
#[derive(Parser, Debug)]
#[command(name = "hook")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the manifest's hooks against the working tree
    ///
    /// By default only tracked files with pending changes are checked.
    ///
    /// Examples:
    ///   hook run                       # changed files, commit stage
    ///   hook run --all-files           # every tracked file
    ///   hook run --stage manual        # manual-stage hooks
    ///   hook run --files a.py b.py     # an explicit file list
    Run {
        /// Stage to run (commit, push or manual)
        #[arg(long, default_value = "commit")]
        stage: String,

        /// Run against every tracked file instead of changed files
        #[arg(long)]
        all_files: bool,

        /// Run against exactly these files, bypassing the git snapshot
        #[arg(long, num_args = 1..)]
        files: Vec<PathBuf>,

        /// Bound on concurrently running hooks
        #[arg(long)]
        jobs: Option<usize>,

        /// Output the report as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// List the manifest's resolved hook instances
    List {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Parse and resolve the manifest without running anything
    Validate,

    /// Delete the source and environment caches
    ///
    /// Both stores are content-addressed and rebuilt lazily, so this
    /// only costs the next run some fetching and installing.
    Clean,
}
