//! Hook Manager CLI
//!
//! The command-line interface for running declaratively configured
//! check hooks against a working tree.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use error::Result;

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            // Anything fatal before hooks could run is a resolution
            // failure as far as callers are concerned
            2
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Run {
            stage,
            all_files,
            files,
            jobs,
            json,
        }) => commands::run_hooks(&stage, all_files, files, jobs, json),
        Some(Commands::List { json }) => commands::run_list(json),
        Some(Commands::Validate) => commands::run_validate(),
        Some(Commands::Clean) => commands::run_clean(),
        None => {
            println!("{} Hook Manager CLI", "hook".green().bold());
            println!();
            println!("Run {} for available commands.", "hook --help".cyan());
            Ok(0)
        }
    }
}

/// Initialize the tracing subscriber.
///
/// Level comes from `RUST_LOG`, defaulting to "info"; `--verbose`
/// raises the floor to debug.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).without_time().compact())
        .try_init();

    if verbose {
        tracing::debug!("Verbose mode enabled");
    }
}
