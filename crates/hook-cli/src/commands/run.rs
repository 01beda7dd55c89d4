//! `hook run`: execute the manifest's hooks and report

use crate::error::{CliError, Result};
use colored::Colorize;
use hook_engine::{HookStatus, Outcome, RunConfig, RunReport, Runner, SnapshotMode, report};
use hook_fs::CacheLayout;
use hook_model::Stage;
use std::path::PathBuf;
use tokio::sync::watch;

pub fn run_hooks(
    stage: &str,
    all_files: bool,
    files: Vec<PathBuf>,
    jobs: Option<usize>,
    json: bool,
) -> Result<i32> {
    let stage = parse_stage(stage)?;
    let (root, manifest) = super::load_manifest()?;
    let layout = CacheLayout::discover()?;

    let mut config = RunConfig::new(stage);
    config.mode = if !files.is_empty() {
        SnapshotMode::Explicit(files)
    } else if all_files {
        SnapshotMode::AllTracked
    } else {
        SnapshotMode::Changed
    };
    config.max_workers = jobs;

    let runner = Runner::new(&root, layout);
    let runtime = super::runtime()?;
    let run_report = runtime.block_on(async {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("cancellation requested, stopping hooks");
                let _ = cancel_tx.send(true);
            }
        });
        runner.run(&manifest, &config, cancel_rx).await
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&run_report)?);
    } else {
        render(&run_report);
    }
    Ok(run_report.exit_code())
}

fn parse_stage(raw: &str) -> Result<Stage> {
    Stage::parse(raw).ok_or_else(|| {
        CliError::user(format!(
            "unknown stage {raw:?} (expected one of: {})",
            Stage::all_names().join(", ")
        ))
    })
}

fn render(run_report: &RunReport) {
    for outcome in &run_report.outcomes {
        let label = report::status_label(outcome);
        let label = match &outcome.status {
            HookStatus::Passed if outcome.files_modified => label.yellow(),
            HookStatus::Passed => label.green(),
            HookStatus::Skipped { .. } => label.dimmed(),
            HookStatus::Failed { .. } => label.red(),
            HookStatus::Error { .. } | HookStatus::Incomplete => label.red().bold(),
        };
        match &outcome.status {
            HookStatus::Passed | HookStatus::Failed { .. } => {
                let duration = format!("  ({}ms)", outcome.duration_ms);
                println!("{:.<40}{}{}", format!("{} ", outcome.name), label, duration.dimmed());
            }
            _ => println!("{:.<40}{}", format!("{} ", outcome.name), label),
        }
        if !outcome.is_clean() {
            print_output(outcome);
        }
    }
    if run_report.cancelled {
        println!();
        println!("{}", "Run cancelled; results above are incomplete.".yellow());
    }
}

fn print_output(outcome: &Outcome) {
    for line in outcome.stdout.lines().chain(outcome.stderr.lines()) {
        println!("    {line}");
    }
}
