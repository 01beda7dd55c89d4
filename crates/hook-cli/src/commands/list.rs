//! `hook list` and `hook validate`: resolve the manifest, run nothing

use crate::error::Result;
use colored::Colorize;
use hook_engine::{InstanceSummary, Runner};
use hook_fs::CacheLayout;

pub fn run_list(json: bool) -> Result<i32> {
    let summaries = resolve_summaries()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for summary in &summaries {
            match &summary.error {
                Some(error) => {
                    println!("{:.<30}{}", format!("{} ", summary.key), error.red());
                }
                None => {
                    let stages: Vec<String> =
                        summary.stages.iter().map(|s| s.to_string()).collect();
                    let language = summary
                        .language
                        .map(|l| l.to_string())
                        .unwrap_or_default();
                    println!(
                        "{:.<30}{}  [{}]  {}",
                        format!("{} ", summary.key),
                        language,
                        stages.join(", "),
                        summary.source.dimmed()
                    );
                }
            }
        }
    }
    Ok(exit_code(&summaries))
}

pub fn run_validate() -> Result<i32> {
    let summaries = resolve_summaries()?;
    let broken: Vec<&InstanceSummary> =
        summaries.iter().filter(|s| s.error.is_some()).collect();
    if broken.is_empty() {
        println!(
            "{} manifest resolves cleanly ({} hooks)",
            "ok".green().bold(),
            summaries.len()
        );
        return Ok(0);
    }
    for summary in broken {
        eprintln!(
            "{}: {}: {}",
            "error".red().bold(),
            summary.key,
            summary.error.as_deref().unwrap_or("unresolved")
        );
    }
    Ok(2)
}

fn resolve_summaries() -> Result<Vec<InstanceSummary>> {
    let (root, manifest) = super::load_manifest()?;
    let layout = CacheLayout::discover()?;
    let runner = Runner::new(&root, layout);
    let runtime = super::runtime()?;
    Ok(runtime.block_on(runner.list(&manifest)))
}

fn exit_code(summaries: &[InstanceSummary]) -> i32 {
    if summaries.iter().any(|s| s.error.is_some()) {
        2
    } else {
        0
    }
}
