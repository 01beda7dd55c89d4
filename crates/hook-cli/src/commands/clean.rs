//! `hook clean`: explicit cache eviction

use crate::error::Result;
use colored::Colorize;
use hook_fs::CacheLayout;

pub fn run_clean() -> Result<i32> {
    let layout = CacheLayout::discover()?;
    layout.evict()?;
    println!(
        "{} removed {}",
        "cleaned".green().bold(),
        layout.root().display()
    );
    Ok(0)
}
