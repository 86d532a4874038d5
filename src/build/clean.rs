//! Build artifact cleanup.
//!
//! `nb --clean` removes the object tree (every profile), the binaries
//! directory and the generated compilation database.

use super::utils::COMPILE_COMMANDS;
use crate::config::BuildConfig;
use anyhow::{Context, Result};
use colored::*;
use std::fs;

/// Returns whether anything was removed.
pub fn clean(config: &BuildConfig) -> Result<bool> {
    let mut cleaned = false;

    for dir in [&config.obj_base, &config.bin_dir] {
        if dir.exists() {
            fs::remove_dir_all(dir)
                .with_context(|| format!("Failed to remove {}", dir.display()))?;
            println!("{} Removed {}", "🗑️".red(), dir.display());
            cleaned = true;
        }
    }

    let database = config.root.join(COMPILE_COMMANDS);
    if database.exists() {
        fs::remove_file(&database).context("Failed to remove compile commands")?;
        cleaned = true;
    }

    if cleaned {
        println!("{} Clean complete.", "✓".green());
    } else {
        println!("{} Nothing to clean", "!".yellow());
    }
    Ok(cleaned)
}
