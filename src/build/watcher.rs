use super::core::{self, BuildOptions};
use crate::config::BuildConfig;
use anyhow::{Context, Result};
use colored::*;
use notify::{Config, EventKind, RecursiveMode, Watcher};
use std::sync::mpsc::channel;
use std::time::Duration;

/// Rebuild `programs` every time something under the source root changes.
/// Build errors are reported and watching continues.
pub fn watch(config: &BuildConfig, programs: &[String], options: &BuildOptions) -> Result<()> {
    println!(
        "{} Watching for changes in {}...",
        "👀".cyan(),
        config.src_dir.display()
    );

    let (tx, rx) = channel::<notify::Result<notify::Event>>();
    let config_notify = Config::default().with_poll_interval(Duration::from_secs(1));
    let mut watcher = notify::RecommendedWatcher::new(tx, config_notify)?;
    watcher
        .watch(&config.src_dir, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", config.src_dir.display()))?;

    rebuild(config, programs, options);

    while let Ok(event) = rx.recv() {
        if !is_change(&event) {
            continue;
        }
        // Debounce: let editors finish writing, then drop the burst.
        std::thread::sleep(Duration::from_millis(100));
        while rx.try_recv().is_ok() {}
        print!("\x1B[2J\x1B[1;1H");
        println!("{} File changed. Rebuilding...", "🔄".yellow());
        rebuild(config, programs, options);
    }
    Ok(())
}

fn is_change(event: &notify::Result<notify::Event>) -> bool {
    match event {
        Ok(event) => !matches!(event.kind, EventKind::Access(_)),
        Err(_) => false,
    }
}

fn rebuild(config: &BuildConfig, programs: &[String], options: &BuildOptions) {
    if let Err(e) = core::build_programs(config, programs, options) {
        println!("{} {:#}", "x".red(), e);
    }
}
