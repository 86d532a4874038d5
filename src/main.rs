//! # nb CLI Entry Point
//!
//! Parses arguments with clap, builds the immutable [`BuildConfig`] and runs
//! the requested action: build (default), dry run, list, clean or watch.
//!
//! Exit status is 0 on success, the compiler's exit code when a compile or
//! link fails, and 1 for every other error.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::PathBuf;

use nerdbuild::build::{self, BuildOptions};
use nerdbuild::config::{BuildConfig, Profile};
use nerdbuild::error::BuildError;
use nerdbuild::plan;
use nerdbuild::ui;

#[derive(Parser)]
#[command(name = "nb")]
#[command(about = "Build C programs from directives in their sources", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
struct Cli {
    /// Programs to build (default: every top-level .c file in src/)
    programs: Vec<String>,
    /// Build artifacts in release mode, with optimizations
    #[arg(short, long)]
    release: bool,
    /// Show detailed build commands and decisions
    #[arg(short, long)]
    verbose: bool,
    /// Show what would be executed without running
    #[arg(short = 'n', long)]
    dry_run: bool,
    /// Number of parallel compile jobs (default: all cores)
    #[arg(short, long)]
    jobs: Option<usize>,
    /// Rebuild whenever a file under src/ changes
    #[arg(short, long)]
    watch: bool,
    /// List programs with their modules and defines
    #[arg(long, conflicts_with_all = ["clean", "watch", "dry_run"])]
    list: bool,
    /// Remove object files, binaries and compile_commands.json
    #[arg(long, conflicts_with_all = ["watch", "dry_run"])]
    clean: bool,
    /// Project root (default: current directory)
    #[arg(long)]
    root: Option<PathBuf>,
    /// Generate shell completion scripts
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "x".red(), e);
        let code = e
            .downcast_ref::<BuildError>()
            .map(BuildError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(shell) = cli.completions {
        generate(shell, &mut Cli::command(), "nb", &mut std::io::stdout());
        return Ok(());
    }

    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    let config = BuildConfig::load(&root, Profile::from_release(cli.release))?;

    if cli.clean {
        build::clean(&config)?;
        return Ok(());
    }

    if cli.list {
        return list_programs(&config, &cli.programs);
    }

    let options = BuildOptions {
        verbose: cli.verbose,
        dry_run: cli.dry_run,
        jobs: cli.jobs,
    };

    if cli.watch {
        return build::watch(&config, &cli.programs, &options);
    }

    build::build_programs(&config, &cli.programs, &options)?;
    Ok(())
}

fn list_programs(config: &BuildConfig, requested: &[String]) -> Result<()> {
    let names = plan::select_programs(config, requested)?;
    let sets = plan::source_sets(config, &names)?;

    let mut table = ui::Table::new(&["Program", "Modules", "Defines", "Units"]);
    for set in &sets {
        let defines: Vec<String> = set.units[0].defines.iter().map(|d| d.to_string()).collect();
        table.add_row(vec![
            set.program.name.bold().green().to_string(),
            none_if_empty(set.modules.join(", ")),
            none_if_empty(defines.join(" ")),
            set.units.len().to_string(),
        ]);
    }
    table.print();
    Ok(())
}

fn none_if_empty(s: String) -> String {
    if s.is_empty() {
        "-".dimmed().to_string()
    } else {
        s
    }
}
