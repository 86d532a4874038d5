use super::feedback::FeedbackAnalyzer;
use super::utils::{CommandLine, compile_command, link_command, write_compile_commands};
use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::plan::{self, BuildPlan, CompileStep, LinkStep};
use crate::ui;
use anyhow::{Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs;
use std::process::Command;
use std::time::Instant;

/// Result of running one external command.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stderr: String,
}

/// Runs compiler and linker commands. Must be shareable across compile workers.
pub trait Runner: Sync {
    fn run(&self, command: &CommandLine) -> Result<RunOutput>;
}

/// Spawns real processes, capturing stderr.
pub struct ProcessRunner;

impl Runner for ProcessRunner {
    fn run(&self, command: &CommandLine) -> Result<RunOutput> {
        let output = Command::new(&command.program)
            .args(&command.args)
            .output()
            .with_context(|| format!("Failed to execute '{}'", command.program))?;
        Ok(RunOutput {
            success: output.status.success(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Show detailed build commands and decisions
    pub verbose: bool,
    /// Show what would be executed without running
    pub dry_run: bool,
    /// Compile worker threads; `None` uses every core
    pub jobs: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub compiled: usize,
    pub fresh: usize,
    pub linked: usize,
    pub link_skipped: usize,
}

// --- CORE: Build the requested programs ---
pub fn build_programs(
    config: &BuildConfig,
    requested: &[String],
    options: &BuildOptions,
) -> Result<BuildSummary> {
    let names = plan::select_programs(config, requested)?;
    let plan = plan::plan_build(config, &names)?;

    ui::banner(&config.compiler, config.profile.name(), &names);

    if options.dry_run {
        print_plan(config, &plan, options.verbose);
        return Ok(BuildSummary::default());
    }

    execute(config, &plan, &ProcessRunner, options)
}

/// Run every stale compile, then every stale link. The first failure aborts.
pub fn execute(
    config: &BuildConfig,
    plan: &BuildPlan,
    runner: &dyn Runner,
    options: &BuildOptions,
) -> Result<BuildSummary> {
    let start_time = Instant::now();
    let mut summary = BuildSummary {
        fresh: plan.fresh_count(),
        ..Default::default()
    };

    let stale: Vec<&CompileStep> = plan.stale_compiles().collect();
    for step in &stale {
        if let Some(parent) = step.object.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    if !stale.is_empty() {
        summary.compiled = compile_all(config, &stale, runner, options)?;
    }

    write_compile_commands(config, plan)?;

    for link in &plan.links {
        if link_one(config, link, runner, options)? {
            summary.linked += 1;
        } else {
            summary.link_skipped += 1;
        }
    }

    println!(
        "   {} {} source file(s) up to date",
        "skip".dimmed(),
        summary.fresh
    );
    let bar = "=".repeat(48);
    println!("{}", bar.green());
    println!(
        "{} Build finished in {:.2?}",
        "✓".green(),
        start_time.elapsed()
    );
    println!("{}", bar.green());

    Ok(summary)
}

// Compile on a pool sized by `jobs`; returns once every unit has succeeded.
fn compile_all(
    config: &BuildConfig,
    stale: &[&CompileStep],
    runner: &dyn Runner,
    options: &BuildOptions,
) -> Result<usize> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.jobs.unwrap_or(0))
        .build()
        .context("Failed to start compile workers")?;

    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
        .progress_chars("#>-");
    let pb = ProgressBar::new(stale.len() as u64);
    pb.set_style(style);
    pb.set_message("Compiling...");

    // println on a hidden bar (no tty) prints nothing; suspend always does.
    let say = |msg: String| pb.suspend(|| println!("{}", msg));

    let result = pool.install(|| {
        stale
            .par_iter()
            .map(|step| -> Result<()> {
                let display = config.display_path(&step.unit.source).display().to_string();
                let command = compile_command(config, step);
                pb.set_message(format!("Compiling {}", display));
                say(format!("   {} {}", "cc".green().bold(), display));
                if options.verbose {
                    say(format!(
                        "      {} {}",
                        step.status.describe(config).dimmed(),
                        command.to_string().dimmed()
                    ));
                }

                let output = runner.run(&command)?;
                if !output.success {
                    pb.suspend(|| eprintln!("{}", failure_report(&command, &output)));
                    return Err(BuildError::CommandFailed {
                        command: command.to_string(),
                        code: output.code.unwrap_or(1),
                    }
                    .into());
                }
                if !output.stderr.trim().is_empty() {
                    say(format!(
                        "{} Warning in {}:\n{}",
                        "!".yellow(),
                        display,
                        output.stderr
                    ));
                }
                pb.inc(1);
                Ok(())
            })
            .collect::<Result<Vec<()>>>()
    });

    match result {
        Ok(done) => {
            pb.finish_with_message("Compilation complete");
            Ok(done.len())
        }
        Err(e) => {
            pb.abandon_with_message("Compilation failed");
            Err(e)
        }
    }
}

// Returns whether a link ran.
fn link_one(
    config: &BuildConfig,
    link: &LinkStep,
    runner: &dyn Runner,
    options: &BuildOptions,
) -> Result<bool> {
    let display = config.display_path(&link.executable).display().to_string();
    if !link.status.is_stale() {
        println!("   {} {} (up to date)", "skip".dimmed(), display);
        return Ok(false);
    }

    fs::create_dir_all(&config.bin_dir)
        .with_context(|| format!("Failed to create {}", config.bin_dir.display()))?;

    let command = link_command(config, link);
    println!("   {} {}", "link".yellow().bold(), display);
    if options.verbose {
        println!(
            "      {} {}",
            link.status.describe(config).dimmed(),
            command.to_string().dimmed()
        );
    }

    let output = runner.run(&command)?;
    if !output.success {
        eprintln!("{}", failure_report(&command, &output));
        return Err(BuildError::CommandFailed {
            command: command.to_string(),
            code: output.code.unwrap_or(1),
        }
        .into());
    }
    Ok(true)
}

fn failure_report(command: &CommandLine, output: &RunOutput) -> String {
    let bar = "=".repeat(48).red();
    let code = output
        .code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string());
    let mut report = format!(
        "{}\n{} exit {}\n{}\n",
        bar,
        "x".red(),
        code,
        command.to_string().dimmed()
    );
    if !output.stderr.trim().is_empty() {
        report.push_str(output.stderr.trim_end());
        report.push('\n');
    }
    if let Some(hint) = FeedbackAnalyzer::analyze(&output.stderr) {
        report.push_str(&format!("{} {}\n", "💡".yellow(), hint));
    }
    report.push_str(&bar.to_string());
    report
}

/// Dry-run output: every step with its decision, nothing executed.
pub fn print_plan(config: &BuildConfig, plan: &BuildPlan, verbose: bool) {
    for step in &plan.compiles {
        let display = config.display_path(&step.unit.source).display().to_string();
        if step.status.is_stale() {
            println!(
                "   {} {} ({})",
                "cc".green().bold(),
                display,
                step.status.describe(config)
            );
            if verbose {
                println!("      {}", compile_command(config, step).to_string().dimmed());
            }
        } else {
            println!("   {} {}", "skip".dimmed(), display);
        }
    }

    for link in &plan.links {
        let display = config.display_path(&link.executable).display().to_string();
        if link.status.is_stale() {
            println!(
                "   {} {} ({})",
                "link".yellow().bold(),
                display,
                link.status.describe(config)
            );
            if verbose {
                println!("      {}", link_command(config, link).to_string().dimmed());
            }
        } else {
            println!("   {} {} (up to date)", "skip".dimmed(), display);
        }
    }

    if plan.is_up_to_date() {
        println!("{} Up to date", "⚡".green());
    } else {
        println!("{} Dry run: nothing was executed", "ℹ".blue());
    }
}
