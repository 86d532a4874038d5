//! The compile/link plan.
//!
//! Planning runs the whole resolution pipeline for the requested programs:
//! directives, module expansion, source sets and staleness. The result says
//! what must be compiled (with which flags) and what must be linked, and is a
//! pure function of the source tree's current contents and timestamps.

use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::modules::ModuleResolver;
use crate::sources::{Program, SourceSet, TranslationUnit, available_programs};
use crate::staleness::{self, Staleness};
use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct CompileStep {
    pub unit: TranslationUnit,
    pub object: PathBuf,
    pub status: Staleness,
}

#[derive(Debug, Clone)]
pub struct LinkStep {
    pub program: String,
    pub executable: PathBuf,
    /// Objects in source-set order, root unit first.
    pub objects: Vec<PathBuf>,
    pub status: Staleness,
}

#[derive(Debug, Clone)]
pub struct ProgramSummary {
    pub name: String,
    pub modules: Vec<String>,
    pub defines: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BuildPlan {
    /// Unique translation units across all programs, first occurrence wins.
    pub compiles: Vec<CompileStep>,
    pub links: Vec<LinkStep>,
    pub programs: Vec<ProgramSummary>,
}

impl BuildPlan {
    pub fn stale_compiles(&self) -> impl Iterator<Item = &CompileStep> {
        self.compiles.iter().filter(|s| s.status.is_stale())
    }

    pub fn fresh_count(&self) -> usize {
        self.compiles.len() - self.stale_compiles().count()
    }

    pub fn is_up_to_date(&self) -> bool {
        self.compiles
            .iter()
            .map(|s| &s.status)
            .chain(self.links.iter().map(|l| &l.status))
            .all(|s| !s.is_stale())
    }
}

/// Program names to build: the requested ones, or every program in the
/// source root when none are given.
pub fn select_programs(config: &BuildConfig, requested: &[String]) -> Result<Vec<String>> {
    let names = if requested.is_empty() {
        available_programs(config)?
    } else {
        let mut names = Vec::new();
        for name in requested {
            let name = name.strip_suffix(".c").unwrap_or(name).to_string();
            crate::directive::add_unique(&mut names, name);
        }
        names
    };

    if names.is_empty() {
        return Err(BuildError::NoPrograms {
            src: config.src_dir.clone(),
        }
        .into());
    }
    Ok(names)
}

/// Source sets for `names`, in order. Fails on the first directive or layout error.
pub fn source_sets(config: &BuildConfig, names: &[String]) -> Result<Vec<SourceSet>> {
    let mut resolver = ModuleResolver::new(config);
    names
        .iter()
        .map(|name| {
            let program = Program::load(config, name)?;
            SourceSet::build(&mut resolver, program)
        })
        .collect()
}

/// Resolve every program fully, then decide what is stale.
pub fn plan_build(config: &BuildConfig, names: &[String]) -> Result<BuildPlan> {
    let sets = source_sets(config, names)?;

    let mut plan = BuildPlan::default();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    for set in &sets {
        for unit in &set.units {
            if !seen.insert(unit.source.clone()) {
                continue;
            }
            let object = config.object_path(&unit.source)?;
            let status = staleness::check_unit(config, unit, &object)?;
            plan.compiles.push(CompileStep {
                unit: unit.clone(),
                object,
                status,
            });
        }
    }

    let pending: HashMap<&Path, bool> = plan
        .compiles
        .iter()
        .map(|s| (s.object.as_path(), s.status.is_stale()))
        .collect();

    for set in &sets {
        let objects: Vec<PathBuf> = set
            .units
            .iter()
            .map(|u| config.object_path(&u.source))
            .collect::<Result<_>>()?;
        let executable = config.executable_path(&set.program.name);
        let status = staleness::check_executable(&executable, &objects, |o| {
            pending.get(o).copied().unwrap_or(false)
        })?;
        plan.links.push(LinkStep {
            program: set.program.name.clone(),
            executable,
            objects,
            status,
        });
        plan.programs.push(ProgramSummary {
            name: set.program.name.clone(),
            modules: set.modules.clone(),
            defines: set.units[0].defines.iter().map(|d| d.to_string()).collect(),
        });
    }

    Ok(plan)
}
