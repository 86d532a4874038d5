//! Timestamp-based rebuild decisions.
//!
//! An artifact is stale when it is missing or when any of its inputs has a
//! strictly newer modification time. Decisions are recomputed from disk on
//! every run; nothing is hashed or remembered between invocations.

use crate::config::BuildConfig;
use crate::sources::{TranslationUnit, files_with_extension};
use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    /// Artifact is up to date.
    Fresh,
    /// Artifact does not exist yet.
    Missing,
    /// This input is newer than the artifact (or will be rebuilt this run).
    Outdated(PathBuf),
}

impl Staleness {
    pub fn is_stale(&self) -> bool {
        !matches!(self, Staleness::Fresh)
    }

    /// Human-readable reason, with paths shown relative to the project.
    pub fn describe(&self, config: &BuildConfig) -> String {
        match self {
            Staleness::Fresh => "up to date".to_string(),
            Staleness::Missing => "no previous output".to_string(),
            Staleness::Outdated(input) => {
                format!("{} changed", config.display_path(input).display())
            }
        }
    }
}

/// Modification time of `path`, or `None` if it does not exist.
pub fn modified(path: &Path) -> Result<Option<SystemTime>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.modified().with_context(|| {
            format!("Failed to read modification time of {}", path.display())
        })?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to stat {}", path.display())),
    }
}

/// Compare `artifact` against `inputs`; inputs that do not exist are ignored.
pub fn check(artifact: &Path, inputs: &[PathBuf]) -> Result<Staleness> {
    let Some(built) = modified(artifact)? else {
        return Ok(Staleness::Missing);
    };
    for input in inputs {
        if let Some(changed) = modified(input)?
            && changed > built
        {
            return Ok(Staleness::Outdated(input.clone()));
        }
    }
    Ok(Staleness::Fresh)
}

/// Files whose changes invalidate the object of `unit`.
///
/// The unit's own source, every header under its owning module directory,
/// the module's override file and the source-root override file. Headers of
/// dependency modules are not followed.
pub fn unit_inputs(config: &BuildConfig, unit: &TranslationUnit) -> Result<Vec<PathBuf>> {
    let mut inputs = vec![unit.source.clone()];

    if let Some(module) = &unit.module {
        let dir = config.src_dir.join(module);
        inputs.extend(module_headers(&dir)?);
        let module_build = config.override_file(&dir);
        if module_build.is_file() {
            inputs.push(module_build);
        }
    }

    let root_build = config.override_file(&config.src_dir);
    if root_build.is_file() {
        inputs.push(root_build);
    }
    Ok(inputs)
}

/// All `*.h` files under `dir`, recursively, in path order.
pub fn module_headers(dir: &Path) -> Result<Vec<PathBuf>> {
    files_with_extension(dir, "h")
}

pub fn check_unit(
    config: &BuildConfig,
    unit: &TranslationUnit,
    object: &Path,
) -> Result<Staleness> {
    check(object, &unit_inputs(config, unit)?)
}

/// An executable is stale when missing, when one of its objects is about to
/// be recompiled, or when an object is newer than it.
pub fn check_executable(
    executable: &Path,
    objects: &[PathBuf],
    pending: impl Fn(&Path) -> bool,
) -> Result<Staleness> {
    if modified(executable)?.is_none() {
        return Ok(Staleness::Missing);
    }
    if let Some(object) = objects.iter().find(|o| pending(o.as_path())) {
        return Ok(Staleness::Outdated(object.clone()));
    }
    check(executable, objects)
}
