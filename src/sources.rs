//! Programs and their translation units.
//!
//! A program is a `*.c` file directly inside the source root. Its directives
//! name the modules it needs; the source set is the program's root unit
//! followed by every `*.c` file of every module in the expanded closure.

use crate::config::BuildConfig;
use crate::directive::{self, Define, Grammar, add_unique};
use crate::error::BuildError;
use crate::modules::ModuleResolver;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const SOURCE_EXT: &str = "c";

/// A named build target rooted at one translation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub name: String,
    pub root_unit: PathBuf,
    pub uses: Vec<String>,
    pub defines: Vec<Define>,
}

impl Program {
    /// Load `src/<name>.c` and read its directives. `name` may carry the `.c`
    /// but no directory part; programs live directly in the source root.
    pub fn load(config: &BuildConfig, name: &str) -> Result<Self> {
        let name = name.strip_suffix(".c").unwrap_or(name);
        let root_unit = config.src_dir.join(format!("{}.{}", name, SOURCE_EXT));
        if name.is_empty() || name.contains(['/', '\\']) || !root_unit.is_file() {
            return Err(BuildError::UnknownProgram {
                name: name.to_string(),
                path: root_unit,
            }
            .into());
        }

        let directives = directive::parse_file(&root_unit, Grammar::StrictPrefix)?;
        Ok(Self {
            name: name.to_string(),
            root_unit,
            uses: directives.uses,
            defines: directives.defines,
        })
    }
}

/// Names of all programs in the source root, sorted.
pub fn available_programs(config: &BuildConfig) -> Result<Vec<String>> {
    let entries = fs::read_dir(&config.src_dir)
        .with_context(|| format!("Failed to read {}", config.src_dir.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file()
            && path.extension().is_some_and(|ext| ext == SOURCE_EXT)
            && let Some(stem) = path.file_stem()
        {
            names.push(stem.to_string_lossy().to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// One compilable source file and the defines it is compiled with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUnit {
    pub source: PathBuf,
    /// Owning module, `None` for a program's root unit.
    pub module: Option<String>,
    pub defines: Vec<Define>,
}

impl TranslationUnit {
    pub fn is_root(&self) -> bool {
        self.module.is_none()
    }

    pub fn define_flags(&self) -> Vec<String> {
        self.defines.iter().map(Define::to_flag).collect()
    }
}

/// A program with its expanded modules and ordered translation units.
#[derive(Debug, Clone)]
pub struct SourceSet {
    pub program: Program,
    pub modules: Vec<String>,
    pub units: Vec<TranslationUnit>,
}

impl SourceSet {
    /// Expand the program's modules and collect its units, root unit first.
    pub fn build(resolver: &mut ModuleResolver, program: Program) -> Result<Self> {
        let root = resolver.resolve_root()?.clone();

        let mut direct = program.uses.clone();
        for module in root.uses {
            add_unique(&mut direct, module);
        }
        let modules = resolver.expand(&direct)?;

        let mut root_defines = root.defines;
        for define in &program.defines {
            add_unique(&mut root_defines, define.clone());
        }

        let mut units = vec![TranslationUnit {
            source: program.root_unit.clone(),
            module: None,
            defines: root_defines,
        }];
        let mut seen: HashSet<PathBuf> = HashSet::from([program.root_unit.clone()]);

        for module in &modules {
            let dir = resolver.module_dir(module);
            for source in module_sources(&dir)? {
                if !seen.insert(source.clone()) {
                    continue;
                }
                let owner = owning_module(resolver, &modules, &source).unwrap_or(module);
                let defines = resolver.resolve(owner)?.defines.clone();
                units.push(TranslationUnit {
                    source,
                    module: Some(owner.clone()),
                    defines,
                });
            }
        }

        Ok(Self {
            program,
            modules,
            units,
        })
    }
}

/// Every `*.c` file under `dir`, recursively, in path order.
pub fn module_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    files_with_extension(dir, SOURCE_EXT)
}

/// Every file under `dir` with extension `ext`, sorted. An unreadable entry
/// fails the walk instead of being skipped.
pub fn files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.with_context(|| format!("Failed to scan {}", dir.display()))?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|e| e == ext) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// The deepest expanded module whose directory contains `source`.
fn owning_module<'m>(
    resolver: &ModuleResolver,
    modules: &'m [String],
    source: &Path,
) -> Option<&'m String> {
    modules
        .iter()
        .filter(|m| source.starts_with(resolver.module_dir(m)))
        .max_by_key(|m| resolver.module_dir(m).components().count())
}
