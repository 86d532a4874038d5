//! Module configuration and dependency expansion.
//!
//! A module is a directory under the source root. Its directives come from
//! its canonical header (the single `*.h` directly inside it, parsed in
//! strict-prefix mode) followed by its `.build` override file (bare-line
//! mode). The source root itself acts as the "root" pseudo-module whose only
//! directive source is `src/.build`.

use crate::config::BuildConfig;
use crate::directive::{self, Define, Directives, Grammar};
use crate::error::BuildError;
use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

/// Merged directives of one module directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleConfig {
    pub dir: PathBuf,
    pub header: Option<PathBuf>,
    pub override_file: Option<PathBuf>,
    pub uses: Vec<String>,
    pub defines: Vec<Define>,
}

/// Resolves and caches module configurations for one build invocation.
pub struct ModuleResolver<'a> {
    config: &'a BuildConfig,
    cache: HashMap<String, ModuleConfig>,
    root: Option<ModuleConfig>,
}

impl<'a> ModuleResolver<'a> {
    pub fn new(config: &'a BuildConfig) -> Self {
        Self {
            config,
            cache: HashMap::new(),
            root: None,
        }
    }

    pub fn config(&self) -> &BuildConfig {
        self.config
    }

    /// Directory a module name maps to.
    pub fn module_dir(&self, name: &str) -> PathBuf {
        self.config.src_dir.join(name)
    }

    /// Configuration of a named module, loaded on first request.
    pub fn resolve(&mut self, name: &str) -> Result<&ModuleConfig> {
        if !self.cache.contains_key(name) {
            let dir = self.module_dir(name);
            if !dir.is_dir() {
                return Err(BuildError::MissingModule {
                    name: name.to_string(),
                    path: dir,
                }
                .into());
            }
            let loaded = load_module(self.config, &dir)?;
            self.cache.insert(name.to_string(), loaded);
        }
        Ok(&self.cache[name])
    }

    /// Configuration of the source root. Headers there are not module headers.
    pub fn resolve_root(&mut self) -> Result<&ModuleConfig> {
        if self.root.is_none() {
            let dir = self.config.src_dir.clone();
            let mut root = ModuleConfig {
                dir: dir.clone(),
                ..Default::default()
            };
            let build_file = self.config.override_file(&dir);
            if build_file.is_file() {
                let d = directive::parse_file(&build_file, Grammar::BareLine)?;
                root.uses = d.uses;
                root.defines = d.defines;
                root.override_file = Some(build_file);
            }
            self.root = Some(root);
        }
        Ok(self.root.get_or_insert_with(ModuleConfig::default))
    }

    /// Already-resolved module, if any.
    pub fn cached(&self, name: &str) -> Option<&ModuleConfig> {
        self.cache.get(name)
    }

    /// Breadth-first closure of `direct`, each module exactly once, in
    /// discovery order. Cycles terminate because seen modules are never
    /// re-queued.
    pub fn expand(&mut self, direct: &[String]) -> Result<Vec<String>> {
        let mut ordered: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for name in direct {
            if seen.insert(name.clone()) {
                ordered.push(name.clone());
            }
        }

        let mut pending: VecDeque<String> = ordered.iter().cloned().collect();
        while let Some(name) = pending.pop_front() {
            let deps = self.resolve(&name)?.uses.clone();
            for dep in deps {
                if seen.insert(dep.clone()) {
                    ordered.push(dep.clone());
                    pending.push_back(dep);
                }
            }
        }

        Ok(ordered)
    }
}

/// The canonical header of `dir`: its only `*.h` file, if it has one.
pub fn canonical_header(dir: &Path) -> Result<Option<PathBuf>> {
    let mut headers = Vec::new();
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "h") {
            headers.push(path);
        }
    }
    headers.sort();

    match headers.len() {
        0 => Ok(None),
        1 => Ok(headers.pop()),
        _ => Err(BuildError::MultipleHeaders {
            dir: dir.to_path_buf(),
            headers: headers
                .iter()
                .filter_map(|h| h.file_name())
                .map(|n| n.to_string_lossy().to_string())
                .collect(),
        }
        .into()),
    }
}

/// Header directives first, then new entries from the override file.
pub fn load_module(config: &BuildConfig, dir: &Path) -> Result<ModuleConfig> {
    let header = canonical_header(dir)?;
    let mut directives = match &header {
        Some(h) => directive::parse_file(h, Grammar::StrictPrefix)?,
        None => Directives::default(),
    };

    let build_file = config.override_file(dir);
    let override_file = if build_file.is_file() {
        directives.merge(directive::parse_file(&build_file, Grammar::BareLine)?);
        Some(build_file)
    } else {
        None
    };

    Ok(ModuleConfig {
        dir: dir.to_path_buf(),
        header,
        override_file,
        uses: directives.uses,
        defines: directives.defines,
    })
}
