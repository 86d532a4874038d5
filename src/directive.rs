//! Directive parsing.
//!
//! Sources and headers declare their module dependencies and preprocessor
//! defines inside comments:
//!
//! ```c
//! //> use: net util
//! //> def: DEBUG_LOG LEVEL=2
//! ```
//!
//! Override files (`.build`) hold the same commands one per line, without the
//! comment marker:
//!
//! ```text
//! # extra settings for this module
//! use: util
//! define: FAST_PATH
//! ```

use crate::error::BuildError;
use crate::ui::Table;
use anyhow::{Context, Result};
use colored::*;
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

/// Comment marker that introduces a directive in sources and headers.
pub const MARKER: &str = "//>";

static STRICT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*//>\s*(\w+)\s*:\s*(.*)$").expect("valid regex"));
static BARE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s*:\s*(.*)$").expect("valid regex"));

/// How lines are recognized as directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// Only `//> command: params` lines count; everything else is code.
    StrictPrefix,
    /// Every non-blank, non-`#` line must be `command: params`.
    BareLine,
}

/// A preprocessor define, `NAME` or `NAME=VALUE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Define {
    pub name: String,
    pub value: Option<String>,
}

impl Define {
    /// Parse a define token, rejecting a bare `=` or an empty side.
    pub fn parse(token: &str) -> Option<Self> {
        if token.starts_with('=') || token.ends_with('=') {
            return None;
        }
        match token.split_once('=') {
            Some((name, value)) => Some(Self {
                name: name.to_string(),
                value: Some(value.to_string()),
            }),
            None if !token.is_empty() => Some(Self {
                name: token.to_string(),
                value: None,
            }),
            None => None,
        }
    }

    pub fn to_flag(&self) -> String {
        format!("-D{}", self)
    }
}

impl fmt::Display for Define {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={}", self.name, value),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A single parsed instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Use(String),
    Define(Define),
}

/// Ordered, deduplicated `use` targets and defines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives {
    pub uses: Vec<String>,
    pub defines: Vec<Define>,
}

impl Directives {
    pub fn add(&mut self, directive: Directive) {
        match directive {
            Directive::Use(module) => add_unique(&mut self.uses, module),
            Directive::Define(define) => add_unique(&mut self.defines, define),
        }
    }

    /// Append another set; entries already present keep their position.
    pub fn merge(&mut self, other: Directives) {
        for module in other.uses {
            add_unique(&mut self.uses, module);
        }
        for define in other.defines {
            add_unique(&mut self.defines, define);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.uses.is_empty() && self.defines.is_empty()
    }
}

impl FromIterator<Directive> for Directives {
    fn from_iter<I: IntoIterator<Item = Directive>>(iter: I) -> Self {
        let mut directives = Directives::default();
        for directive in iter {
            directives.add(directive);
        }
        directives
    }
}

pub fn add_unique<T: PartialEq>(items: &mut Vec<T>, value: T) {
    if !items.contains(&value) {
        items.push(value);
    }
}

/// Parse every directive in `text`, in file order. `source` only labels errors.
pub fn parse(text: &str, source: &Path, grammar: Grammar) -> Result<Vec<Directive>, BuildError> {
    let mut directives = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let (command, params) = match grammar {
            Grammar::StrictPrefix => match STRICT_LINE.captures(raw) {
                Some(caps) => (caps[1].to_string(), caps[2].to_string()),
                None => continue,
            },
            Grammar::BareLine => {
                let mut stripped = raw.trim();
                if stripped.is_empty() || stripped.starts_with('#') {
                    continue;
                }
                if let Some(rest) = stripped.strip_prefix(MARKER) {
                    stripped = rest.trim_start();
                }
                match BARE_LINE.captures(stripped) {
                    Some(caps) => (caps[1].to_string(), caps[2].to_string()),
                    None => {
                        return Err(BuildError::MalformedLine {
                            file: source.to_path_buf(),
                            line,
                        });
                    }
                }
            }
        };

        match command.to_lowercase().as_str() {
            "use" => {
                for token in params.split_whitespace() {
                    let module = module_name(token).ok_or_else(|| {
                        BuildError::InvalidModuleName {
                            file: source.to_path_buf(),
                            line,
                            token: token.to_string(),
                        }
                    })?;
                    directives.push(Directive::Use(module));
                }
            }
            "def" | "define" => {
                for token in params.split_whitespace() {
                    let define = Define::parse(token).ok_or_else(|| BuildError::InvalidDefine {
                        file: source.to_path_buf(),
                        line,
                        token: token.to_string(),
                    })?;
                    directives.push(Directive::Define(define));
                }
            }
            _ => {
                return Err(BuildError::UnknownCommand {
                    file: source.to_path_buf(),
                    line,
                    command,
                    known: known_commands(),
                });
            }
        }
    }

    Ok(directives)
}

/// Read a file and collect its directives. Invalid UTF-8 is replaced, not fatal.
pub fn parse_file(path: &Path, grammar: Grammar) -> Result<Directives> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(parse(&text, path, grammar)?.into_iter().collect())
}

/// A module path relative to the source root. Outer slashes are dropped;
/// `=`, backslashes and empty, `.` or `..` segments are rejected.
fn module_name(token: &str) -> Option<String> {
    let name = token.trim_matches('/');
    if name.is_empty() || name.contains(['=', '\\']) {
        return None;
    }
    if name.split('/').any(|part| matches!(part, "" | "." | "..")) {
        return None;
    }
    Some(name.to_string())
}

/// The recognized commands, as shown when an unknown one is found.
pub fn known_commands() -> String {
    let mut table = Table::new(&["Name", "Description"]);
    table.add_row(vec![
        "use".green().to_string(),
        "module dependencies".to_string(),
    ]);
    table.add_row(vec![
        "def, define".green().to_string(),
        "preprocessor defines".to_string(),
    ]);
    table.render()
}
