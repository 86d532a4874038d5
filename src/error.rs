//! Fatal build errors.
//!
//! Every variant aborts the whole run. Plain I/O failures travel as
//! `anyhow::Error` with context; the variants here are the ones callers (and
//! tests) need to tell apart.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum BuildError {
    /// A line in an override file is not `command: params`
    MalformedLine { file: PathBuf, line: usize },
    /// A `use` token is not a plain path under the source root
    InvalidModuleName {
        file: PathBuf,
        line: usize,
        token: String,
    },
    /// A define token is `=`, or has an empty name or value
    InvalidDefine {
        file: PathBuf,
        line: usize,
        token: String,
    },
    /// A directive command other than `use`/`def`/`define`
    UnknownCommand {
        file: PathBuf,
        line: usize,
        command: String,
        known: String,
    },
    /// A module directory holds more than one header
    MultipleHeaders { dir: PathBuf, headers: Vec<String> },
    /// A `use` target has no directory under the source root
    MissingModule { name: String, path: PathBuf },
    /// A requested program has no root source file
    UnknownProgram { name: String, path: PathBuf },
    /// Auto-discovery found no `*.c` files in the source root
    NoPrograms { src: PathBuf },
    /// The compiler or linker exited unsuccessfully
    CommandFailed { command: String, code: i32 },
}

impl BuildError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::CommandFailed { code, .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::MalformedLine { file, line } => write!(
                f,
                "Invalid directive in {}:{}: expected 'command: params'",
                file.display(),
                line
            ),
            BuildError::InvalidModuleName { file, line, token } => write!(
                f,
                "Invalid module name in {}:{}: '{}'",
                file.display(),
                line,
                token
            ),
            BuildError::InvalidDefine { file, line, token } => write!(
                f,
                "Invalid define in {}:{}: '{}' (use NAME or NAME=VALUE)",
                file.display(),
                line,
                token
            ),
            BuildError::UnknownCommand {
                file,
                line,
                command,
                known,
            } => write!(
                f,
                "Unknown directive in {}:{}: '{}'\nKnown commands:\n{}",
                file.display(),
                line,
                command,
                known
            ),
            BuildError::MultipleHeaders { dir, headers } => write!(
                f,
                "Invalid module header in {}: expected at most one header; found {}",
                dir.display(),
                headers.join(", ")
            ),
            BuildError::MissingModule { name, path } => write!(
                f,
                "Missing module '{}': expected directory {}",
                name,
                path.display()
            ),
            BuildError::UnknownProgram { name, path } => write!(
                f,
                "Unknown program '{}' (missing {})",
                name,
                path.display()
            ),
            BuildError::NoPrograms { src } => {
                write!(f, "No programs found in {}", src.display())
            }
            BuildError::CommandFailed { command, code } => {
                write!(f, "Command failed with exit {}: {}", code, command)
            }
        }
    }
}

impl std::error::Error for BuildError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_keeps_exit_code() {
        let err = BuildError::CommandFailed {
            command: "clang -c a.c".to_string(),
            code: 3,
        };
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("clang -c a.c"));
    }

    #[test]
    fn test_other_errors_exit_with_one() {
        let err = BuildError::NoPrograms {
            src: PathBuf::from("src"),
        };
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_missing_module_names_path() {
        let err = BuildError::MissingModule {
            name: "missing".to_string(),
            path: PathBuf::from("src/missing"),
        };
        let msg = err.to_string();
        assert!(msg.contains("src/missing"));
        assert!(msg.contains("Missing module"));
    }
}
