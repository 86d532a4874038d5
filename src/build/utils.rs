use crate::config::BuildConfig;
use crate::plan::{BuildPlan, CompileStep, LinkStep};
use anyhow::{Context, Result};
use serde_json::json;
use std::fmt;
use std::fs;
use std::path::PathBuf;

pub const COMPILE_COMMANDS: &str = "compile_commands.json";

/// An external command: executable plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// `cc <cflags> <defines> <includes> -c <src> -o <obj>`
pub fn compile_command(config: &BuildConfig, step: &CompileStep) -> CommandLine {
    let mut args = config.cflags.clone();
    args.extend(step.unit.define_flags());
    args.extend(config.include_flags.iter().cloned());
    args.push("-c".to_string());
    args.push(step.unit.source.to_string_lossy().to_string());
    args.push("-o".to_string());
    args.push(step.object.to_string_lossy().to_string());
    CommandLine {
        program: config.compiler.clone(),
        args,
    }
}

/// `cc -o <exe> <objects...> <ldflags>`
pub fn link_command(config: &BuildConfig, link: &LinkStep) -> CommandLine {
    let mut args = vec![
        "-o".to_string(),
        link.executable.to_string_lossy().to_string(),
    ];
    args.extend(link.objects.iter().map(|o| o.to_string_lossy().to_string()));
    args.extend(config.ldflags.iter().cloned());
    CommandLine {
        program: config.compiler.clone(),
        args,
    }
}

/// One clang-style compilation database entry per translation unit.
pub fn compile_database(config: &BuildConfig, plan: &BuildPlan) -> serde_json::Value {
    let directory = config.root.to_string_lossy().to_string();
    let entries: Vec<serde_json::Value> = plan
        .compiles
        .iter()
        .map(|step| {
            json!({
                "directory": directory,
                "command": compile_command(config, step).to_string(),
                "file": step.unit.source.to_string_lossy(),
                "output": step.object.to_string_lossy(),
            })
        })
        .collect();
    serde_json::Value::Array(entries)
}

pub fn write_compile_commands(config: &BuildConfig, plan: &BuildPlan) -> Result<PathBuf> {
    let path = config.root.join(COMPILE_COMMANDS);
    let json_str = serde_json::to_string_pretty(&compile_database(config, plan))?;
    fs::write(&path, json_str).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Profile;
    use crate::directive::Define;
    use crate::sources::TranslationUnit;
    use crate::staleness::Staleness;
    use std::path::Path;

    fn config() -> BuildConfig {
        BuildConfig::new(Path::new("/proj"), Profile::Release, "clang")
    }

    fn step(config: &BuildConfig) -> CompileStep {
        let source = config.src_dir.join("app.c");
        CompileStep {
            object: config.object_path(&source).unwrap(),
            unit: TranslationUnit {
                source,
                module: None,
                defines: vec![Define::parse("DEBUG_LOG").unwrap(), Define::parse("N=2").unwrap()],
            },
            status: Staleness::Missing,
        }
    }

    #[test]
    fn test_compile_command_order() {
        let config = config();
        let cmd = compile_command(&config, &step(&config));
        assert_eq!(cmd.program, "clang");
        let args = cmd.args;
        let pos = |needle: &str| args.iter().position(|a| a == needle).unwrap();
        assert!(pos("-O2") < pos("-DDEBUG_LOG"));
        assert!(pos("-DN=2") < pos("-c"));
        assert!(args.iter().position(|a| a.starts_with("-I")).unwrap() < pos("-c"));
        assert_eq!(args[args.len() - 2], "-o");
        assert!(args.last().unwrap().ends_with("app.o"));
    }

    #[test]
    fn test_link_command() {
        let mut config = config();
        config.ldflags = vec!["-lm".to_string()];
        let link = LinkStep {
            program: "app".to_string(),
            executable: PathBuf::from("/proj/_bin/app"),
            objects: vec![PathBuf::from("a.o"), PathBuf::from("b.o")],
            status: Staleness::Missing,
        };
        let cmd = link_command(&config, &link);
        assert_eq!(cmd.to_string(), "clang -o /proj/_bin/app a.o b.o -lm");
    }

    #[test]
    fn test_compile_database_entries() {
        let config = config();
        let plan = BuildPlan {
            compiles: vec![step(&config)],
            ..Default::default()
        };
        let db = compile_database(&config, &plan);
        let entries = db.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0]["command"].as_str().unwrap().contains("-DDEBUG_LOG"));
        assert_eq!(entries[0]["directory"], "/proj");
    }
}
