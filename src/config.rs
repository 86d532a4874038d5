//! Build configuration.
//!
//! A [`BuildConfig`] is assembled once per invocation from the profile, the
//! optional `nb.toml` file and the environment, then passed by reference to
//! every stage of the pipeline. Nothing mutates it afterwards.
//!
//! ```toml
//! # nb.toml
//! [build]
//! compiler = "gcc"
//! cflags = ["-fno-strict-aliasing"]
//! ldflags = ["-lm"]
//!
//! [paths]
//! src = "src"
//!
//! [profile.release]
//! suffix = "-rel"
//! ```

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::process::Command;

pub const CONFIG_FILE: &str = "nb.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Debug,
    Release,
}

impl Profile {
    pub fn from_release(release: bool) -> Self {
        if release {
            Profile::Release
        } else {
            Profile::Debug
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Profile::Debug => "debug",
            Profile::Release => "release",
        }
    }

    /// Compiler flags every unit gets under this profile.
    pub fn cflags(&self) -> Vec<String> {
        let mut flags = vec!["-std=c23", "-Wall", "-Wextra", "-pipe"];
        match self {
            Profile::Debug => flags.extend(["-g", "-O0", "-DDEBUG"]),
            Profile::Release => flags.extend(["-O2", "-DNDEBUG"]),
        }
        flags.into_iter().map(String::from).collect()
    }

    fn default_suffix(&self) -> &'static str {
        match self {
            Profile::Debug => "-debug",
            Profile::Release => "",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw `nb.toml` contents. Every section is optional.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct NbToml {
    pub build: Option<BuildSection>,
    pub paths: Option<PathsSection>,
    #[serde(default)]
    pub profile: HashMap<String, ProfileSection>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    pub compiler: Option<String>,
    pub cflags: Option<Vec<String>>,
    pub ldflags: Option<Vec<String>>,
    pub include: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PathsSection {
    pub src: Option<String>,
    pub obj: Option<String>,
    pub bin: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct ProfileSection {
    pub cflags: Option<Vec<String>>,
    pub suffix: Option<String>,
}

/// Everything the pipeline needs to know about where and how to build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub root: PathBuf,
    pub src_dir: PathBuf,
    /// Object tree for the active profile (`_obj/<profile>`).
    pub obj_dir: PathBuf,
    pub obj_base: PathBuf,
    pub bin_dir: PathBuf,
    pub compiler: String,
    pub cflags: Vec<String>,
    pub include_flags: Vec<String>,
    pub ldflags: Vec<String>,
    pub exe_suffix: String,
    pub profile: Profile,
}

impl BuildConfig {
    /// Built-in defaults with an explicit compiler; no file or environment lookup.
    pub fn new(root: &Path, profile: Profile, compiler: &str) -> Self {
        Self::from_toml(root, profile, NbToml::default(), Some(compiler.to_string()))
    }

    /// Read `nb.toml` (if present) under `root` and resolve the compiler.
    pub fn load(root: &Path, profile: Profile) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        let file = if path.exists() {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str(&text).with_context(|| {
                format!(
                    "Failed to parse {} - check for syntax errors or unknown keys",
                    path.display()
                )
            })?
        } else {
            NbToml::default()
        };

        let env_cc = std::env::var("CC").ok().filter(|cc| !cc.trim().is_empty());
        Ok(Self::from_toml(root, profile, file, env_cc))
    }

    fn from_toml(root: &Path, profile: Profile, file: NbToml, env_cc: Option<String>) -> Self {
        let build = file.build.unwrap_or_default();
        let paths = file.paths.unwrap_or_default();
        let profile_section = file.profile.get(profile.name());

        let src_dir = root.join(paths.src.as_deref().unwrap_or("src"));
        let obj_base = root.join(paths.obj.as_deref().unwrap_or("_obj"));
        let bin_dir = root.join(paths.bin.as_deref().unwrap_or("_bin"));

        let compiler = build
            .compiler
            .or(env_cc)
            .unwrap_or_else(detect_compiler);

        let mut cflags = profile.cflags();
        cflags.extend(build.cflags.unwrap_or_default());
        if let Some(extra) = profile_section.and_then(|p| p.cflags.clone()) {
            cflags.extend(extra);
        }

        let include_flags = match build.include {
            Some(dirs) => dirs
                .iter()
                .map(|d| format!("-I{}", root.join(d).display()))
                .collect(),
            None => vec![format!("-I{}", src_dir.display())],
        };

        let exe_suffix = profile_section
            .and_then(|p| p.suffix.clone())
            .unwrap_or_else(|| profile.default_suffix().to_string());

        Self {
            root: root.to_path_buf(),
            obj_dir: obj_base.join(profile.name()),
            obj_base,
            src_dir,
            bin_dir,
            compiler,
            cflags,
            include_flags,
            ldflags: build.ldflags.unwrap_or_default(),
            exe_suffix,
            profile,
        }
    }

    /// Path of the override file in `dir`.
    pub fn override_file(&self, dir: &Path) -> PathBuf {
        dir.join(".build")
    }

    pub fn executable_path(&self, program: &str) -> PathBuf {
        let name = format!("{}{}{}", program, self.exe_suffix, std::env::consts::EXE_SUFFIX);
        self.bin_dir.join(name)
    }

    /// Mirror of `source` under the object tree, with a `.o` extension.
    /// `source` must lie inside the source root.
    pub fn object_path(&self, source: &Path) -> Result<PathBuf> {
        let outside = || {
            format!(
                "{} is outside the source root {}",
                source.display(),
                self.src_dir.display()
            )
        };
        let relative = source.strip_prefix(&self.src_dir).with_context(outside)?;
        if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            bail!(outside());
        }
        Ok(self.obj_dir.join(relative).with_extension("o"))
    }

    /// `path` relative to the source root (or project root), for display.
    pub fn display_path<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.src_dir)
            .or_else(|_| path.strip_prefix(&self.root))
            .unwrap_or(path)
    }
}

fn is_command_available(cmd: &str) -> bool {
    Command::new(cmd).arg("--version").output().is_ok()
}

/// First of `clang`/`gcc` found on PATH, falling back to `clang`.
fn detect_compiler() -> String {
    ["clang", "gcc"]
        .into_iter()
        .find(|cc| is_command_available(cc))
        .unwrap_or("clang")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> NbToml {
        toml::from_str(text).unwrap()
    }

    fn with_cc(root: &str, profile: Profile, file: NbToml) -> BuildConfig {
        BuildConfig::from_toml(Path::new(root), profile, file, Some("cc".into()))
    }

    #[test]
    fn test_profile_flags() {
        let debug = Profile::Debug.cflags();
        assert!(debug.contains(&"-O0".to_string()));
        assert!(debug.contains(&"-DDEBUG".to_string()));
        let release = Profile::Release.cflags();
        assert!(release.contains(&"-O2".to_string()));
        assert!(release.contains(&"-DNDEBUG".to_string()));
        assert_eq!(release[0], "-std=c23");
    }

    #[test]
    fn test_defaults_layout() {
        let root = Path::new("/proj");
        let config =
            BuildConfig::from_toml(root, Profile::Debug, NbToml::default(), Some("cc".into()));
        assert_eq!(config.src_dir, root.join("src"));
        assert_eq!(config.obj_dir, root.join("_obj").join("debug"));
        assert_eq!(config.compiler, "cc");
        assert_eq!(config.include_flags, vec![format!("-I{}", root.join("src").display())]);
        assert!(
            config
                .executable_path("app")
                .to_string_lossy()
                .contains("app-debug")
        );
    }

    #[test]
    fn test_release_has_no_suffix() {
        let config = with_cc("/p", Profile::Release, NbToml::default());
        assert_eq!(
            config.executable_path("app"),
            Path::new("/p/_bin").join(format!("app{}", std::env::consts::EXE_SUFFIX))
        );
    }

    #[test]
    fn test_toml_compiler_wins_over_env() {
        let file = parse(
            r#"
[build]
compiler = "gcc"
cflags = ["-fno-common"]
ldflags = ["-lm"]

[profile.debug]
cflags = ["-fsanitize=address"]
suffix = "-dbg"
"#,
        );
        let config =
            BuildConfig::from_toml(Path::new("/p"), Profile::Debug, file, Some("tcc".into()));
        assert_eq!(config.compiler, "gcc");
        assert_eq!(config.ldflags, vec!["-lm"]);
        let tail: Vec<&str> = config.cflags.iter().rev().take(2).map(|s| s.as_str()).collect();
        assert_eq!(tail, vec!["-fsanitize=address", "-fno-common"]);
        assert_eq!(config.exe_suffix, "-dbg");
    }

    #[test]
    fn test_custom_paths() {
        let file = parse("[paths]\nsrc = \"code\"\nobj = \"out/obj\"\nbin = \"out/bin\"\n");
        let config = with_cc("/p", Profile::Release, file);
        assert_eq!(config.src_dir, Path::new("/p/code"));
        assert_eq!(config.obj_dir, Path::new("/p/out/obj/release"));
        assert_eq!(config.bin_dir, Path::new("/p/out/bin"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result: Result<NbToml, _> = toml::from_str("[build]\ncompilr = \"gcc\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_object_path_mirrors_source_tree() {
        let config = with_cc("/p", Profile::Debug, NbToml::default());
        let obj = config.object_path(Path::new("/p/src/net/tcp/socket.c")).unwrap();
        assert_eq!(obj, Path::new("/p/_obj/debug/net/tcp/socket.o"));
    }

    #[test]
    fn test_object_path_rejects_sources_outside_src() {
        let config = with_cc("/p", Profile::Debug, NbToml::default());
        for source in ["/elsewhere/a.c", "/p/src/../vendor/v.c", "/p/app.c"] {
            let err = config.object_path(Path::new(source)).unwrap_err();
            assert!(err.to_string().contains("outside the source root"), "{source}");
        }
    }
}
