//! Integration tests for the `nb` binary
//!
//! These tests lay out small source trees in temporary directories and run
//! the real executable. Everything except the `unix` fake-compiler tests runs
//! without a C toolchain: errors are raised during planning, before any
//! compiler is invoked, and `--dry-run` never spawns one.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

/// Project from the README: app -> net -> util.
fn create_project() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let root = dir.path();
    write(
        root,
        "src/app.c",
        "//> use: net\n//> def: DEBUG_LOG\n#include \"net/net.h\"\nint main(void) { return net_init(); }\n",
    );
    write(root, "src/net/net.h", "//> use: util\n#pragma once\nint net_init(void);\n");
    write(root, "src/net/net.c", "int net_init(void) { return 0; }\n");
    write(root, "src/util/util.c", "int util_id(void) { return 1; }\n");
    dir
}

fn nb(root: &Path, args: &[&str], cc: &str) -> Output {
    Command::new(env!("CARGO_BIN_EXE_nb"))
        .args(args)
        .arg("--root")
        .arg(root)
        .env("CC", cc)
        .env("NO_COLOR", "1")
        .env("CLICOLOR", "0")
        .output()
        .expect("Failed to run nb")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_dry_run_lists_units_in_order() {
    let project = create_project();
    let output = nb(project.path(), &["--dry-run", "-v"], "cc");
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output).replace('\\', "/");
    let app = out.find("app.c").expect("app.c planned");
    let net = out.find("net/net.c").expect("net/net.c planned");
    let util = out.find("util/util.c").expect("util/util.c planned");
    assert!(app < net && net < util, "unexpected order:\n{out}");
    assert!(out.contains("-DDEBUG_LOG"));
    assert!(out.contains("app-debug"));

    assert!(!project.path().join("_obj").exists(), "dry run must not write");
    assert!(!project.path().join("compile_commands.json").exists());
}

#[test]
fn test_malformed_use_token_aborts() {
    let project = create_project();
    write(project.path(), "src/net/net.h", "//> use: a=b\n");

    let output = nb(project.path(), &[], "cc");
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("'a=b'"), "stderr: {err}");
    assert!(err.contains("net.h:1"), "stderr: {err}");
    assert!(!project.path().join("_obj").exists());
}

#[test]
fn test_missing_module_aborts() {
    let project = create_project();
    write(project.path(), "src/app.c", "//> use: missing\nint main(void){return 0;}\n");

    let output = nb(project.path(), &["app"], "cc");
    assert!(!output.status.success());
    let err = stderr(&output).replace('\\', "/");
    assert!(err.contains("Missing module 'missing'"), "stderr: {err}");
    assert!(err.contains("src/missing"), "stderr: {err}");
    assert!(!project.path().join("_obj").exists());
}

#[test]
fn test_unknown_command_shows_known_commands() {
    let project = create_project();
    write(project.path(), "src/util/.build", "link: m\n");

    let output = nb(project.path(), &["--dry-run"], "cc");
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Unknown directive"), "stderr: {err}");
    assert!(err.contains("'link'"));
    assert!(err.contains("Known commands"));
    assert!(err.contains("define"));
}

#[test]
fn test_unknown_program() {
    let project = create_project();
    let output = nb(project.path(), &["ghost"], "cc");
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Unknown program 'ghost'"));
}

#[test]
fn test_list_programs() {
    let project = create_project();
    write(project.path(), "src/tool.c", "int main(void){return 0;}\n");

    let output = nb(project.path(), &["--list"], "cc");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("app"));
    assert!(out.contains("tool"));
    assert!(out.contains("net, util"));
    assert!(out.contains("DEBUG_LOG"));
}

#[test]
fn test_clean_empty_project() {
    let project = create_project();
    let output = nb(project.path(), &["--clean"], "cc");
    assert!(output.status.success());
    assert!(stdout(&output).contains("Nothing to clean"));
}

#[cfg(unix)]
mod fake_compiler {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// A "compiler" that creates whatever file follows `-o`.
    const TOUCH_CC: &str = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
: > "$out"
"#;

    const FAIL_CC: &str = "#!/bin/sh\necho 'error: expected expression' >&2\nexit 7\n";

    fn script(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().to_string()
    }

    #[test]
    fn test_build_then_up_to_date() {
        let project = create_project();
        let tools = TempDir::new().unwrap();
        let cc = script(tools.path(), "touchcc", TOUCH_CC);

        let first = nb(project.path(), &["-j", "2"], &cc);
        assert!(first.status.success(), "stderr: {}", stderr(&first));
        assert!(project.path().join("_obj/debug/net/net.o").exists());
        assert!(project.path().join("_bin/app-debug").exists());
        assert!(project.path().join("compile_commands.json").exists());

        let second = nb(project.path(), &[], &cc);
        assert!(second.status.success());
        let out = stdout(&second);
        assert!(out.contains("3 source file(s) up to date"), "stdout: {out}");
        assert!(out.contains("(up to date)"), "stdout: {out}");
    }

    #[test]
    fn test_compiler_failure_exit_code() {
        let project = create_project();
        let tools = TempDir::new().unwrap();
        let cc = script(tools.path(), "failcc", FAIL_CC);

        let output = nb(project.path(), &["-j", "1"], &cc);
        assert_eq!(output.status.code(), Some(7));
        let err = stderr(&output);
        assert!(err.contains("exit 7"), "stderr: {err}");
        assert!(err.contains("failcc"), "stderr: {err}");
        assert!(!project.path().join("_bin").exists(), "no link after a failed compile");
    }
}
