//! CLI integration tests for the `rustburg` binary.
//!
//! Uses `assert_cmd` to spawn the real binary and verify exit codes,
//! stdout content and stderr diagnostics. All tests set `current_dir` to
//! the workspace root so relative paths to the demo specifications
//! resolve correctly.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Locate the workspace root by walking up from CARGO_MANIFEST_DIR.
fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    // crates/cli -> workspace root is two levels up
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

/// Helper: create a Command for the `rustburg` binary, rooted at the
/// workspace.
fn rustburg() -> Command {
    let mut cmd = Command::cargo_bin("rustburg").expect("binary exists");
    cmd.current_dir(workspace_root());
    cmd
}

/// Helper: write a scratch specification and return its handle.
fn scratch_spec(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write spec");
    file
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    rustburg()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "BURG-style code-generator generator",
        ));
}

#[test]
fn version_exits_0() {
    rustburg()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rustburg"));
}

// ──────────────────────────────────────────────
// 2. Generate subcommand
// ──────────────────────────────────────────────

#[test]
fn generate_emits_the_matcher_to_stdout() {
    rustburg()
        .args(["generate", "demos/arith.burg"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pub struct Nonterm {"))
        .stdout(predicate::str::contains("pub fn conADD(arg1: Nonterm, arg2: Nonterm) -> Nonterm {"))
        .stdout(predicate::str::contains("pub fn update_e(nt: Nt<Val>, x: Nonterm) -> Nonterm {"))
        .stdout(predicate::str::contains("pub _CONST1: Nt<()>,"));
}

#[test]
fn generate_handles_terminals_and_dynamic_costs() {
    rustburg()
        .args(["generate", "demos/isel.burg"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pub fn conREG(arg1: reg) -> Nonterm {"))
        .stdout(predicate::str::contains(
            "Cost::from({ let k = arg1.clone(); if k < 256 { 1 } else { 2 } })",
        ))
        .stdout(predicate::str::contains("pub const WORD: i64 = 8;"));
}

#[test]
fn generate_is_deterministic_across_runs() {
    let first = rustburg()
        .args(["generate", "demos/isel.burg"])
        .output()
        .expect("first run");
    let second = rustburg()
        .args(["generate", "demos/isel.burg"])
        .output()
        .expect("second run");
    assert!(first.status.success() && second.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn generate_missing_file_exits_1() {
    rustburg()
        .args(["generate", "demos/no_such.burg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: I/O error"));
}

#[test]
fn generate_reports_missing_type_annotation() {
    let spec = scratch_spec("%%\ne : CONST(x:int) [1] {: x :}\n");
    let path = spec.path().display().to_string();
    rustburg()
        .args(["generate", path.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no %type annotation"));
}

#[test]
fn generate_reports_signature_conflicts() {
    let spec = scratch_spec(
        "%type e {: i64 :}\n%%\ne : FOO(x:e) [1] {: x :}\ne : FOO(x:e, y:e) [1] {: x + y :}\n",
    );
    let path = spec.path().display().to_string();
    rustburg()
        .args(["generate", path.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("constructor 'FOO' used inconsistently"));
}

#[test]
fn syntax_errors_are_reported_together() {
    let spec = scratch_spec("%%\ne : [1] {: bad :}\ne : ALSO( [1] {: bad :}\n");
    let path = spec.path().display().to_string();
    let assert = rustburg()
        .args(["generate", path.as_str()])
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert_eq!(
        stderr.matches("error: ").count(),
        2,
        "both broken rules reported: {}",
        stderr
    );
}

#[test]
fn json_diagnostics_are_structured() {
    let spec = scratch_spec("%%\ne : 0 [1] {: 0 :}\n");
    let path = spec.path().display().to_string();
    let assert = rustburg()
        .args(["--output", "json", "generate", path.as_str()])
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    let value: serde_json::Value =
        serde_json::from_str(stderr.trim()).expect("stderr is one JSON diagnostic");
    assert_eq!(value["kind"], "ill_formed_top_pattern");
    assert_eq!(value["lhs"], "e");
}

// ──────────────────────────────────────────────
// 3. Norm subcommand
// ──────────────────────────────────────────────

#[test]
fn norm_dumps_the_normalised_rules() {
    rustburg()
        .args(["norm", "demos/arith.burg"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_CONST1: CONST(0) [0] {: () :}"))
        .stdout(predicate::str::contains(
            "e: ADD(x:e, _x2:_CONST1) [1] {: x :}",
        ))
        .stdout(predicate::str::contains("s: e:e [1] {: e.to_string() :}"));
}

#[test]
fn norm_leaves_flat_rules_untouched() {
    rustburg()
        .args(["norm", "demos/arith.burg"])
        .assert()
        .success()
        .stdout(predicate::str::contains("e: ADD(x:e, y:e) [2] {: x + y :}"));
}

#[test]
fn norm_rejects_conflicting_auxiliary_shapes() {
    let spec = scratch_spec(
        "%type e {: i64 :}\n%%\ne : F(ADD(x:e, y:e)) [1] {: x + y :}\ne : G(ADD(x:e, CONST(0))) [1] {: x :}\ne : CONST(x:int) [1] {: x :}\n",
    );
    let path = spec.path().display().to_string();
    rustburg()
        .args(["norm", path.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("auxiliary '_ADD2'"));
}
