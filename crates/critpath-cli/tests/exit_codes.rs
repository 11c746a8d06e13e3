//! Exit status of the `critpath` binary
//!
//! `0` means no diagnostic reached error severity after policy, `1` means at
//! least one did (fatal engine errors and unreadable input included).
//! `--strict` turns warnings into errors, `--quiet` only hides output, and
//! the JSON format must agree with the text format.

use std::path::PathBuf;
use std::process::Command;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn run(command: &str, fixture: &str, args: &[&str]) -> i32 {
    let status = Command::new(env!("CARGO_BIN_EXE_critpath"))
        .env_remove("CRITPATH_CONFIG")
        .arg(command)
        .arg(fixtures_dir().join(fixture))
        .args(args)
        .output()
        .expect("failed to execute critpath")
        .status;

    status.code().unwrap_or(-1)
}

fn run_analyze(fixture: &str, args: &[&str]) -> i32 {
    run("analyze", fixture, args)
}

// =============================================================================
// Default policy
// =============================================================================

#[test]
fn clean_chain_succeeds() {
    assert_eq!(run_analyze("chain.json", &[]), 0);
}

#[test]
fn dangling_reference_is_only_a_warning() {
    // Z is not in the table; the reference is dropped with W001
    assert_eq!(run_analyze("dangling.json", &[]), 0);
}

#[test]
fn repeated_predecessor_is_only_a_hint() {
    assert_eq!(run_analyze("repeated_predecessor.json", &[]), 0);
}

#[test]
fn cycle_fails() {
    assert_eq!(run_analyze("cycle.json", &[]), 1);
}

#[test]
fn duplicate_ids_fail() {
    assert_eq!(run_analyze("duplicate.json", &[]), 1);
}

#[test]
fn empty_table_fails() {
    assert_eq!(run_analyze("empty.json", &[]), 1);
}

#[test]
fn date_overflow_fails() {
    assert_eq!(run_analyze("overflow.json", &[]), 1);
    assert_eq!(run_analyze("overflow.json", &["--format", "json"]), 1);
}

#[test]
fn unreadable_input_fails() {
    assert_eq!(run_analyze("malformed.json", &[]), 1);
    assert_eq!(run_analyze("does_not_exist.json", &[]), 1);
}

// =============================================================================
// --strict
// =============================================================================

#[test]
fn strict_fails_on_dangling_reference() {
    assert_eq!(run_analyze("dangling.json", &["--strict"]), 1);
}

#[test]
fn strict_tolerates_hints() {
    // Hints escalate to warnings only
    assert_eq!(run_analyze("repeated_predecessor.json", &["--strict"]), 0);
}

#[test]
fn strict_tolerates_summary() {
    // The I001 summary stays informational
    assert_eq!(run_analyze("chain.json", &["--strict"]), 0);
}

// =============================================================================
// Quiet and JSON Modes
// =============================================================================

#[test]
fn quiet_does_not_change_exit_codes() {
    assert_eq!(run_analyze("dangling.json", &["--quiet"]), 0);
    assert_eq!(run_analyze("dangling.json", &["--quiet", "--strict"]), 1);
    assert_eq!(run_analyze("cycle.json", &["--quiet"]), 1);
}

#[test]
fn json_matches_text_exit_codes() {
    for fixture in ["chain.json", "dangling.json", "cycle.json", "duplicate.json"] {
        assert_eq!(
            run_analyze(fixture, &["--format", "json"]),
            run_analyze(fixture, &[]),
            "{fixture}"
        );
    }
    assert_eq!(run_analyze("dangling.json", &["--format", "json", "--strict"]), 1);
}

// =============================================================================
// Check Command
// =============================================================================

#[test]
fn check_exit_codes() {
    assert_eq!(run("check", "chain.json", &[]), 0);
    assert_eq!(run("check", "dangling.json", &[]), 0);
    assert_eq!(run("check", "dangling.json", &["--strict"]), 1);
    assert_eq!(run("check", "cycle.json", &[]), 1);
}
