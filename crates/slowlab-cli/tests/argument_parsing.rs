//! Focused CLI argument parsing tests.
//!
//! Every run uses either no store at all or a tiny dataset, so these finish
//! in seconds.

#![allow(deprecated)] // Command::cargo_bin is deprecated but replacement requires newer assert_cmd

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Runs the binary with an isolated home and project directory.
fn slowlab(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("slowlab").unwrap();
    cmd.env("HOME", temp.path())
        .env("XDG_CONFIG_HOME", temp.path().join(".config"))
        .env("RUST_LOG", "warn")
        .arg("--project-dir")
        .arg(temp.path())
        .arg("--no-color");
    cmd
}

const SMALL_RUN: [&str; 12] = [
    "--orders",
    "60",
    "--hot-customer",
    "60",
    "--hot-phone",
    "10",
    "--date-range",
    "12",
    "--batch",
    "25",
    "--explain",
    "false",
];

// ============================================================================
// Informational Flags
// ============================================================================

#[test]
fn version_flag_shows_version() {
    Command::cargo_bin("slowlab")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("slowlab"));
}

#[test]
fn help_flag_shows_usage() {
    Command::cargo_bin("slowlab")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("indexing pitfalls"))
        .stdout(predicate::str::contains("--skip-seed"))
        .stdout(predicate::str::contains("--explain"));
}

#[test]
fn list_scenarios_prints_catalog() {
    let temp = TempDir::new().unwrap();
    slowlab(&temp)
        .arg("--list-scenarios")
        .assert()
        .success()
        .stdout(predicate::str::contains("bookmark-lookup"))
        .stdout(predicate::str::contains("covering-index"))
        .stdout(predicate::str::contains("function-wrapped"))
        .stdout(predicate::str::contains("range-predicate"))
        .stdout(predicate::str::contains("implicit-coercion"))
        .stdout(predicate::str::contains("type-matched"));
}

#[test]
fn list_scenarios_as_json() {
    let temp = TempDir::new().unwrap();
    let output = slowlab(&temp)
        .args(["--list-scenarios", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 6);
    assert_eq!(entries[5]["params"][0], "'13812345678'");
}

#[test]
fn show_config_reflects_flags() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("slowlab.toml"), "[seed]\nseed = 7\n").unwrap();

    slowlab(&temp)
        .args(["--show-config", "--database", ":memory:", "--orders", "123"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[store]"))
        .stdout(predicate::str::contains("\":memory:\""))
        .stdout(predicate::str::contains("orders = 123"))
        .stdout(predicate::str::contains("seed = 7"));
}

// ============================================================================
// Argument Parsing Errors
// ============================================================================

#[test]
fn unknown_flag_fails() {
    Command::cargo_bin("slowlab")
        .unwrap()
        .arg("--bogus")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unexpected argument"));
}

#[test]
fn invalid_explain_value_fails() {
    Command::cargo_bin("slowlab")
        .unwrap()
        .args(["--explain", "maybe"])
        .assert()
        .failure();
}

#[test]
fn invalid_format_fails() {
    Command::cargo_bin("slowlab")
        .unwrap()
        .args(["--format", "xml", "--list-scenarios"])
        .assert()
        .failure();
}

#[test]
fn non_numeric_orders_fails() {
    Command::cargo_bin("slowlab")
        .unwrap()
        .args(["--orders", "lots"])
        .assert()
        .failure();
}

#[test]
fn zero_batch_in_config_file_uses_default() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("slowlab.toml"), "[seed]\nbatch_size = 0\n").unwrap();

    slowlab(&temp)
        .arg("--show-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("batch_size = 1000"));
}

#[test]
fn zero_batch_flag_uses_default() {
    let temp = TempDir::new().unwrap();
    slowlab(&temp)
        .args(["--show-config", "--batch", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("batch_size = 1000"));
}

// ============================================================================
// Small Runs
// ============================================================================

#[test]
fn unreachable_database_fails() {
    let temp = TempDir::new().unwrap();
    let database = temp.path().join("missing").join("lab.duckdb");

    slowlab(&temp)
        .arg("--database")
        .arg(&database)
        .args(SMALL_RUN)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open the order store"));
}

#[test]
fn small_in_memory_run_reports_json() {
    let temp = TempDir::new().unwrap();
    let output = slowlab(&temp)
        .args(["--database", ":memory:", "--format", "json"])
        .args(SMALL_RUN)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    // The dataset table precedes the JSON array on stdout.
    let stdout = String::from_utf8(output.stdout).unwrap();
    let json_start = stdout.find("[\n").unwrap();
    let results: serde_json::Value = serde_json::from_str(&stdout[json_start..]).unwrap();
    let results = results.as_array().unwrap();

    assert_eq!(results.len(), 6);
    let rows: Vec<u64> = results.iter().map(|r| r["rows"].as_u64().unwrap()).collect();
    assert_eq!(rows, vec![60, 60, 12, 12, 10, 10]);
    assert!(results.iter().all(|r| r["status"] == "OK"));
    assert!(results.iter().all(|r| r["plan"].as_array().unwrap().is_empty()));
}

#[test]
fn reseeding_on_disk_store_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let database = temp.path().join("lab.duckdb");

    for _ in 0..2 {
        slowlab(&temp)
            .arg("--database")
            .arg(&database)
            .arg("--skip-scenarios")
            .args(SMALL_RUN)
            .assert()
            .success()
            .stdout(predicate::str::contains("Total orders"))
            .stdout(predicate::str::contains("82"));
    }
}

#[test]
fn skip_seed_on_empty_store_records_setup_errors() {
    let temp = TempDir::new().unwrap();
    slowlab(&temp)
        .args(["--database", ":memory:", "--skip-seed", "--format", "json"])
        .args(SMALL_RUN)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "ERR: setup: fetch template order: no order found for customer 100",
        ))
        .stdout(predicate::str::contains("\"status\": \"OK\""));
}

#[test]
fn plan_section_notes_errored_scenarios() {
    let temp = TempDir::new().unwrap();
    slowlab(&temp)
        .args(["--database", ":memory:", "--skip-seed"])
        .args(&SMALL_RUN[..10])
        .assert()
        .success()
        .stdout(predicate::str::contains("Plan: bookmark-lookup"))
        .stdout(predicate::str::contains("skipped explain due to error: setup:"));
}
