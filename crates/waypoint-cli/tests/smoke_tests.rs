//! Smoke tests for the waypoint CLI
//!
//! None of these launch a browser.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the waypoint binary
fn waypoint() -> Command {
    let mut cmd = Command::cargo_bin("waypoint").expect("waypoint binary should exist");
    cmd.env_remove("WAYPOINT_BASE_URL").env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &TempDir, yaml: &str) -> std::path::PathBuf {
    let path = dir.path().join("suite.yaml");
    fs::write(&path, yaml).expect("write config");
    path
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    waypoint()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_lists_subcommands() {
    waypoint()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("check-config"));
}

#[test]
fn test_no_args_fails() {
    waypoint().assert().failure();
}

// ============================================================================
// list
// ============================================================================

#[test]
fn test_list_shows_catalogue() {
    waypoint()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("site-selection-map"))
        .stdout(predicate::str::contains("C813400 C813392"))
        .stdout(predicate::str::contains("stop-for-photo"));
}

#[test]
fn test_list_json_filtered() {
    let output = waypoint()
        .args(["list", "--json", "--filter", "speed"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 1);
    assert_eq!(entries[0]["name"], "max-speed");
    assert_eq!(entries[0]["cases"][0], 805450);
}

// ============================================================================
// check-config
// ============================================================================

#[test]
fn test_check_config_accepts_valid_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "base_url: https://planner.test/o/acme/\nsite_name: Depot\ndock_name: dock-7\n",
    );
    waypoint()
        .arg("check-config")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("config ok"))
        .stdout(predicate::str::contains("https://planner.test/o/acme/"))
        .stdout(predicate::str::contains("Depot / dock-7"));
}

#[test]
fn test_check_config_rejects_bad_base_url() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "base_url: planner.test\n");
    waypoint()
        .arg("check-config")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("base_url must be http(s)"));
}

#[test]
fn test_check_config_missing_file() {
    waypoint()
        .args(["check-config", "/nonexistent/suite.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

// ============================================================================
// run
// ============================================================================

#[test]
fn test_run_rejects_unknown_filter() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "base_url: http://localhost:3000/\n");
    waypoint()
        .arg("run")
        .arg("--config")
        .arg(&path)
        .args(["--filter", "no-such-scenario"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no scenario matches"));
}
