//! Shared test helpers for integration tests
//!
//! This module provides common utilities used across all test files.

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use std::path::Path;
use tempfile::TempDir;

/// Helper to get a difftrack command isolated from the user's environment
pub fn difftrack() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("difftrack"));
    for var in [
        "DIFFTRACK_STORE",
        "DIFFTRACK_DATA_DIR",
        "DIFFTRACK_PROTOCOL",
        "DIFFTRACK_PASSWORD",
        "DIFFTRACK_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Helper to run difftrack inside a project directory
pub fn difftrack_in(dir: &Path) -> Command {
    let mut cmd = difftrack();
    cmd.current_dir(dir).env("XDG_CONFIG_HOME", dir.join(".xdg"));
    cmd
}

/// Helper to create an initialized project without logging in
pub fn setup_bare_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    difftrack_in(tmp.path()).arg("init").assert().success();
    tmp
}

/// Helper to create a test project with user "alice" logged in
pub fn setup_test_project() -> TempDir {
    let tmp = setup_bare_project();
    login_as(&tmp, "alice", "pw");
    tmp
}

/// Helper to create an account (if needed) and log in as it
pub fn login_as(tmp: &TempDir, username: &str, password: &str) {
    let _ = difftrack_in(tmp.path())
        .args(["account", "new", username, "-p", password])
        .output()
        .unwrap();
    difftrack_in(tmp.path())
        .args(["account", "login", username, "-p", password])
        .assert()
        .success();
}

/// Helper to create a batch with a fixed start date
pub fn create_test_batch(tmp: &TempDir, id: u32, cell: &str, start: &str) {
    difftrack_in(tmp.path())
        .args([
            "batch",
            "new",
            "--id",
            &id.to_string(),
            "--cell",
            cell,
            "--start",
            start,
        ])
        .assert()
        .success();
}
