//! Integration tests for the taskboard CLI.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Helper to create a taskboard Command
fn taskboard() -> Command {
    cargo_bin_cmd!("taskboard")
}

#[test]
fn test_help() {
    taskboard()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn test_version() {
    taskboard().arg("--version").assert().success();
}

#[test]
fn test_serve_help_lists_flags() {
    taskboard()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--db-path"))
        .stdout(predicate::str::contains("--init"));
}

#[test]
fn test_serve_init_creates_database() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("board.db");

    taskboard()
        .args(["serve", "--init", "--db-path"])
        .arg(&db_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Board database initialized"));

    assert!(db_path.exists());
}

#[test]
fn test_serve_init_idempotent() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("board.db");

    for _ in 0..2 {
        taskboard()
            .args(["serve", "--init", "--db-path"])
            .arg(&db_path)
            .assert()
            .success();
    }
}

#[test]
fn test_unknown_subcommand_fails() {
    taskboard().arg("frobnicate").assert().failure();
}
