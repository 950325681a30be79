//! Smoke tests for startup paths that need no database

use assert_cmd::Command;
use predicates::prelude::*;

/// Binary isolated from the caller's environment and any ./.env
fn dbagent(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("dbagent").unwrap();
    cmd.current_dir(dir.path())
        .env_clear()
        .env("RUST_LOG", "info");
    cmd
}

#[test]
fn test_help_lists_database_flags() {
    let dir = tempfile::tempdir().unwrap();
    dbagent(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("MySQL host"))
        .stdout(predicate::str::contains("--query-timeout"));
}

#[test]
fn test_invalid_port_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    dbagent(&dir)
        .env("PORT", "not-a-port")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("invalid value for PORT"));
}

#[test]
fn test_missing_env_file_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    dbagent(&dir)
        .arg("--env-file")
        .arg(dir.path().join("missing.env"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Failed to load env file"));
}

#[test]
fn test_unreachable_database_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    dbagent(&dir)
        .env("DB_HOST", "127.0.0.1")
        .env("DB_PORT", "1")
        .env("PORT", "0")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Database connection error"));
}

#[test]
fn test_env_file_is_read() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".env"), "DB_CONNECTION_LIMIT=zero\n").unwrap();

    dbagent(&dir)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("DB_CONNECTION_LIMIT"));
}
