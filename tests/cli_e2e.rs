//! End-to-end CLI tests for the bookfetch binary.

mod support;

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use support::epub::write_epub;
use tempfile::TempDir;

fn bookfetch(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bookfetch").unwrap();
    cmd.env("HOME", home)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("XDG_DATA_HOME")
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(&path, body).unwrap();
    path
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let home = TempDir::new().unwrap();
    bookfetch(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Fetch requested e-books"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let home = TempDir::new().unwrap();
    bookfetch(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bookfetch"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    let home = TempDir::new().unwrap();
    bookfetch(home.path())
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

/// A run with nothing requested exits cleanly and writes the run log.
#[test]
fn test_run_with_empty_request_list_succeeds() {
    let home = TempDir::new().unwrap();
    let base = home.path().join("data");
    let config = write_config(
        home.path(),
        &format!("base_dir = \"{}\"\n", base.display()),
    );

    bookfetch(home.path())
        .arg("--config")
        .arg(&config)
        .arg("run")
        .assert()
        .success();

    assert!(base.join("library").is_dir(), "staging created");
    let log = std::fs::read_to_string(base.join("book_fetcher.log")).unwrap();
    assert!(log.contains("no new queries"));
}

/// A staging directory that cannot be created is logged, not a failing exit.
#[test]
fn test_run_with_uncreatable_staging_exits_normally() {
    let home = TempDir::new().unwrap();
    let blocker = home.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();
    let config = write_config(
        home.path(),
        &format!(
            "base_dir = \"{}\"\nstaging_dir = \"{}\"\n",
            home.path().join("data").display(),
            blocker.join("staging").display()
        ),
    );

    bookfetch(home.path())
        .arg("--config")
        .arg(&config)
        .arg("run")
        .assert()
        .success()
        .stderr(predicate::str::contains("run aborted"));
}

/// Without a config file, defaults live under the home directory.
#[test]
fn test_default_base_dir_is_under_home() {
    let home = TempDir::new().unwrap();
    bookfetch(home.path()).arg("-q").assert().success();
    assert!(
        home.path()
            .join(".local/share/bookfetch/library")
            .is_dir()
    );
}

/// Unknown config keys are rejected with a non-zero exit.
#[test]
fn test_invalid_config_fails() {
    let home = TempDir::new().unwrap();
    let config = write_config(home.path(), "concurrency = 4\n");

    bookfetch(home.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));
}

/// A missing explicit config file is an error.
#[test]
fn test_missing_explicit_config_fails() {
    let home = TempDir::new().unwrap();
    bookfetch(home.path())
        .args(["--config", "/definitely/not/here.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

/// `events` prints one JSON record per book.
#[test]
fn test_events_prints_sync_records() {
    let home = TempDir::new().unwrap();
    let library = home.path().join("books");
    std::fs::create_dir_all(&library).unwrap();
    write_epub(&library.join("Dune.epub"), "Dune", "Herbert, Frank", None);

    let output = bookfetch(home.path())
        .arg("events")
        .arg("--library")
        .arg(&library)
        .args(["--host", "http://nas:5000", "--shape", "v2"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let events: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(events.as_array().map(Vec::len), Some(1));
    assert_eq!(events[0]["ChangeType"], "Entitlement");
    assert_eq!(events[0]["NewEntitlement"]["BookMetadata"]["Title"], "Dune");
    assert!(events[0]["NewEntitlement"]["BookMetadata"].get("Publisher").is_none());
}

/// `events` requires a host.
#[test]
fn test_events_requires_host() {
    let home = TempDir::new().unwrap();
    bookfetch(home.path())
        .arg("events")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--host"));
}
