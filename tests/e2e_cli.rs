//! CLI end-to-end tests
//!
//! Tests for the iiif-presenter command-line interface. None of these touch
//! a provider: resolution of provider URLs is string-based.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the iiif-presenter binary
#[allow(deprecated)]
fn presenter_cmd() -> Command {
    Command::cargo_bin("iiif-presenter").unwrap()
}

fn memory_config(dir: &std::path::Path) -> PathBuf {
    let path = dir.join("config.toml");
    fs::write(&path, "[cache]\nbackend = \"memory\"\n").unwrap();
    path
}

#[test]
fn test_cli_no_args_shows_help() {
    presenter_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    presenter_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_start_help() {
    presenter_cmd()
        .args(["start", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Start the manifest server"));
}

#[test]
fn test_cli_resolve_github_url() {
    let dir = tempdir().unwrap();
    let config = memory_config(dir.path());

    presenter_cmd()
        .arg("--config")
        .arg(&config)
        .args([
            "resolve",
            "https://github.com/acct/repo/blob/main/maps/harbor.jpg",
            "--base-url",
            "https://iiif.example.org",
        ])
        .assert()
        .success()
        .stdout(predicate::str::diff(
            "https://iiif.example.org/gh:acct/repo/maps/harbor.jpg/manifest.json\n",
        ));
}

#[test]
fn test_cli_resolve_archive_item() {
    let dir = tempdir().unwrap();
    let config = memory_config(dir.path());

    presenter_cmd()
        .arg("--config")
        .arg(&config)
        .args(["resolve", "https://archive.org/details/mobydickorwhale01melv"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "https://iiif.archivelab.org/iiif/mobydickorwhale01melv/manifest.json",
        ));
}

#[test]
fn test_cli_validate_config() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("presenter.toml");
    fs::write(
        &config,
        "language = \"fr\"\n\n[server]\nport = 9090\n\n[cache]\nmax_age_days = 10\n",
    )
    .unwrap();

    presenter_cmd()
        .arg("validate")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("9090"))
        .stdout(predicate::str::contains("Max age: 10 days"))
        .stdout(predicate::str::contains("Language: fr"));
}

#[test]
fn test_cli_validate_rejects_bad_config() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("broken.toml");
    fs::write(&config, "[server]\nport = 0\n").unwrap();

    presenter_cmd().arg("validate").arg(&config).assert().failure();
}
