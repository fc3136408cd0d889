//! CLI integration tests using assert_cmd.
//!
//! Tests without database: always run (help, config handling, refusals).
//! Tests with database: gated on TEST_DATABASE_URL environment variable.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

#[allow(deprecated)]
fn skyline() -> Command {
    let mut cmd = Command::cargo_bin("skyline").unwrap();
    cmd.env_remove("DATABASE_URL").env_remove("SKYLINE_CONFIG");
    cmd
}

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// --- Help and arg validation ---

#[test]
fn help_shows_all_subcommands() {
    skyline().arg("--help").assert().success().stdout(
        predicate::str::contains("serve")
            .and(predicate::str::contains("stats"))
            .and(predicate::str::contains("reset"))
            .and(predicate::str::contains("catalog")),
    );
}

#[test]
fn help_serve_shows_args() {
    skyline()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--port").and(predicate::str::contains("--static-dir")));
}

#[test]
fn no_subcommand_fails() {
    skyline().assert().failure();
}

#[test]
fn serve_rejects_non_numeric_port() {
    skyline()
        .args(["serve", "--port", "abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

// --- Config and catalog (no database needed) ---

#[test]
fn catalog_prints_default_buildings() {
    let output = skyline().arg("catalog").assert().success().get_output().stdout.clone();
    let catalog: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let buildings = catalog.as_array().unwrap();
    assert_eq!(buildings.len(), 15);
    assert_eq!(buildings[0]["id"], "b1");
    assert_eq!(buildings[14]["id"], "b15");
}

#[test]
fn catalog_uses_config_file() {
    let file = config_file(
        r#"
[[buildings]]
id = "north"
name = "North Tower"
height = 200
width = 40
style = "spire"
z_index = 3
"#,
    );
    let output = skyline()
        .arg("--config")
        .arg(file.path())
        .arg("catalog")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let catalog: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(catalog.as_array().unwrap().len(), 1);
    assert_eq!(catalog[0]["id"], "north");
    assert_eq!(catalog[0]["style"], "spire");
}

#[test]
fn invalid_config_fails() {
    let file = config_file("[skyline]\ntotal_windows = 0\n");
    skyline()
        .arg("--config")
        .arg(file.path())
        .arg("catalog")
        .assert()
        .failure();
}

#[test]
fn unknown_config_key_fails() {
    let file = config_file("[skyline]\nwindows = 10\n");
    skyline()
        .arg("--config")
        .arg(file.path())
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("parsing config"));
}

#[test]
fn missing_config_file_fails() {
    skyline()
        .args(["--config", "/nonexistent/skyline.toml", "catalog"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reading config"));
}

#[test]
fn stats_requires_database_url() {
    skyline()
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DATABASE_URL is required"))
        .stdout(predicate::str::contains("litCount").not());
}

#[test]
fn reset_requires_database_url() {
    skyline()
        .arg("reset")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DATABASE_URL is required"))
        .stdout(predicate::str::contains("Skyline reset successfully").not());
}

// --- Database-backed ---

#[test]
fn stats_against_database() {
    if !common::has_test_db() {
        eprintln!("Skipping: TEST_DATABASE_URL not set");
        return;
    }
    skyline()
        .env("DATABASE_URL", common::test_db_url())
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("totalCount"));
}

#[test]
fn reset_against_database() {
    if !common::has_test_db() {
        eprintln!("Skipping: TEST_DATABASE_URL not set");
        return;
    }
    skyline()
        .env("DATABASE_URL", common::test_db_url())
        .arg("reset")
        .assert()
        .success()
        .stdout(predicate::str::contains("Skyline reset successfully"));
}
