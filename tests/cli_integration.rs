//! CLI integration tests
//!
//! End-to-end tests for the `oracle` binary using assert_cmd.

mod common;

use assert_cmd::Command;
use common::{make_snapshot, snapshot_row};
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STORE_ENV: [&str; 7] = [
    "ORACLE_STORE_URL",
    "ORACLE_STORE_KEY",
    "SUPABASE_URL",
    "SUPABASE_KEY",
    "SUPABASE_SERVICE_ROLE_KEY",
    "ORACLE_API_URL",
    "RUST_LOG",
];

/// The `oracle` binary, run in an empty directory with no store configured.
fn oracle_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("oracle").unwrap();
    cmd.current_dir(dir.path());
    for name in STORE_ENV {
        cmd.env_remove(name);
    }
    cmd
}

#[test]
fn test_version_output() {
    let dir = TempDir::new().unwrap();
    oracle_cmd(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("oracle"));
}

#[test]
fn test_help_shows_all_commands() {
    let dir = TempDir::new().unwrap();
    let assert = oracle_cmd(&dir).arg("--help").assert().success();
    for command in [
        "watch", "snapshot", "since", "diff", "agents", "infra", "queues", "llm", "logs",
        "alerts", "chat", "task", "report", "config", "completions",
    ] {
        assert!(
            String::from_utf8_lossy(&assert.get_output().stdout).contains(command),
            "help is missing {}",
            command
        );
    }
}

#[test]
fn test_watch_help() {
    let dir = TempDir::new().unwrap();
    oracle_cmd(&dir)
        .args(["watch", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--no-realtime"))
        .stdout(predicate::str::contains("--once"))
        .stdout(predicate::str::contains("--interval"));
}

#[test]
fn test_config_init_creates_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("oracle.toml");

    oracle_cmd(&dir)
        .args(["config", "init", "-o"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file created"));

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[store]"));
}

#[test]
fn test_config_init_refuses_overwrite() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("oracle.toml");
    std::fs::write(&config_path, "existing").unwrap();

    oracle_cmd(&dir)
        .args(["config", "init", "-o"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn test_completions_bash() {
    let dir = TempDir::new().unwrap();
    oracle_cmd(&dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("oracle"));
}

#[test]
fn test_snapshot_without_store_fails() {
    let dir = TempDir::new().unwrap();
    oracle_cmd(&dir)
        .arg("snapshot")
        .assert()
        .failure()
        .stderr(predicate::str::contains("store.url"));
}

#[test]
fn test_invalid_config_file_fails() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("oracle.toml"), "[sync\n").unwrap();

    oracle_cmd(&dir)
        .arg("snapshot")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[tokio::test]
async fn test_snapshot_json_from_store() {
    let server = MockServer::start().await;
    let snapshot = make_snapshot("snap-cli", 0);

    Mock::given(method("GET"))
        .and(path("/rest/v1/system_snapshots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([snapshot_row(&snapshot)])))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    oracle_cmd(&dir)
        .env("ORACLE_STORE_URL", server.uri())
        .env("ORACLE_STORE_KEY", "anon-key")
        .args(["snapshot", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"snap-cli\""));
}

#[tokio::test]
async fn test_snapshot_empty_store_explains() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/system_snapshots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    oracle_cmd(&dir)
        .env("SUPABASE_URL", server.uri())
        .env("SUPABASE_KEY", "anon-key")
        .arg("snapshot")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No snapshots found"));
}

#[tokio::test]
async fn test_logs_filter_by_level() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/agent_logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 2, "timestamp": "2025-01-15T10:00:02Z", "level": "error", "message": "disk full", "source": "worker"},
            {"id": 1, "timestamp": "2025-01-15T10:00:01Z", "level": "info", "message": "started", "source": "worker"}
        ])))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    oracle_cmd(&dir)
        .env("ORACLE_STORE_URL", server.uri())
        .env("ORACLE_STORE_KEY", "anon-key")
        .args(["logs", "--level", "error", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("disk full"))
        .stdout(predicate::str::contains("started").not());
}

#[tokio::test]
async fn test_watch_once_renders_and_exits() {
    let server = MockServer::start().await;
    let snapshot = make_snapshot("snap-watch", 0);

    Mock::given(method("GET"))
        .and(path("/rest/v1/system_snapshots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([snapshot_row(&snapshot)])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/agent_logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    oracle_cmd(&dir)
        .env("ORACLE_STORE_URL", server.uri())
        .env("ORACLE_STORE_KEY", "anon-key")
        .args(["watch", "--once", "--no-realtime", "--json"])
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"snap-watch\""));
}
