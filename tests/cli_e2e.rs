//! End-to-end CLI tests for the paper-vis binary.

#![allow(deprecated)]

mod support;

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use support::socket_guard::start_mock_server_or_skip;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

/// Binary isolated from the caller's environment and config file.
fn paper_vis(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("paper-vis").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env_remove("PAPER_VIS_BASE_URL")
        .env_remove("PAPER_VIS_PROFILE")
        .env_remove("PAPER_VIS_DEV_ORIGIN")
        .env_remove("RUST_LOG");
    cmd
}

fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_binary_help_displays_usage() {
    let tempdir = TempDir::new().unwrap();
    paper_vis(tempdir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Upload papers to the analysis service"));
}

#[test]
fn test_binary_version_displays_version() {
    let tempdir = TempDir::new().unwrap();
    paper_vis(tempdir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("paper-vis"));
}

#[test]
fn test_binary_without_subcommand_fails() {
    let tempdir = TempDir::new().unwrap();
    paper_vis(tempdir.path()).assert().failure();
}

#[test]
fn test_binary_rejects_non_pdf_without_contacting_service() {
    let tempdir = TempDir::new().unwrap();
    let notes = write_file(&tempdir, "notes.txt", b"plain text");

    // Unroutable base URL: any network attempt would surface as a network error.
    paper_vis(tempdir.path())
        .args(["--base-url", "http://127.0.0.1:9", "analyze"])
        .arg(&notes)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please select a PDF file"));
}

#[test]
fn test_binary_json_output_for_failure() {
    let tempdir = TempDir::new().unwrap();
    let notes = write_file(&tempdir, "notes.txt", b"plain text");

    let assert = paper_vis(tempdir.path())
        .args(["-q", "--base-url", "http://127.0.0.1:9", "analyze", "--json"])
        .arg(&notes)
        .assert()
        .failure();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let envelope: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(envelope["success"], json!(false));
    assert_eq!(envelope["error"], json!("Please select a PDF file"));
    assert_eq!(envelope["metadata"], serde_json::Value::Null);
}

#[test]
fn test_binary_invalid_base_url_fails() {
    let tempdir = TempDir::new().unwrap();
    paper_vis(tempdir.path())
        .args(["--base-url", "ftp://files.example", "health"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid service configuration"));
}

#[test]
fn test_binary_unknown_config_key_fails() {
    let tempdir = TempDir::new().unwrap();
    let config_dir = tempdir.path().join("paper-vis");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "retries = 3\n").unwrap();

    paper_vis(tempdir.path())
        .arg("health")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));
}

#[tokio::test]
async fn test_binary_analyze_prints_summary() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("POST"))
        .and(path("/paper_vis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "metadata": {"title": "T", "authors": ["A", "B"]},
            "total_time": 12.3,
            "lanes": {"l1": {}},
            "figure_map": {"g": [1, 2, 3]}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let tempdir = TempDir::new().unwrap();
    let paper = write_file(&tempdir, "paper.pdf", b"%PDF-1.4 test");

    paper_vis(tempdir.path())
        .args(["--base-url", &mock_server.uri(), "analyze"])
        .arg(&paper)
        .assert()
        .success()
        .stdout(predicate::str::contains("Title:    T"))
        .stdout(predicate::str::contains("Authors:  A, B"))
        .stdout(predicate::str::contains("Lanes:    1"))
        .stdout(predicate::str::contains("Figures:  3"));
}

#[tokio::test]
async fn test_binary_analyze_reports_service_failure() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("POST"))
        .and(path("/paper_vis"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "error": "encrypted PDF"})),
        )
        .mount(&mock_server)
        .await;

    let tempdir = TempDir::new().unwrap();
    let paper = write_file(&tempdir, "paper.pdf", b"%PDF-1.4 test");

    let assert = paper_vis(tempdir.path())
        .args(["--base-url", &mock_server.uri(), "analyze"])
        .arg(&paper)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Analysis failed: encrypted PDF"));
    assert_eq!(assert.get_output().status.code(), Some(1));
}

#[tokio::test]
async fn test_binary_health_reports_available() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("OPTIONS"))
        .and(path("/paper_vis"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&mock_server)
        .await;

    let tempdir = TempDir::new().unwrap();
    paper_vis(tempdir.path())
        .env("PAPER_VIS_BASE_URL", mock_server.uri())
        .arg("health")
        .assert()
        .success()
        .stdout(predicate::str::contains("available"));
}

#[tokio::test]
async fn test_binary_health_reports_unavailable() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("OPTIONS"))
        .and(path("/paper_vis"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;

    let tempdir = TempDir::new().unwrap();
    paper_vis(tempdir.path())
        .args(["--base-url", &mock_server.uri(), "health"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unavailable"));
}

#[tokio::test]
async fn test_binary_cli_base_url_beats_config_file() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("OPTIONS"))
        .and(path("/paper_vis"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let tempdir = TempDir::new().unwrap();
    let config_dir = tempdir.path().join("paper-vis");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        "base_url = \"http://127.0.0.1:9\"\nprobe_timeout_secs = 2\n",
    )
    .unwrap();

    paper_vis(tempdir.path())
        .args(["--base-url", &mock_server.uri(), "health"])
        .assert()
        .success();
}

#[tokio::test]
async fn test_binary_cli_profile_beats_env_base_url() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("OPTIONS"))
        .and(path("/api/paper_vis"))
        .respond_with(ResponseTemplate::new(405))
        .expect(1)
        .mount(&mock_server)
        .await;

    let tempdir = TempDir::new().unwrap();
    paper_vis(tempdir.path())
        .env("PAPER_VIS_BASE_URL", "http://127.0.0.1:9")
        .env("PAPER_VIS_DEV_ORIGIN", mock_server.uri())
        .args(["--profile", "development", "health"])
        .assert()
        .success()
        .stdout(predicate::str::contains("available"));
}

#[tokio::test]
async fn test_binary_legacy_analyze_prints_response() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("POST"))
        .and(path("/analyze"))
        .and(body_json(json!({"folder_id": "f-7"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "started"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let tempdir = TempDir::new().unwrap();
    paper_vis(tempdir.path())
        .args(["--base-url", &mock_server.uri(), "legacy", "analyze", "f-7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"started\""));
}
