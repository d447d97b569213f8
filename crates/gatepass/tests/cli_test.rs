//! Integration tests for the `gatepass` CLI binary.
//!
//! Argument parsing, help, completions, and error exit codes run without a
//! backend; the pass and verify flows run against a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `gatepass` binary with env isolation.
///
/// Clears all `GATEPASS_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn gatepass_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("gatepass");
    cmd.env("HOME", "/tmp/gatepass-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/gatepass-cli-test-nonexistent")
        .env_remove("RUST_LOG")
        .env_remove("GATEPASS_PROFILE")
        .env_remove("GATEPASS_SERVER")
        .env_remove("GATEPASS_TOKEN")
        .env_remove("GATEPASS_ROLE")
        .env_remove("GATEPASS_OUTPUT")
        .env_remove("GATEPASS_INSECURE")
        .env_remove("GATEPASS_TIMEOUT");
    cmd
}

/// `gatepass` pointed at a mock backend with an explicit token.
fn against(server: &MockServer) -> assert_cmd::Command {
    let mut cmd = gatepass_cmd();
    cmd.args(["--server", &server.uri(), "--token", "test-token"]);
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = gatepass_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    gatepass_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("visitor passes")
            .and(predicate::str::contains("pass"))
            .and(predicate::str::contains("verify"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    gatepass_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gatepass"));
}

#[test]
fn test_pass_help_lists_subcommands() {
    gatepass_cmd().args(["pass", "--help"]).assert().success().stdout(
        predicate::str::contains("create")
            .and(predicate::str::contains("cancel"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("qr")),
    );
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    gatepass_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gatepass"));
}

#[test]
fn test_completions_invalid_shell() {
    gatepass_cmd()
        .args(["completions", "tcsh"])
        .assert()
        .failure()
        .code(2);
}

// ── Argument validation ─────────────────────────────────────────────

#[test]
fn test_invalid_output_format() {
    gatepass_cmd()
        .args(["-o", "xml", "pass", "list"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("xml"));
}

#[test]
fn test_invalid_role() {
    gatepass_cmd()
        .args(["--role", "janitor", "verify", "K7P2QX"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_missing_server_is_usage_error() {
    let output = gatepass_cmd().args(["pass", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("No server configured"), "got:\n{text}");
}

#[test]
fn test_unknown_profile() {
    gatepass_cmd()
        .args(["--profile", "nope", "--server", "https://gate.example.com"])
        .args(["pass", "list"])
        .assert()
        .failure()
        .code(4);
}

#[test]
fn test_config_use_unknown_profile() {
    gatepass_cmd()
        .args(["config", "use", "ghost"])
        .assert()
        .failure()
        .code(4);
}

// ── Config file handling ────────────────────────────────────────────

#[cfg(target_os = "linux")]
const MALFORMED_CONFIG: &str = "default_profile = \"home\"\n[profiles.home\nserver = 1\n";

/// `gatepass` with its config home in `dir`, holding a config that does not parse.
#[cfg(target_os = "linux")]
fn with_malformed_config(dir: &std::path::Path) -> (assert_cmd::Command, std::path::PathBuf) {
    let config_dir = dir.join("gatepass");
    std::fs::create_dir_all(&config_dir).unwrap();
    let file = config_dir.join("config.toml");
    std::fs::write(&file, MALFORMED_CONFIG).unwrap();

    let mut cmd = gatepass_cmd();
    cmd.env("HOME", dir).env("XDG_CONFIG_HOME", dir);
    (cmd, file)
}

#[cfg(target_os = "linux")]
#[test]
fn test_malformed_config_is_reported_not_replaced() {
    let dir = tempfile::tempdir().unwrap();

    let (mut cmd, _) = with_malformed_config(dir.path());
    let output = cmd
        .args(["--server", "https://gate.example.com", "--token", "t", "pass", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(text.contains("config loading failed"), "got:\n{text}");
    assert!(!text.contains("No server configured"), "got:\n{text}");

    let (mut cmd, file) = with_malformed_config(dir.path());
    cmd.args(["config", "use", "home"]).assert().failure().code(1);
    assert_eq!(std::fs::read_to_string(file).unwrap(), MALFORMED_CONFIG);
}

// ── Backend-bound flows ─────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_pass_create_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/visitor-passes"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(|req: &Request| {
            let body: Value = serde_json::from_slice(&req.body).unwrap();
            ResponseTemplate::new(201).set_body_json(json!({
                "pass": {
                    "_id": "pass-42",
                    "code": body["code"],
                    "visitorName": body["visitorName"],
                    "createdAt": body["createdAt"],
                    "expiresAt": body["expiresAt"],
                    "status": "active"
                }
            }))
        })
        .expect(1)
        .mount(&server)
        .await;

    let output = against(&server)
        .args(["-o", "json", "pass", "create", "--name", "Asha"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let pass: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(pass["id"], "pass-42");
    assert_eq!(pass["visitorName"], "Asha");
    assert_eq!(pass["status"], "active");
    assert_eq!(pass["code"].as_str().unwrap().len(), 6);
    let remaining = pass["countdown"]["remaining_seconds"].as_u64().unwrap();
    assert!((1790..=1800).contains(&remaining), "remaining {remaining}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_pass_list_plain_prints_codes() {
    let server = MockServer::start().await;
    let expires = chrono::Utc::now() + chrono::TimeDelta::minutes(20);
    Mock::given(method("GET"))
        .and(path("/api/visitor-passes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "_id": "p1",
                "code": "K7P2QX",
                "visitorName": "Asha",
                "expiresAt": expires.to_rfc3339(),
                "status": "active"
            }
        ])))
        .mount(&server)
        .await;

    against(&server)
        .args(["-o", "plain", "pass", "list"])
        .assert()
        .success()
        .stdout(predicate::str::diff("K7P2QX\n"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancel_without_tty_requires_yes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/visitor-passes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/visitor-passes/p1/cancel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    against(&server)
        .args(["pass", "cancel", "p1"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--yes"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_verify_as_resident_is_refused_locally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/visitor-passes/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "valid": true })))
        .expect(0)
        .mount(&server)
        .await;

    against(&server)
        .args(["--role", "resident", "verify", "K7P2QX"])
        .assert()
        .failure()
        .code(5);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_verify_valid_and_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/visitor-passes/verify"))
        .and(body_json(json!({ "code": "K7P2QX" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid": true,
            "message": "Pass is valid",
            "timeRemaining": 754,
            "pass": { "_id": "p1", "code": "K7P2QX", "visitorName": "Asha", "status": "active" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/visitor-passes/verify"))
        .and(body_json(json!({ "code": "ZZZZZZ" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid": false,
            "message": "Pass has expired"
        })))
        .mount(&server)
        .await;

    against(&server)
        .args(["--role", "watchman", "--color", "never", "verify", "k7p2-qx"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("VALID")
                .and(predicate::str::contains("Asha"))
                .and(predicate::str::contains("12:34")),
        );

    against(&server)
        .args(["--role", "watchman", "verify", "ZZZZZZ"])
        .assert()
        .failure()
        .code(6)
        .stderr(predicate::str::contains("Pass has expired"));
}
