#![allow(clippy::unwrap_used)]
// End-to-end tests for `PassManager` against a wiremock backend.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use gatepass_core::lifecycle::{PassPayload, parse_instant};
use gatepass_core::{
    ClientConfig, ConnectionState, CoreError, ManualClock, PassId, PassManager, Role, UserContext, VisitorPass,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn t0() -> DateTime<Utc> {
    parse_instant("2024-01-01T00:00:00Z").unwrap()
}

fn config(server: &MockServer, role: Role) -> ClientConfig {
    let mut cfg = ClientConfig::new(
        Url::parse(&server.uri()).unwrap(),
        SecretString::from("test-token".to_string()),
        UserContext::with_role(role),
    );
    cfg.refresh_interval_secs = 0;
    cfg
}

async fn connected(server: &MockServer, role: Role) -> (PassManager, ManualClock) {
    let clock = ManualClock::new(t0());
    let manager = PassManager::with_clock(config(server, role), Arc::new(clock.clone()));
    manager.connect().await.unwrap();
    (manager, clock)
}

/// Answers a create call by echoing the submitted pass with a backend id.
struct EchoPass;

impl Respond for EchoPass {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        ResponseTemplate::new(201).set_body_json(json!({
            "pass": {
                "_id": "pass-001",
                "code": body["code"],
                "visitorName": body["visitorName"],
                "expiresAt": body["expiresAt"],
                "status": "active"
            }
        }))
    }
}

// ── Create ──────────────────────────────────────────────────────────

#[tokio::test]
async fn create_pass_registers_and_holds_the_pass() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/visitor-passes"))
        .respond_with(EchoPass)
        .expect(1)
        .mount(&server)
        .await;

    let (manager, _clock) = connected(&server, Role::Resident).await;
    let pass = manager.create_pass(Some("  ".into())).await.unwrap();

    assert_eq!(pass.id, PassId::from("pass-001"));
    assert_eq!(pass.visitor_name, "Visitor");
    assert_eq!(pass.code.len(), 6);
    assert_eq!(pass.expires_at, Some(t0() + TimeDelta::seconds(1800)));
    assert_eq!(manager.active_passes().len(), 1);

    let sent: Value = serde_json::from_slice(&server.received_requests().await.unwrap()[0].body).unwrap();
    assert_eq!(sent["expiresAt"], "2024-01-01T00:30:00Z");
    let payload = PassPayload::decode(sent["qrData"].as_str().unwrap()).unwrap();
    assert_eq!(payload.code, pass.code);
    assert_eq!(payload.validity_duration, 1800);

    manager.disconnect().await;
}

#[tokio::test]
async fn create_pass_without_backend_pass_is_not_held() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/visitor-passes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "limit reached" })))
        .mount(&server)
        .await;

    let (manager, _clock) = connected(&server, Role::Resident).await;
    let err = manager.create_pass(None).await.unwrap_err();

    assert!(err.to_string().contains("limit reached"), "got: {err}");
    assert!(manager.store().is_empty());
    manager.disconnect().await;
}

// ── Cancel ──────────────────────────────────────────────────────────

#[tokio::test]
async fn cancel_removes_locally_even_when_backend_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/visitor-passes/pass-9/cancel"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })))
        .expect(1)
        .mount(&server)
        .await;

    let (manager, _clock) = connected(&server, Role::Resident).await;
    let mut pass = VisitorPass::draft("K7P2QX", Some("Asha"), t0()).unwrap();
    pass.id = PassId::from("pass-9");
    manager.store().insert(pass);

    let (removed, confirmed) = manager.cancel_pass("k7p2qx").await.unwrap();

    assert_eq!(removed.unwrap().code, "K7P2QX");
    assert!(!confirmed);
    assert!(manager.store().is_empty());
    assert!(manager.store().is_cancelled(&PassId::from("pass-9")));
    manager.disconnect().await;
}

#[tokio::test]
async fn cancel_unknown_remote_id_still_calls_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/visitor-passes/abc123/cancel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "cancelled" })))
        .expect(1)
        .mount(&server)
        .await;

    let (manager, _clock) = connected(&server, Role::Resident).await;
    let (removed, confirmed) = manager.cancel_pass("abc123").await.unwrap();

    assert!(removed.is_none());
    assert!(confirmed);
    manager.disconnect().await;
}

// ── Verify ──────────────────────────────────────────────────────────

#[tokio::test]
async fn residents_cannot_verify() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/visitor-passes/verify"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (manager, _clock) = connected(&server, Role::Resident).await;
    let err = manager.verify_pass("K7P2QX").await.unwrap_err();

    assert!(matches!(err, CoreError::Unsupported { .. }));
    manager.disconnect().await;
}

#[tokio::test]
async fn watchman_verify_sends_normalized_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/visitor-passes/verify"))
        .and(body_json(json!({ "code": "K7P2QX" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid": true,
            "message": "Pass is valid",
            "timeRemaining": 420,
            "pass": { "_id": "pass-001", "code": "K7P2QX", "visitorName": "Asha" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (manager, _clock) = connected(&server, Role::Watchman).await;
    let v = manager.verify_pass(" k7p2-qx ").await.unwrap();

    assert!(v.valid);
    assert_eq!(v.effective_remaining(manager.now()), 420);
    assert_eq!(v.countdown(manager.now()).display, "07:00");
    manager.disconnect().await;
}

#[tokio::test]
async fn reconnect_after_disconnect_restarts_tasks_and_commands() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/visitor-passes/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid": true,
            "timeRemaining": 600
        })))
        .expect(2)
        .mount(&server)
        .await;

    let (manager, clock) = connected(&server, Role::Watchman).await;
    assert!(manager.verify_pass("K7P2QX").await.unwrap().valid);
    manager.disconnect().await;
    assert_eq!(*manager.connection_state().borrow(), ConnectionState::Disconnected);
    assert!(matches!(
        manager.verify_pass("K7P2QX").await,
        Err(CoreError::NotConnected)
    ));

    let mut ticks = manager.ticks();
    manager.connect().await.unwrap();
    assert_eq!(*manager.connection_state().borrow(), ConnectionState::Connected);

    clock.advance(TimeDelta::seconds(1));
    let tick = tokio::time::timeout(Duration::from_millis(2500), ticks.next())
        .await
        .expect("ticker runs again after reconnect");
    assert!(tick.is_some());

    assert!(manager.verify_pass("K7P2QX").await.unwrap().valid);
    manager.disconnect().await;
}

#[tokio::test]
async fn verify_rejects_codes_outside_the_alphabet() {
    let server = MockServer::start().await;
    let (manager, _clock) = connected(&server, Role::Admin).await;

    let err = manager.verify_pass("O0I1").await.unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailed { .. }));
    manager.disconnect().await;
}

// ── Refresh & lifecycle ─────────────────────────────────────────────

#[tokio::test]
async fn connect_with_refresh_reconciles_server_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/visitor-passes"))
        .and(query_param("status", "active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "passes": [
                { "_id": "a", "code": "AAAAAA", "expiresAt": "2024-01-01T00:20:00Z" },
                { "_id": "b", "code": "BBBBBB", "expiresAt": "2024-01-01T00:10:00Z" },
                { "_id": "c", "code": "CCCCCC", "expiresAt": "garbage" }
            ]
        })))
        .mount(&server)
        .await;

    let mut cfg = config(&server, Role::Resident);
    cfg.refresh_interval_secs = 300;
    let manager = PassManager::with_clock(cfg, Arc::new(ManualClock::new(t0())));
    manager.connect().await.unwrap();

    let codes: Vec<_> = manager.active_passes().iter().map(|p| p.code.clone()).collect();
    assert_eq!(codes, ["BBBBBB", "AAAAAA"]);
    manager.disconnect().await;
}

#[tokio::test]
async fn connect_fails_when_initial_refresh_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/visitor-passes"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "jwt expired" })))
        .mount(&server)
        .await;

    let mut cfg = config(&server, Role::Resident);
    cfg.refresh_interval_secs = 60;
    let manager = PassManager::new(cfg);

    let err = manager.connect().await.unwrap_err();
    assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn commands_require_a_connection() {
    let server = MockServer::start().await;
    let manager = PassManager::new(config(&server, Role::Resident));
    let err = manager.create_pass(None).await.unwrap_err();
    assert!(matches!(err, CoreError::NotConnected));
}

#[tokio::test(start_paused = true)]
async fn sweep_task_drops_expired_passes() {
    let url = Url::parse("http://127.0.0.1:9").unwrap();
    let cfg = {
        let mut cfg = ClientConfig::new(
            url,
            SecretString::from("t".to_string()),
            UserContext::default(),
        );
        cfg.refresh_interval_secs = 0;
        cfg
    };
    let clock = ManualClock::new(t0());
    let manager = PassManager::with_clock(cfg, Arc::new(clock.clone()));
    manager.connect().await.unwrap();

    manager
        .store()
        .insert(VisitorPass::draft("K7P2QX", None, t0()).unwrap());
    clock.advance(TimeDelta::minutes(31));

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert!(manager.store().is_empty());

    manager.disconnect().await;
}

#[tokio::test]
async fn oneshot_connects_and_disconnects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/visitor-passes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let mut cfg = config(&server, Role::Resident);
    cfg.refresh_interval_secs = 120;

    let report = PassManager::oneshot(cfg, |m| async move { m.refresh().await })
        .await
        .unwrap();
    assert_eq!(report.upserted, 0);
}
