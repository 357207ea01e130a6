//! Integration tests for the assembled router (spec §8's end-to-end
//! scenarios plus the concurrent-approval race), grounded in
//! `momentum-sez-stack`'s own `tower::ServiceExt::oneshot` router-test
//! style (`mez/crates/mez-api/tests/integration_tests.rs`).

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use fara_api::{AppState, Coordinator, EventBus};
use fara_executor::ExecutorRegistry;
use fara_policy::PolicyEngine;
use fara_storage::SqliteStore;

const POLICY: &str = r#"
risk:
  rules:
    - when: { tool: "shell", pattern: "rm -rf" }
      risk_level: high

rules:
  - match: { tool: "http", op: "get" }
    allow: true
  - match: { tool: "shell" }
    require_approval: true
  - match: {}
    deny: true
"#;

async fn test_state() -> AppState {
    let path = std::env::temp_dir().join(format!("fara-http-test-{}.db", uuid::Uuid::new_v4()));
    let store = Arc::new(SqliteStore::connect(path.to_str().unwrap()).await.unwrap());
    let policy = Arc::new(PolicyEngine::load(POLICY).unwrap());
    let executors = Arc::new(ExecutorRegistry::new(30));
    let event_bus = Arc::new(EventBus::new(store.clone()));
    let coordinator = Arc::new(Coordinator::new(store, policy.clone(), executors, event_bus.clone()));
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder().handle();

    AppState {
        coordinator,
        policy,
        event_bus,
        auth_token: None,
        policy_file: "policies/default.yaml".to_string(),
        prometheus_handle,
    }
}

fn app(state: AppState) -> axum::Router {
    fara_api::routes::build_router(state, false)
}

async fn body_json(response: axum::http::Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_and_ready_are_reachable() {
    let app = app(test_state().await);
    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.oneshot(get("/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn allowed_action_goes_straight_to_allowed() {
    let app = app(test_state().await);
    let response = app
        .oneshot(post(
            "/v1/actions",
            json!({"agent_id": "a1", "tool": "http", "operation": "get", "params": {"url": "https://x"}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "allowed");
    assert_eq!(body["decision"], "allow");
    assert!(body.get("approval_token").is_none());
}

#[tokio::test]
async fn denied_action_is_denied_with_no_approval_token() {
    let app = app(test_state().await);
    let response = app
        .oneshot(post(
            "/v1/actions",
            json!({"agent_id": "a1", "tool": "carrier-pigeon", "operation": "send", "params": {}}),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["status"], "denied");
    assert_eq!(body["decision"], "deny");
}

#[tokio::test]
async fn shell_submission_requires_approval_then_can_be_approved_and_started() {
    let app = app(test_state().await);

    let submit = app
        .clone()
        .oneshot(post(
            "/v1/actions",
            json!({"agent_id": "a1", "tool": "shell", "operation": "run", "params": {"cmd": "echo hi"}}),
        ))
        .await
        .unwrap();
    let action = body_json(submit).await;
    assert_eq!(action["status"], "pending_approval");
    let token = action["approval_token"].as_str().unwrap().to_string();
    let id = action["id"].as_str().unwrap().to_string();

    let approve = app
        .clone()
        .oneshot(post(&format!("/v1/actions/{id}/approval"), json!({"token": token, "approve": true})))
        .await
        .unwrap();
    let approved = body_json(approve).await;
    assert_eq!(approved["status"], "approved");
    assert!(approved.get("approval_token").map(|v| v.is_null()).unwrap_or(true));

    let start = app.clone().oneshot(post(&format!("/v1/actions/{id}/start"), json!({}))).await.unwrap();
    let started = body_json(start).await;
    assert_eq!(started["status"], "executing");

    let fetched = app.oneshot(get(&format!("/v1/actions/{id}"))).await.unwrap();
    assert_eq!(fetched.status(), StatusCode::OK);
}

#[tokio::test]
async fn wrong_approval_token_is_rejected() {
    let app = app(test_state().await);
    let submit = app
        .clone()
        .oneshot(post(
            "/v1/actions",
            json!({"agent_id": "a1", "tool": "shell", "operation": "run", "params": {"cmd": "echo hi"}}),
        ))
        .await
        .unwrap();
    let action = body_json(submit).await;
    let id = action["id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(post(&format!("/v1/actions/{id}/approval"), json!({"token": "not-the-token", "approve": true})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn concurrent_approvals_on_the_same_action_only_one_wins() {
    let app = app(test_state().await);
    let submit = app
        .clone()
        .oneshot(post(
            "/v1/actions",
            json!({"agent_id": "a1", "tool": "shell", "operation": "run", "params": {"cmd": "echo hi"}}),
        ))
        .await
        .unwrap();
    let action = body_json(submit).await;
    let token = action["approval_token"].as_str().unwrap().to_string();
    let id = action["id"].as_str().unwrap().to_string();

    let req_a = post(&format!("/v1/actions/{id}/approval"), json!({"token": token, "approve": true}));
    let req_b = post(&format!("/v1/actions/{id}/approval"), json!({"token": token, "approve": false}));

    let (res_a, res_b) = tokio::join!(app.clone().oneshot(req_a), app.oneshot(req_b));
    let statuses = [res_a.unwrap().status(), res_b.unwrap().status()];

    // Exactly one approval call wins the optimistic-concurrency race and
    // commits; the other loses its CAS write, retries, observes the
    // action is no longer pending_approval, and is rejected as
    // not-executable rather than silently double-applying the decision.
    let ok_count = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    let rejected_count = statuses.iter().filter(|s| **s == StatusCode::BAD_REQUEST).count();
    assert_eq!(ok_count, 1);
    assert_eq!(rejected_count, 1);
}

#[tokio::test]
async fn replay_carries_over_context_and_overwrites_replayed_from() {
    let app = app(test_state().await);
    let submit = app
        .clone()
        .oneshot(post(
            "/v1/actions",
            json!({
                "agent_id": "a1",
                "tool": "http",
                "operation": "get",
                "params": {"url": "https://x"},
                "context": {"trace_id": "abc123"},
            }),
        ))
        .await
        .unwrap();
    let original = body_json(submit).await;
    let id = original["id"].as_str().unwrap().to_string();

    let replay = app.oneshot(post(&format!("/v1/actions/{id}/replay"), json!({}))).await.unwrap();
    let replayed = body_json(replay).await;
    assert_ne!(replayed["id"], original["id"]);
    assert_eq!(replayed["context"]["trace_id"], "abc123");
    assert_eq!(replayed["context"]["replayed_from"], id);
}

#[tokio::test]
async fn list_actions_strips_approval_tokens() {
    let app = app(test_state().await);
    app.clone()
        .oneshot(post(
            "/v1/actions",
            json!({"agent_id": "a1", "tool": "shell", "operation": "run", "params": {"cmd": "echo hi"}}),
        ))
        .await
        .unwrap();

    let response = app.oneshot(get("/v1/actions")).await.unwrap();
    let body = body_json(response).await;
    let list = body.as_array().unwrap();
    assert!(!list.is_empty());
    for action in list {
        assert!(action.get("approval_token").is_none());
    }
}

#[tokio::test]
async fn policy_info_reports_version_when_loaded_directly() {
    let app = app(test_state().await);
    let response = app.oneshot(get("/v1/policy/info")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["policy_file"].is_string());
}

#[tokio::test]
async fn auth_rejects_missing_bearer_token_when_configured() {
    let mut state = test_state().await;
    state.auth_token = Some("secret".to_string());
    let app = app(state);

    let response = app
        .oneshot(post(
            "/v1/actions",
            json!({"agent_id": "a1", "tool": "http", "operation": "get", "params": {}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn auth_allows_health_without_a_token_when_configured() {
    let mut state = test_state().await;
    state.auth_token = Some("secret".to_string());
    let app = app(state);

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
