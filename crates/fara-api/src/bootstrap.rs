//! Process bootstrap: wires every component together and serves. Kept
//! separate from `fara-cli::main` so the CLI stays a thin dispatcher
//! (SPEC_FULL §2).

use std::sync::Arc;

use fara_core::{Action, Decision, RiskLevel, Status};
use fara_executor::{ExecutorRegistry, ShellExecutor};
use fara_policy::PolicyEngine;
use fara_storage::get_store;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::coordinator::Coordinator;
use crate::event_bus::EventBus;
use crate::routes::build_router;
use crate::settings::Settings;
use crate::state::AppState;

pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let store = get_store(&settings.db_backend, &settings.sqlite_path, &settings.postgres_dsn).await;

    let policy = Arc::new(PolicyEngine::from_file(std::path::Path::new(&settings.policy_file))?);

    let mut registry = ExecutorRegistry::new(settings.action_timeout);
    registry.register("shell", Arc::new(ShellExecutor));
    let executors = Arc::new(registry);

    let event_bus = Arc::new(EventBus::new(store.clone()));
    let coordinator = Arc::new(Coordinator::new(store.clone(), policy.clone(), executors, event_bus.clone()));

    if settings.demo {
        seed_demo_actions(store.as_ref()).await?;
    }

    let prometheus_handle = PrometheusBuilder::new().install_recorder()?;

    let state = AppState {
        coordinator,
        policy,
        event_bus,
        auth_token: settings.auth_token.clone(),
        policy_file: settings.policy_file.clone(),
        prometheus_handle,
    };

    let app = build_router(state, settings.enable_cors);

    let addr = format!("{}:{}", settings.api_host, settings.api_port);
    tracing::info!(%addr, "starting fara-api");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Seed a handful of demo actions on an empty store (spec SPEC_FULL §4.1,
/// grounded in `original_source/.../main.py:_seed_demo_actions`).
pub async fn seed_demo_actions(store: &dyn fara_storage::ActionStore) -> anyhow::Result<()> {
    if store.count_actions().await? > 0 {
        return Ok(());
    }

    let mut denied = Action::new(
        "demo",
        "http",
        "delete",
        serde_json::json!({"url": "https://example.com/api/users/123"}).as_object().unwrap().clone(),
        serde_json::json!({"demo": true}).as_object().unwrap().clone(),
    );
    denied.decision = Some(Decision::Deny);
    denied.status = Status::Denied;
    denied.reason = Some("demo seed".to_string());
    denied.risk_level = RiskLevel::High;

    let mut allowed = Action::new(
        "demo",
        "http",
        "get",
        serde_json::json!({"url": "https://api.example.com/data"}).as_object().unwrap().clone(),
        serde_json::json!({"demo": true}).as_object().unwrap().clone(),
    );
    allowed.decision = Some(Decision::Allow);
    allowed.status = Status::Allowed;
    allowed.reason = Some("demo seed".to_string());
    allowed.risk_level = RiskLevel::Low;

    let mut pending_approval = Action::new(
        "demo",
        "shell",
        "run",
        serde_json::json!({"cmd": "rm -rf /tmp/test"}).as_object().unwrap().clone(),
        serde_json::json!({"demo": true}).as_object().unwrap().clone(),
    );
    pending_approval.decision = Some(Decision::RequireApproval);
    pending_approval.status = Status::PendingApproval;
    pending_approval.reason = Some("demo seed".to_string());
    pending_approval.risk_level = RiskLevel::High;
    pending_approval.approval_token = Some(crate::approval::mint_token());

    let mut approved = Action::new(
        "demo",
        "shell",
        "run",
        serde_json::json!({"cmd": "echo 'Hello from fara'"}).as_object().unwrap().clone(),
        serde_json::json!({"demo": true}).as_object().unwrap().clone(),
    );
    approved.decision = Some(Decision::Allow);
    approved.status = Status::Approved;
    approved.reason = Some("demo seed".to_string());
    approved.risk_level = RiskLevel::Medium;

    let mut succeeded = Action::new(
        "demo",
        "http",
        "post",
        serde_json::json!({"url": "https://api.example.com/webhook", "data": {"event": "test"}})
            .as_object()
            .unwrap()
            .clone(),
        serde_json::json!({"demo": true}).as_object().unwrap().clone(),
    );
    succeeded.decision = Some(Decision::Allow);
    succeeded.status = Status::Succeeded;
    succeeded.reason = Some("demo seed".to_string());
    succeeded.risk_level = RiskLevel::Low;

    store.seed_demo_actions(&[denied, allowed, pending_approval, approved, succeeded]).await?;
    Ok(())
}
