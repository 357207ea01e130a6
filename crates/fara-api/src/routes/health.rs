//! `/health`, `/ready`, `/metrics` (spec §6; public paths, spec §6 auth).

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "healthy"}))
}

pub async fn ready() -> impl IntoResponse {
    Json(json!({"status": "ready"}))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    state.prometheus_handle.render()
}
