//! `GET /v1/policy/info` (spec §6, `[ADDED]` `policy_path` per SPEC_FULL).

use std::path::Path as FsPath;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn policy_info(State(state): State<AppState>) -> impl IntoResponse {
    let path = FsPath::new(&state.policy_file);
    let exists = path.exists();
    let resolved = path
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_default().join(path));

    Json(json!({
        "policy_file": state.policy_file,
        "policy_path": resolved.display().to_string(),
        "exists": exists,
        "policy_version": if exists { Some(state.policy.policy_version()) } else { None },
    }))
}
