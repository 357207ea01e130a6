//! `POST /playground/eval` (`[ADDED]`, spec SPEC_FULL §6): evaluate policy
//! for a hypothetical action without creating one or touching storage.
//! Pure DX tool over the same `PolicyEngine::evaluate` the Coordinator uses.

use axum::extract::State;
use axum::Json;
use fara_core::Decision;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PlaygroundRequest {
    pub agent_id: String,
    pub tool: String,
    pub operation: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub context: Map<String, Value>,
}

pub async fn playground_eval(State(state): State<AppState>, Json(req): Json<PlaygroundRequest>) -> Json<Value> {
    let mut context = req.context;
    context.insert("agent_id".to_string(), Value::String(req.agent_id.clone()));

    let (decision, reason, risk_level) = state.policy.evaluate(&req.tool, &req.operation, &req.params, &context);

    let status = match decision {
        Decision::Allow => "allowed",
        Decision::Deny => "denied",
        Decision::RequireApproval => "pending_approval",
    };

    Json(json!({
        "status": status,
        "decision": decision,
        "reason": reason,
        "risk_level": risk_level,
        "agent_id": req.agent_id,
        "tool": req.tool,
        "operation": req.operation,
    }))
}
