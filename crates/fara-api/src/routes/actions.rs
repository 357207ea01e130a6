//! `/v1/actions*` (spec §6).

use axum::extract::{Path, Query, State};
use axum::Json;
use fara_core::{Action, Decision, RiskLevel, Status};
use fara_storage::ActionFilters;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// The public action representation (spec §6: "Action object fields").
/// `approval_token` is present here but stripped by `list_actions`.
#[derive(Debug, Serialize)]
pub struct ActionDto {
    pub id: String,
    pub agent_id: String,
    pub tool: String,
    pub operation: String,
    pub params: Map<String, Value>,
    pub context: Map<String, Value>,
    pub status: Status,
    pub decision: Option<Decision>,
    pub reason: Option<String>,
    pub risk_level: RiskLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_token: Option<String>,
    pub policy_version: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Action> for ActionDto {
    fn from(a: Action) -> Self {
        Self {
            id: a.id,
            agent_id: a.agent_id,
            tool: a.tool,
            operation: a.operation,
            params: a.params,
            context: a.context,
            status: a.status,
            decision: a.decision,
            reason: a.reason,
            risk_level: a.risk_level,
            approval_token: a.approval_token,
            policy_version: a.policy_version,
            created_at: a.created_at.to_rfc3339(),
            updated_at: a.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitActionRequest {
    pub agent_id: String,
    pub tool: String,
    pub operation: String,
    pub params: Map<String, Value>,
    #[serde(default)]
    pub context: Map<String, Value>,
}

pub async fn submit_action(
    State(state): State<AppState>,
    Json(req): Json<SubmitActionRequest>,
) -> Result<Json<ActionDto>, ApiError> {
    let action = state
        .coordinator
        .submit(req.agent_id, req.tool, req.operation, req.params, req.context)
        .await?;
    Ok(Json(action.into()))
}

pub async fn get_action(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<ActionDto>, ApiError> {
    let action = state
        .coordinator
        .store()
        .get_action(&id)
        .await?
        .ok_or_else(|| fara_core::GovernorError::ActionNotFound(id.clone()))?;
    Ok(Json(action.into()))
}

#[derive(Debug, Deserialize)]
pub struct ListActionsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub agent_id: Option<String>,
    pub tool: Option<String>,
    pub status: Option<Status>,
}

fn default_limit() -> i64 {
    20
}

pub async fn list_actions(
    State(state): State<AppState>,
    Query(query): Query<ListActionsQuery>,
) -> Result<Json<Vec<ActionDto>>, ApiError> {
    let filters = ActionFilters { agent_id: query.agent_id, tool: query.tool, status: query.status };
    let actions = state.coordinator.store().list_actions(query.limit, query.offset, filters).await?;
    let mut dtos: Vec<ActionDto> = actions.into_iter().map(Into::into).collect();
    for dto in &mut dtos {
        dto.approval_token = None;
    }
    Ok(Json(dtos))
}

#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    pub token: String,
    pub approve: bool,
    pub reason: Option<String>,
}

pub async fn approve_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ApprovalRequest>,
) -> Result<Json<ActionDto>, ApiError> {
    let action = state.coordinator.approve(&id, &req.token, req.approve, req.reason).await?;
    Ok(Json(action.into()))
}

pub async fn start_action(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<ActionDto>, ApiError> {
    let action = state.coordinator.start(&id).await?;
    Ok(Json(action.into()))
}

#[derive(Debug, Deserialize)]
pub struct ResultRequest {
    pub success: bool,
    pub error: Option<String>,
}

pub async fn record_result(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ResultRequest>,
) -> Result<Json<ActionDto>, ApiError> {
    let action = state.coordinator.record_result(&id, req.success, req.error).await?;
    Ok(Json(action.into()))
}

pub async fn replay_action(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<ActionDto>, ApiError> {
    let action = state.coordinator.replay(&id).await?;
    Ok(Json(action.into()))
}

pub async fn get_action_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<fara_core::ActionEvent>>, ApiError> {
    state
        .coordinator
        .store()
        .get_action(&id)
        .await?
        .ok_or_else(|| fara_core::GovernorError::ActionNotFound(id.clone()))?;
    let events = state.event_bus.events_for(&id).await?;
    Ok(Json(events))
}
