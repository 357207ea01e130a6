//! # Data Model — Action, ActionEvent, Decision, Status, RiskLevel
//!
//! The entities and invariants from spec §3. `tenant_id`/`project_id` are
//! intentionally absent — the original implementation this system was
//! distilled from carries them only for compatibility and documents them as
//! "ignored in core".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// The Policy Engine's verdict on a proposed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny,
    RequireApproval,
}

/// `low < medium < high`; a `RiskRule` match set takes the highest level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

/// The action lifecycle state machine (spec §4.3). Persisted as a plain
/// enum rather than a compile-time typestate: actions are loaded from
/// storage at arbitrary points in their lifecycle, so the legality of a
/// transition has to be checked at runtime against the action's current
/// value, not encoded as distinct Rust types per state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    PendingDecision,
    Allowed,
    Denied,
    PendingApproval,
    Approved,
    Executing,
    Succeeded,
    Failed,
    Timeout,
}

impl Status {
    /// Terminal statuses accept no further writes to `status`, `decision`,
    /// or `approval_token` (spec §3 invariant 6).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Denied | Status::Succeeded | Status::Failed | Status::Timeout)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_value(self).unwrap_or(Value::Null);
        match s {
            Value::String(s) => f.write_str(&s),
            _ => write!(f, "{self:?}"),
        }
    }
}

/// A single proposed side-effecting operation submitted by an agent, and
/// its complete lifecycle (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub agent_id: String,
    pub tool: String,
    pub operation: String,
    pub params: Map<String, Value>,
    pub context: Map<String, Value>,
    pub decision: Option<Decision>,
    pub status: Status,
    pub reason: Option<String>,
    pub risk_level: RiskLevel,
    /// Non-null iff `status == PendingApproval` (spec §3 invariant 2).
    pub approval_token: Option<String>,
    pub policy_version: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Monotonically increasing; used for optimistic concurrency control.
    pub version: i64,
}

impl Action {
    /// Build a freshly submitted action: `status = pending_decision`,
    /// `version = 0`, no decision yet.
    pub fn new(
        agent_id: impl Into<String>,
        tool: impl Into<String>,
        operation: impl Into<String>,
        params: Map<String, Value>,
        context: Map<String, Value>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            agent_id: agent_id.into(),
            tool: tool.into(),
            operation: operation.into(),
            params,
            context,
            decision: None,
            status: Status::PendingDecision,
            reason: None,
            risk_level: RiskLevel::Low,
            approval_token: None,
            policy_version: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }
}

/// One immutable entry in an action's ordered audit trail (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionEvent {
    pub id: String,
    pub action_id: String,
    pub event_type: String,
    pub meta: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    /// Tamper-evident mode only: hash of the previous event in this
    /// action's chain, or all-zero if this is the first event.
    pub prev_hash: Option<String>,
    /// Tamper-evident mode only: `H(prev_hash || canonical(event))`.
    pub record_hash: Option<String>,
}
