//! The Lifecycle Coordinator (spec §4.3): the single point of state
//! mutation for an action. Every operation runs the same "optimistic
//! transaction" protocol — read, validate, produce the new state locally,
//! CAS-write, retry on conflict — and every successful transition emits
//! the matching event through the [`EventBus`], which never rolls back a
//! state change on a write failure.

use std::sync::Arc;

use async_trait::async_trait;
use fara_core::{transition::validate_transition, Action, Decision, GovernorError, Status};
use fara_executor::{ExecutionOutcome, ExecutionReporter, ExecutorRegistry};
use fara_policy::PolicyEngine;
use fara_storage::ActionStore;
use serde_json::{json, Map, Value};

use crate::approval::{mint_token, tokens_match};
use crate::event_bus::EventBus;

/// Optimistic-lock retries per spec §4.3 ("up to N times, N≥3").
const MAX_RETRIES: usize = 5;

pub struct Coordinator {
    store: Arc<dyn ActionStore>,
    policy: Arc<PolicyEngine>,
    executors: Arc<ExecutorRegistry>,
    event_bus: Arc<EventBus>,
}

impl Coordinator {
    pub fn new(
        store: Arc<dyn ActionStore>,
        policy: Arc<PolicyEngine>,
        executors: Arc<ExecutorRegistry>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self { store, policy, executors, event_bus }
    }

    pub fn store(&self) -> &Arc<dyn ActionStore> {
        &self.store
    }

    /// Run `mutate` against the current row, retrying on a lost CAS race.
    /// `mutate` receives the freshly read action and returns the action to
    /// persist, or an error to abort without a retry (e.g. illegal
    /// transition, unauthorized token).
    async fn transact(
        &self,
        action_id: &str,
        mutate: impl Fn(Action) -> Result<Action, GovernorError>,
    ) -> Result<Action, GovernorError> {
        for _ in 0..MAX_RETRIES {
            let current = self
                .store
                .get_action(action_id)
                .await?
                .ok_or_else(|| GovernorError::ActionNotFound(action_id.to_string()))?;
            let expected_version = current.version;
            let next = mutate(current)?;
            if self.store.update_action(&next, expected_version).await? {
                return Ok(next);
            }
            // lost the race against a concurrent writer; re-read and retry
        }
        Err(GovernorError::Conflict(action_id.to_string()))
    }

    pub async fn submit(
        &self,
        agent_id: String,
        tool: String,
        operation: String,
        params: Map<String, Value>,
        context: Map<String, Value>,
    ) -> Result<Action, GovernorError> {
        let (decision, reason, risk) = self.policy.evaluate(&tool, &operation, &params, &context);
        let policy_version = self.policy.policy_version();

        let mut action = Action::new(agent_id, tool, operation, params, context);
        action.decision = Some(decision);
        action.reason = Some(reason);
        action.risk_level = risk;
        action.policy_version = Some(policy_version);

        action.status = match decision {
            Decision::Allow if risk != fara_core::RiskLevel::High => Status::Allowed,
            Decision::Allow => {
                action.approval_token = Some(mint_token());
                Status::PendingApproval
            }
            Decision::RequireApproval => {
                action.approval_token = Some(mint_token());
                Status::PendingApproval
            }
            Decision::Deny => Status::Denied,
        };

        if !validate_transition(Status::PendingDecision, action.status) {
            return Err(GovernorError::Internal(format!(
                "policy evaluation produced an unreachable status {:?}",
                action.status
            )));
        }

        metrics::counter!(
            "fara_actions_submitted_total",
            "tool" => action.tool.clone(),
            "status" => action.status.to_string(),
        )
        .increment(1);
        let decision_latency = (action.updated_at - action.created_at).to_std().unwrap_or_default();
        metrics::histogram!(
            "fara_action_submit_to_response_seconds",
            "tool" => action.tool.clone(),
            "operation" => action.operation.clone(),
        )
        .record(decision_latency.as_secs_f64());

        self.store.create_action(&action).await?;
        self.event_bus
            .emit(&action.id, "created", json!({"decision": action.decision}).as_object().unwrap().clone())
            .await;
        self.event_bus
            .emit(
                &action.id,
                "decision_made",
                json!({"decision": action.decision, "reason": action.reason, "risk_level": action.risk_level})
                    .as_object()
                    .unwrap()
                    .clone(),
            )
            .await;
        Ok(action)
    }

    pub async fn approve(&self, action_id: &str, token: &str, approve: bool, reason: Option<String>) -> Result<Action, GovernorError> {
        let updated = self
            .transact(action_id, |current| {
                if current.status != Status::PendingApproval {
                    return Err(GovernorError::ActionNotExecutable { id: current.id.clone(), status: current.status });
                }
                match &current.approval_token {
                    Some(stored) if tokens_match(token, stored) => {}
                    _ => return Err(GovernorError::Unauthorized("invalid approval token".to_string())),
                }

                let mut next = current;
                next.approval_token = None;
                if approve {
                    next.status = Status::Approved;
                    next.decision = Some(Decision::Allow);
                    next.reason = Some(reason.clone().unwrap_or_else(|| "approved by human".to_string()));
                } else {
                    next.status = Status::Denied;
                    next.decision = Some(Decision::Deny);
                    next.reason = Some(reason.clone().unwrap_or_else(|| "denied by human".to_string()));
                }
                next.updated_at = chrono::Utc::now();
                Ok(next)
            })
            .await?;

        let event_type = if approve { "approved" } else { "denied" };
        self.event_bus.emit(&updated.id, event_type, Map::new()).await;
        Ok(updated)
    }

    pub async fn start(self: &Arc<Self>, action_id: &str) -> Result<Action, GovernorError> {
        let updated = self
            .transact(action_id, |current| {
                if !matches!(current.status, Status::Allowed | Status::Approved) {
                    return Err(GovernorError::ActionNotExecutable { id: current.id.clone(), status: current.status });
                }
                let mut next = current;
                next.status = Status::Executing;
                next.reason = Some("executing".to_string());
                next.updated_at = chrono::Utc::now();
                Ok(next)
            })
            .await?;

        self.event_bus.emit(&updated.id, "started", Map::new()).await;
        self.executors.dispatch(updated.clone(), self.clone() as Arc<dyn ExecutionReporter>);
        Ok(updated)
    }

    /// Record a terminal outcome reported by the HTTP `/result` endpoint
    /// (spec §6: `{success, error?}`, no reason field).
    pub async fn record_result(&self, action_id: &str, success: bool, error: Option<String>) -> Result<Action, GovernorError> {
        let (status, reason) = if success {
            (Status::Succeeded, "execution completed".to_string())
        } else {
            (Status::Failed, error.clone().unwrap_or_else(|| "execution failed".to_string()))
        };
        let event_type = if success { "succeeded" } else { "failed" };
        self.finish_execution(action_id, status, reason, event_type, error).await
    }

    /// Shared terminal-transition path for both the public `/result`
    /// endpoint and executor-reported outcomes (spec §4.3: executing →
    /// {succeeded, failed, timeout}).
    async fn finish_execution(
        &self,
        action_id: &str,
        status: Status,
        reason: String,
        event_type: &str,
        error: Option<String>,
    ) -> Result<Action, GovernorError> {
        let updated = self
            .transact(action_id, |current| {
                if current.status != Status::Executing {
                    return Err(GovernorError::ActionNotExecutable { id: current.id.clone(), status: current.status });
                }
                let mut next = current;
                next.status = status;
                next.reason = Some(reason.clone());
                next.updated_at = chrono::Utc::now();
                Ok(next)
            })
            .await?;

        let mut meta = Map::new();
        meta.insert("reason".to_string(), Value::String(updated.reason.clone().unwrap_or_default()));
        if let Some(error) = error {
            meta.insert("error".to_string(), Value::String(error));
        }
        self.event_bus.emit(&updated.id, event_type, meta).await;

        metrics::counter!(
            "fara_actions_completed_total",
            "tool" => updated.tool.clone(),
            "status" => updated.status.to_string(),
        )
        .increment(1);
        let latency = (updated.updated_at - updated.created_at).to_std().unwrap_or_default();
        metrics::histogram!(
            "fara_action_submit_to_response_seconds",
            "tool" => updated.tool.clone(),
            "operation" => updated.operation.clone(),
        )
        .record(latency.as_secs_f64());

        Ok(updated)
    }

    /// Resubmit the same `(agent_id, tool, operation, params)` as a brand
    /// new action, stamping `context.replayed_from` (spec §4.3; §9 open
    /// question resolved as: carry the full original context, then
    /// overwrite `replayed_from`, matching the source's own merge-all
    /// behavior).
    pub async fn replay(&self, action_id: &str) -> Result<Action, GovernorError> {
        let source = self
            .store
            .get_action(action_id)
            .await?
            .ok_or_else(|| GovernorError::ActionNotFound(action_id.to_string()))?;

        let mut context = source.context.clone();
        context.insert("replayed_from".to_string(), Value::String(source.id.clone()));

        self.submit(source.agent_id, source.tool, source.operation, source.params, context).await
    }
}

#[async_trait]
impl ExecutionReporter for Coordinator {
    async fn report(&self, action_id: &str, outcome: ExecutionOutcome) {
        let (status, event_type) = if outcome.error.as_deref() == Some("timeout") {
            (Status::Timeout, "timeout")
        } else if outcome.success {
            (Status::Succeeded, "succeeded")
        } else {
            (Status::Failed, "failed")
        };
        let reason = outcome.reason.unwrap_or_else(|| event_type.to_string());
        let result = self.finish_execution(action_id, status, reason, event_type, outcome.error).await;
        if let Err(e) = result {
            tracing::error!(action_id, error = %e, "failed to record execution outcome");
        }
    }
}
