//! # fara-executor — The Executor Registry (spec §4.4)
//!
//! Dispatches an action whose status is transitioning to `executing` to a
//! registered [`Executor`] keyed by `tool`. The registry — not individual
//! executors — owns the per-action timeout, so every registered executor
//! gets the same "honour `context.timeout`, else the global default, kill
//! the work and report a timeout outcome" behavior for free.

mod shell;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fara_core::Action;

pub use shell::ShellExecutor;

/// The terminal result of one dispatch, reported back exactly once.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub reason: Option<String>,
    pub error: Option<String>,
}

impl ExecutionOutcome {
    pub fn succeeded(reason: impl Into<String>) -> Self {
        Self { success: true, reason: Some(reason.into()), error: None }
    }

    pub fn failed(reason: impl Into<String>, error: impl Into<String>) -> Self {
        Self { success: false, reason: Some(reason.into()), error: Some(error.into()) }
    }

    pub fn timed_out() -> Self {
        Self { success: false, reason: Some("timed out".to_string()), error: Some("timeout".to_string()) }
    }
}

/// Receives the outcome of a dispatched action. Implemented by the
/// Lifecycle Coordinator to fold the outcome back into the state machine
/// (`succeeded`/`failed`/`timeout` + the matching event).
#[async_trait]
pub trait ExecutionReporter: Send + Sync {
    async fn report(&self, action_id: &str, outcome: ExecutionOutcome);
}

/// A pluggable handler for one `tool`. `execute` is expected to run to
/// completion or be cancelled by the registry's timeout wrapper — it does
/// not need to implement its own timeout, only to behave correctly when
/// the future driving it is dropped mid-flight (abort in-flight work,
/// release resources).
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, action: Action) -> ExecutionOutcome;
}

/// Default per-action timeout when neither `context.timeout` nor an
/// explicit override is present.
pub const DEFAULT_ACTION_TIMEOUT_SECS: u64 = 30;

pub struct ExecutorRegistry {
    executors: HashMap<String, Arc<dyn Executor>>,
    default_timeout_secs: u64,
}

impl ExecutorRegistry {
    pub fn new(default_timeout_secs: u64) -> Self {
        Self { executors: HashMap::new(), default_timeout_secs }
    }

    pub fn register(&mut self, tool: impl Into<String>, executor: Arc<dyn Executor>) {
        self.executors.insert(tool.into(), executor);
    }

    fn timeout_for(&self, action: &Action) -> Duration {
        let seconds = action
            .context
            .get("timeout")
            .and_then(|v| v.as_u64())
            .unwrap_or(self.default_timeout_secs);
        Duration::from_secs(seconds)
    }

    /// Dispatch `action` asynchronously. Spawns its own task and returns
    /// immediately; `reporter` is called exactly once, from that task, when
    /// the executor completes, errors, or times out.
    ///
    /// If no executor is registered for `action.tool`, reports success
    /// immediately with reason "no executor" (spec §4.4: preserves the
    /// audit story rather than silently dropping the action).
    pub fn dispatch(&self, action: Action, reporter: Arc<dyn ExecutionReporter>) {
        let Some(executor) = self.executors.get(&action.tool).cloned() else {
            let action_id = action.id.clone();
            tokio::spawn(async move {
                reporter.report(&action_id, ExecutionOutcome::succeeded("no executor")).await;
            });
            return;
        };

        let timeout = self.timeout_for(&action);
        let action_id = action.id.clone();
        tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, executor.execute(action)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::warn!(action_id = %action_id, timeout_secs = timeout.as_secs(), "action timed out");
                    ExecutionOutcome::timed_out()
                }
            };
            reporter.report(&action_id, outcome).await;
        });
    }
}
