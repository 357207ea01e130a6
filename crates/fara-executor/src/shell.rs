//! The reference shell executor (spec §4.4: "a collaborator, not core"),
//! grounded in `original_source/.../executor.py:run_shell`. Runs
//! `params.cmd` through the platform shell and reports exit status.

use async_trait::async_trait;
use fara_core::Action;
use tokio::process::Command;

use crate::{ExecutionOutcome, Executor};

pub struct ShellExecutor;

#[async_trait]
impl Executor for ShellExecutor {
    async fn execute(&self, action: Action) -> ExecutionOutcome {
        let cmd = match action.params.get("cmd").and_then(|v| v.as_str()) {
            Some(cmd) if !cmd.is_empty() => cmd.to_string(),
            _ => return ExecutionOutcome::failed("Missing cmd", "missing cmd"),
        };

        let output = if cfg!(target_os = "windows") {
            Command::new("cmd").arg("/C").arg(&cmd).output().await
        } else {
            Command::new("sh").arg("-c").arg(&cmd).output().await
        };

        match output {
            Ok(output) if output.status.success() => {
                let reason = String::from_utf8_lossy(&output.stdout).trim().to_string();
                ExecutionOutcome::succeeded(if reason.is_empty() { "ok".to_string() } else { reason })
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                let msg = if stderr.is_empty() {
                    format!("exit {}", output.status.code().unwrap_or(-1))
                } else {
                    stderr
                };
                ExecutionOutcome::failed(msg.clone(), msg)
            }
            Err(e) => ExecutionOutcome::failed(format!("execution error: {e}"), e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn successful_command_reports_stdout_as_reason() {
        let executor = ShellExecutor;
        let params = json!({"cmd": "echo hello"}).as_object().unwrap().clone();
        let action = Action::new("agent-1", "shell", "run", params, Default::default());
        let outcome = executor.execute(action).await;
        assert!(outcome.success);
        assert_eq!(outcome.reason.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn failing_command_reports_failure() {
        let executor = ShellExecutor;
        let params = json!({"cmd": "exit 7"}).as_object().unwrap().clone();
        let action = Action::new("agent-1", "shell", "run", params, Default::default());
        let outcome = executor.execute(action).await;
        assert!(!outcome.success);
    }

    #[tokio::test]
    async fn missing_cmd_fails_without_spawning() {
        let executor = ShellExecutor;
        let action = Action::new("agent-1", "shell", "run", Default::default(), Default::default());
        let outcome = executor.execute(action).await;
        assert!(!outcome.success);
        assert_eq!(outcome.reason.as_deref(), Some("Missing cmd"));
    }
}
