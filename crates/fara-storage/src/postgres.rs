//! Networked backend (spec §4.1: "a networked database for multi-instance
//! deployments"). Column-for-column identical to [`super::sqlite`], using
//! native `JSONB`/`TIMESTAMPTZ` types instead of TEXT.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fara_core::{Action, ActionEvent, Decision, GovernorError, RiskLevel, Status};
use serde_json::{Map, Value};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;

use crate::{ActionFilters, ActionStore};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS actions (
    id              TEXT PRIMARY KEY,
    agent_id        TEXT NOT NULL,
    tool            TEXT NOT NULL,
    operation       TEXT NOT NULL,
    params          JSONB NOT NULL,
    context         JSONB NOT NULL,
    decision        TEXT,
    status          TEXT NOT NULL,
    reason          TEXT,
    risk_level      TEXT NOT NULL,
    approval_token  TEXT,
    policy_version  TEXT,
    created_at      TIMESTAMPTZ NOT NULL,
    updated_at      TIMESTAMPTZ NOT NULL,
    version         BIGINT NOT NULL,
    outcome         TEXT,
    reason_code     TEXT,
    reason_details  TEXT,
    request_hash    TEXT,
    policy_hash     TEXT,
    runtime_version TEXT,
    profile_id      TEXT,
    profile_version TEXT,
    profile_hash    TEXT,
    provenance_id   TEXT
);

CREATE TABLE IF NOT EXISTS action_events (
    id           TEXT PRIMARY KEY,
    action_id    TEXT NOT NULL REFERENCES actions(id),
    event_type   TEXT NOT NULL,
    meta         JSONB NOT NULL,
    created_at   TIMESTAMPTZ NOT NULL,
    prev_hash    TEXT,
    record_hash  TEXT
);

CREATE INDEX IF NOT EXISTS idx_action_events_action_id ON action_events(action_id);
CREATE INDEX IF NOT EXISTS idx_actions_status ON actions(status);
"#;

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect with a short timeout so an unreachable database fails fast
    /// and lets `get_store()` fall back to SQLite instead of hanging boot.
    pub async fn connect(dsn: &str) -> Result<Self, GovernorError> {
        let pool = PgPoolOptions::new()
            .max_connections(16)
            .acquire_timeout(Duration::from_secs(3))
            .connect(dsn)
            .await
            .map_err(|e| GovernorError::StorageError(e.to_string()))?;
        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| GovernorError::StorageError(e.to_string()))?;
        Ok(Self { pool })
    }

    fn row_to_action(row: &sqlx::postgres::PgRow) -> Result<Action, GovernorError> {
        let decision: Option<String> = row.try_get("decision").map_err(storage_err)?;
        let status: String = row.try_get("status").map_err(storage_err)?;
        let risk_level: String = row.try_get("risk_level").map_err(storage_err)?;
        let params: Value = row.try_get("params").map_err(storage_err)?;
        let context: Value = row.try_get("context").map_err(storage_err)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(storage_err)?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(storage_err)?;

        Ok(Action {
            id: row.try_get("id").map_err(storage_err)?,
            agent_id: row.try_get("agent_id").map_err(storage_err)?,
            tool: row.try_get("tool").map_err(storage_err)?,
            operation: row.try_get("operation").map_err(storage_err)?,
            params: params.as_object().cloned().unwrap_or_default(),
            context: context.as_object().cloned().unwrap_or_default(),
            decision: decision.and_then(|d| serde_json::from_value(Value::String(d)).ok()),
            status: serde_json::from_value::<Status>(Value::String(status))
                .map_err(|e| GovernorError::Internal(e.to_string()))?,
            reason: row.try_get("reason").map_err(storage_err)?,
            risk_level: serde_json::from_value::<RiskLevel>(Value::String(risk_level))
                .map_err(|e| GovernorError::Internal(e.to_string()))?,
            approval_token: row.try_get("approval_token").map_err(storage_err)?,
            policy_version: row.try_get("policy_version").map_err(storage_err)?,
            created_at,
            updated_at,
            version: row.try_get("version").map_err(storage_err)?,
        })
    }
}

fn storage_err(e: sqlx::Error) -> GovernorError {
    GovernorError::StorageError(e.to_string())
}

fn decision_str(d: Decision) -> String {
    serde_json::to_value(d).ok().and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default()
}

fn status_str(s: Status) -> String {
    serde_json::to_value(s).ok().and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default()
}

fn risk_str(r: RiskLevel) -> String {
    serde_json::to_value(r).ok().and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default()
}

#[async_trait]
impl ActionStore for PostgresStore {
    async fn create_action(&self, action: &Action) -> Result<(), GovernorError> {
        sqlx::query(
            r#"INSERT INTO actions
                (id, agent_id, tool, operation, params, context, decision, status, reason,
                 risk_level, approval_token, policy_version, created_at, updated_at, version)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"#,
        )
        .bind(&action.id)
        .bind(&action.agent_id)
        .bind(&action.tool)
        .bind(&action.operation)
        .bind(Value::Object(action.params.clone()))
        .bind(Value::Object(action.context.clone()))
        .bind(action.decision.map(decision_str))
        .bind(status_str(action.status))
        .bind(&action.reason)
        .bind(risk_str(action.risk_level))
        .bind(&action.approval_token)
        .bind(&action.policy_version)
        .bind(action.created_at)
        .bind(action.updated_at)
        .bind(action.version)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn update_action(&self, action: &Action, expected_version: i64) -> Result<bool, GovernorError> {
        let result = sqlx::query(
            r#"UPDATE actions SET
                decision = $1, status = $2, reason = $3, risk_level = $4, approval_token = $5,
                policy_version = $6, updated_at = $7, version = $8
               WHERE id = $9 AND version = $10"#,
        )
        .bind(action.decision.map(decision_str))
        .bind(status_str(action.status))
        .bind(&action.reason)
        .bind(risk_str(action.risk_level))
        .bind(&action.approval_token)
        .bind(&action.policy_version)
        .bind(action.updated_at)
        .bind(expected_version + 1)
        .bind(&action.id)
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_action(&self, id: &str) -> Result<Option<Action>, GovernorError> {
        let row = sqlx::query("SELECT * FROM actions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;
        row.as_ref().map(Self::row_to_action).transpose()
    }

    async fn list_actions(&self, limit: i64, offset: i64, filters: ActionFilters) -> Result<Vec<Action>, GovernorError> {
        let mut sql = String::from("SELECT * FROM actions WHERE 1=1");
        let mut n = 0;
        if filters.agent_id.is_some() {
            n += 1;
            sql.push_str(&format!(" AND agent_id = ${n}"));
        }
        if filters.tool.is_some() {
            n += 1;
            sql.push_str(&format!(" AND tool = ${n}"));
        }
        if filters.status.is_some() {
            n += 1;
            sql.push_str(&format!(" AND status = ${n}"));
        }
        sql.push_str(&format!(" ORDER BY created_at DESC LIMIT ${} OFFSET ${}", n + 1, n + 2));

        let mut query = sqlx::query(&sql);
        if let Some(agent_id) = &filters.agent_id {
            query = query.bind(agent_id);
        }
        if let Some(tool) = &filters.tool {
            query = query.bind(tool);
        }
        if let Some(status) = filters.status {
            query = query.bind(status_str(status));
        }
        query = query.bind(limit).bind(offset);

        let rows = query.fetch_all(&self.pool).await.map_err(storage_err)?;
        rows.iter().map(Self::row_to_action).collect()
    }

    async fn count_actions(&self) -> Result<i64, GovernorError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM actions")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;
        row.try_get::<i64, _>("n").map_err(storage_err)
    }

    async fn append_event(&self, action_id: &str, event_type: &str, meta: Map<String, Value>) {
        let result = sqlx::query(
            "INSERT INTO action_events (id, action_id, event_type, meta, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(action_id)
        .bind(event_type)
        .bind(Value::Object(meta))
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            tracing::error!(action_id, event_type, error = %e, "failed to append audit event");
        }
    }

    async fn get_events(&self, action_id: &str) -> Result<Vec<ActionEvent>, GovernorError> {
        let rows = sqlx::query("SELECT * FROM action_events WHERE action_id = $1 ORDER BY created_at ASC")
            .bind(action_id)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;

        rows.iter()
            .map(|row| {
                let meta: Value = row.try_get("meta").map_err(storage_err)?;
                Ok(ActionEvent {
                    id: row.try_get("id").map_err(storage_err)?,
                    action_id: row.try_get("action_id").map_err(storage_err)?,
                    event_type: row.try_get("event_type").map_err(storage_err)?,
                    meta: meta.as_object().cloned().unwrap_or_default(),
                    created_at: row.try_get("created_at").map_err(storage_err)?,
                    prev_hash: row.try_get("prev_hash").map_err(storage_err)?,
                    record_hash: row.try_get("record_hash").map_err(storage_err)?,
                })
            })
            .collect()
    }

    async fn seed_demo_actions(&self, actions: &[Action]) -> Result<(), GovernorError> {
        for action in actions {
            self.create_action(action).await?;
        }
        Ok(())
    }
}
