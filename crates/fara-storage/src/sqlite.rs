//! Embedded single-file backend (spec §4.1: "must run with zero external
//! services"). Schema mirrors [`super::postgres`] column-for-column so a
//! deployment can switch backends without code changes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fara_core::{Action, ActionEvent, Decision, GovernorError, RiskLevel, Status};
use serde_json::{Map, Value};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::{ActionFilters, ActionStore};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS actions (
    id              TEXT PRIMARY KEY,
    agent_id        TEXT NOT NULL,
    tool            TEXT NOT NULL,
    operation       TEXT NOT NULL,
    params          TEXT NOT NULL,
    context         TEXT NOT NULL,
    decision        TEXT,
    status          TEXT NOT NULL,
    reason          TEXT,
    risk_level      TEXT NOT NULL,
    approval_token  TEXT,
    policy_version  TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    version         INTEGER NOT NULL,
    -- forward-compatible columns, unused by the current lifecycle
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
    action_id    TEXT NOT NULL,
    event_type   TEXT NOT NULL,
    meta         TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    prev_hash    TEXT,
    record_hash  TEXT,
    FOREIGN KEY (action_id) REFERENCES actions(id)
);

CREATE INDEX IF NOT EXISTS idx_action_events_action_id ON action_events(action_id);
CREATE INDEX IF NOT EXISTS idx_actions_status ON actions(status);
"#;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(path: &str) -> Result<Self, GovernorError> {
        let url = format!("sqlite://{path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect(&url)
            .await
            .map_err(|e| GovernorError::StorageError(e.to_string()))?;
        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| GovernorError::StorageError(e.to_string()))?;
        Ok(Self { pool })
    }

    fn row_to_action(row: &sqlx::sqlite::SqliteRow) -> Result<Action, GovernorError> {
        let decode_json = |s: String| -> Result<Map<String, Value>, GovernorError> {
            match serde_json::from_str::<Value>(&s) {
                Ok(Value::Object(m)) => Ok(m),
                _ => Ok(Map::new()),
            }
        };
        let decision: Option<String> = row.try_get("decision").map_err(storage_err)?;
        let status: String = row.try_get("status").map_err(storage_err)?;
        let risk_level: String = row.try_get("risk_level").map_err(storage_err)?;
        let params: String = row.try_get("params").map_err(storage_err)?;
        let context: String = row.try_get("context").map_err(storage_err)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(storage_err)?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(storage_err)?;

        Ok(Action {
            id: row.try_get("id").map_err(storage_err)?,
            agent_id: row.try_get("agent_id").map_err(storage_err)?,
            tool: row.try_get("tool").map_err(storage_err)?,
            operation: row.try_get("operation").map_err(storage_err)?,
            params: decode_json(params)?,
            context: decode_json(context)?,
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
impl ActionStore for SqliteStore {
    async fn create_action(&self, action: &Action) -> Result<(), GovernorError> {
        sqlx::query(
            r#"INSERT INTO actions
                (id, agent_id, tool, operation, params, context, decision, status, reason,
                 risk_level, approval_token, policy_version, created_at, updated_at, version)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&action.id)
        .bind(&action.agent_id)
        .bind(&action.tool)
        .bind(&action.operation)
        .bind(serde_json::to_string(&action.params).map_err(|e| GovernorError::Internal(e.to_string()))?)
        .bind(serde_json::to_string(&action.context).map_err(|e| GovernorError::Internal(e.to_string()))?)
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
                decision = ?, status = ?, reason = ?, risk_level = ?, approval_token = ?,
                policy_version = ?, updated_at = ?, version = ?
               WHERE id = ? AND version = ?"#,
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
        let row = sqlx::query("SELECT * FROM actions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;
        row.as_ref().map(Self::row_to_action).transpose()
    }

    async fn list_actions(&self, limit: i64, offset: i64, filters: ActionFilters) -> Result<Vec<Action>, GovernorError> {
        let mut sql = String::from("SELECT * FROM actions WHERE 1=1");
        if filters.agent_id.is_some() {
            sql.push_str(" AND agent_id = ?");
        }
        if filters.tool.is_some() {
            sql.push_str(" AND tool = ?");
        }
        if filters.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        sql.push_str(" ORDER BY created_at DESC LIMIT ? OFFSET ?");

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
            "INSERT INTO action_events (id, action_id, event_type, meta, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(action_id)
        .bind(event_type)
        .bind(serde_json::to_string(&meta).unwrap_or_else(|_| "{}".to_string()))
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            tracing::error!(action_id, event_type, error = %e, "failed to append audit event");
        }
    }

    async fn get_events(&self, action_id: &str) -> Result<Vec<ActionEvent>, GovernorError> {
        let rows = sqlx::query("SELECT * FROM action_events WHERE action_id = ? ORDER BY created_at ASC")
            .bind(action_id)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;

        rows.iter()
            .map(|row| {
                let meta: String = row.try_get("meta").map_err(storage_err)?;
                Ok(ActionEvent {
                    id: row.try_get("id").map_err(storage_err)?,
                    action_id: row.try_get("action_id").map_err(storage_err)?,
                    event_type: row.try_get("event_type").map_err(storage_err)?,
                    meta: match serde_json::from_str::<Value>(&meta) {
                        Ok(Value::Object(m)) => m,
                        _ => Map::new(),
                    },
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // A pooled `:memory:` connection gives every pool connection its own
    // isolated database, so a create on one connection can be invisible to
    // a get on another. A uniquely named temp file sidesteps that without
    // giving up the "zero external services" property under test.
    async fn store() -> SqliteStore {
        let path = std::env::temp_dir().join(format!("fara-test-{}.db", uuid::Uuid::new_v4()));
        SqliteStore::connect(path.to_str().unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = store().await;
        let action = Action::new("agent-1", "http", "get", json!({"url": "https://x"}).as_object().unwrap().clone(), Default::default());
        store.create_action(&action).await.unwrap();
        let fetched = store.get_action(&action.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, action.id);
        assert_eq!(fetched.status, Status::PendingDecision);
        assert_eq!(fetched.version, 0);
    }

    #[tokio::test]
    async fn update_with_stale_version_is_rejected() {
        let store = store().await;
        let action = Action::new("agent-1", "http", "get", Default::default(), Default::default());
        store.create_action(&action).await.unwrap();

        let mut updated = action.clone();
        updated.status = Status::Allowed;
        updated.decision = Some(Decision::Allow);
        assert!(store.update_action(&updated, 0).await.unwrap());

        // retrying with the same (now-stale) expected_version must fail
        assert!(!store.update_action(&updated, 0).await.unwrap());

        let fresh = store.get_action(&action.id).await.unwrap().unwrap();
        assert_eq!(fresh.version, 1);
        assert_eq!(fresh.status, Status::Allowed);
    }

    #[tokio::test]
    async fn list_actions_filters_by_status() {
        let store = store().await;
        let a = Action::new("agent-1", "http", "get", Default::default(), Default::default());
        let mut b = Action::new("agent-1", "http", "get", Default::default(), Default::default());
        b.status = Status::Denied;
        store.create_action(&a).await.unwrap();
        store.create_action(&b).await.unwrap();

        let denied = store
            .list_actions(10, 0, ActionFilters { status: Some(Status::Denied), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(denied.len(), 1);
        assert_eq!(denied[0].id, b.id);
    }

    #[tokio::test]
    async fn append_event_never_fails_caller() {
        let store = store().await;
        let action = Action::new("agent-1", "http", "get", Default::default(), Default::default());
        store.create_action(&action).await.unwrap();
        store.append_event(&action.id, "submitted", Map::new()).await;
        let events = store.get_events(&action.id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "submitted");
    }
}
