//! # fara-storage — The Action Store
//!
//! Durable, transactional persistence for actions and events (spec §4.1).
//! Two backends — an embedded single-file SQLite store and a networked
//! Postgres store — satisfy the same `ActionStore` trait, so the rest of
//! the Governor never branches on which one is active.

mod postgres;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use fara_core::{Action, ActionEvent, GovernorError, Status};
use serde_json::{Map, Value};

pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;

/// Optional filters for `list_actions` (spec §4.1: "filters on any of
/// {agent_id, tool, status}").
#[derive(Debug, Clone, Default)]
pub struct ActionFilters {
    pub agent_id: Option<String>,
    pub tool: Option<String>,
    pub status: Option<Status>,
}

/// The Action Store interface. Both backends implement this identically;
/// callers never need to know which one is active.
#[async_trait]
pub trait ActionStore: Send + Sync {
    /// Insert a new action row. Fails if `action.id` already exists.
    async fn create_action(&self, action: &Action) -> Result<(), GovernorError>;

    /// Update only if the stored `version` equals `expected_version`; on
    /// success the stored version becomes `expected_version + 1`. Returns
    /// `false` (not an error) on a version mismatch or missing row — the
    /// caller re-reads and retries (spec §4.3 concurrency protocol).
    async fn update_action(&self, action: &Action, expected_version: i64) -> Result<bool, GovernorError>;

    /// Fetch the current action, or `None` if no such id exists.
    async fn get_action(&self, id: &str) -> Result<Option<Action>, GovernorError>;

    /// List actions matching `filters`, newest first, offset-paginated.
    async fn list_actions(&self, limit: i64, offset: i64, filters: ActionFilters) -> Result<Vec<Action>, GovernorError>;

    /// Total row count (used by demo seeding to detect an empty store).
    async fn count_actions(&self) -> Result<i64, GovernorError>;

    /// Append an audit event. Best-effort: failures are logged here and
    /// never propagated, so a caller never needs its own try/catch to
    /// keep event writes from aborting a state change (spec §4.1, §7).
    async fn append_event(&self, action_id: &str, event_type: &str, meta: Map<String, Value>);

    /// All events for an action, oldest first.
    async fn get_events(&self, action_id: &str) -> Result<Vec<ActionEvent>, GovernorError>;

    /// Insert a batch of fully-formed actions (demo seeding only).
    async fn seed_demo_actions(&self, actions: &[Action]) -> Result<(), GovernorError>;
}

/// Construct the configured store, falling back to the embedded SQLite
/// backend if a configured networked backend can't be reached at startup
/// (spec §4.1, §9: "never crash on boot for storage reasons alone").
pub async fn get_store(db_backend: &str, sqlite_path: &str, postgres_dsn: &str) -> Arc<dyn ActionStore> {
    if db_backend.eq_ignore_ascii_case("postgres") {
        match PostgresStore::connect(postgres_dsn).await {
            Ok(store) => return Arc::new(store),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "failed to connect to PostgreSQL, falling back to SQLite; set FARA_DB_BACKEND=sqlite to suppress this warning"
                );
            }
        }
    }

    Arc::new(
        SqliteStore::connect(sqlite_path)
            .await
            .expect("embedded SQLite store must always be constructible"),
    )
}
