//! Shared application state (spec §9: "pass a `Governor` context explicitly
//! through handlers; hold the Store and Policy behind interface types" —
//! the Rust answer to the source's process-wide settings/store singletons).

use std::sync::Arc;

use fara_policy::PolicyEngine;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::coordinator::Coordinator;
use crate::event_bus::EventBus;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub policy: Arc<PolicyEngine>,
    pub event_bus: Arc<EventBus>,
    pub auth_token: Option<String>,
    pub policy_file: String,
    pub prometheus_handle: PrometheusHandle,
}
