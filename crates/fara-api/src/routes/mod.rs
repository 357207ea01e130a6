//! Route modules and the assembled [`axum::Router`].

pub mod actions;
pub mod events;
pub mod health;
pub mod playground;
pub mod policy;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_bearer_token;
use crate::state::AppState;

pub fn build_router(state: AppState, enable_cors: bool) -> Router {
    let mut router = Router::new()
        .route("/v1/actions", post(actions::submit_action).get(actions::list_actions))
        .route("/v1/actions/:id", get(actions::get_action))
        .route("/v1/actions/:id/approval", post(actions::approve_action))
        .route("/v1/actions/:id/start", post(actions::start_action))
        .route("/v1/actions/:id/result", post(actions::record_result))
        .route("/v1/actions/:id/replay", post(actions::replay_action))
        .route("/v1/actions/:id/events", get(actions::get_action_events))
        .route("/v1/events", get(events::stream_events))
        .route("/v1/policy/info", get(policy::policy_info))
        .route("/playground/eval", post(playground::playground_eval))
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/metrics", get(health::metrics))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer_token))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router
}
