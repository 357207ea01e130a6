//! Bearer-token authentication (spec §6), grounded in
//! `original_source/src/faracore/server/auth.py:AuthMiddleware`. Public
//! paths bypass auth entirely; everything else requires `Authorization:
//! Bearer <token>` matching one of the comma-separated configured tokens.
//! Skipped outright when no token is configured.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::state::AppState;

const PUBLIC_PATHS: &[&str] = &["/health", "/ready", "/metrics", "/docs", "/openapi.json", "/redoc"];

fn is_public(path: &str) -> bool {
    path == "/" || PUBLIC_PATHS.iter().any(|p| path.starts_with(p))
}

pub async fn require_bearer_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(configured) = &state.auth_token else {
        return next.run(request).await;
    };

    if is_public(request.uri().path()) {
        return next.run(request).await;
    }

    let header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let Some(token) = header.and_then(|h| h.strip_prefix("Bearer ")) else {
        return unauthorized("missing or invalid Authorization header");
    };

    let valid = configured.split(',').map(str::trim).any(|candidate| candidate == token);
    if !valid {
        return unauthorized("invalid authentication token");
    }

    next.run(request).await
}

fn unauthorized(detail: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"detail": detail}))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_and_health_are_public() {
        assert!(is_public("/"));
        assert!(is_public("/health"));
        assert!(is_public("/ready"));
        assert!(is_public("/metrics"));
    }

    #[test]
    fn action_routes_are_not_public() {
        assert!(!is_public("/v1/actions"));
        assert!(!is_public("/v1/actions/abc"));
    }
}
