//! Maps [`GovernorError`] to the wire error shape from spec §7:
//! `{"detail": string, "code": ERROR_CODE, ...extra}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fara_core::GovernorError;
use serde_json::{json, Value};

pub struct ApiError(pub GovernorError);

impl From<GovernorError> for ApiError {
    fn from(e: GovernorError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, extra) = match &self.0 {
            GovernorError::ActionNotFound(_) => (StatusCode::NOT_FOUND, "ACTION_NOT_FOUND", json!({})),
            GovernorError::ActionNotExecutable { status, .. } => {
                (StatusCode::BAD_REQUEST, "ACTION_NOT_EXECUTABLE", json!({"status": status}))
            }
            GovernorError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", json!({})),
            GovernorError::ValidationError { field, .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", json!({"field": field}))
            }
            GovernorError::Conflict(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", json!({})),
            GovernorError::StorageError(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", json!({})),
            GovernorError::ExecutorTimeout => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", json!({})),
            GovernorError::Canonicalization(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", json!({})),
            GovernorError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", json!({})),
        };

        let mut body = json!({"detail": self.0.to_string(), "code": code});
        if let Value::Object(extra) = extra {
            body.as_object_mut().unwrap().extend(extra);
        }
        (status, Json(body)).into_response()
    }
}
