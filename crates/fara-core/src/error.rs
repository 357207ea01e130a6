//! # Error Types — Structured Error Hierarchy
//!
//! `GovernorError` is the error taxonomy from spec §7: `ActionNotFound`,
//! `ActionNotExecutable(status)`, `Unauthorized`, `ValidationError(field?)`,
//! `PolicyDenied(reason)`, `Conflict`, `StorageError`, `ExecutorTimeout`,
//! `Internal`. Each variant carries the context a caller needs to react —
//! no bare strings, no `Box<dyn Error>`.
//!
//! HTTP status/code mapping lives in `fara-api`, which is the only crate
//! that knows about wire formats; this crate stays transport-agnostic.

use thiserror::Error;

use crate::model::Status;

/// Top-level error type for the Execution Governor core.
#[derive(Error, Debug)]
pub enum GovernorError {
    /// No action exists with the given id.
    #[error("action {0} not found")]
    ActionNotFound(String),

    /// The requested transition is illegal from the action's current status.
    #[error("action {id} is not executable from status {status:?}")]
    ActionNotExecutable { id: String, status: Status },

    /// Missing/invalid auth credential, or an approval token mismatch.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Request body failed schema/shape validation.
    #[error("validation error{}: {message}", field.as_deref().map(|f| format!(" ({f})")).unwrap_or_default())]
    ValidationError {
        field: Option<String>,
        message: String,
    },

    /// Optimistic-lock retry budget exhausted.
    #[error("conflict: concurrent update exhausted retry budget for action {0}")]
    Conflict(String),

    /// The persistence layer failed for reasons other than a row-not-found
    /// or version mismatch.
    #[error("storage error: {0}")]
    StorageError(String),

    /// An executor failed to report within its timeout budget.
    #[error("executor timeout")]
    ExecutorTimeout,

    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Unexpected internal fault.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error during canonical serialization (policy matching, digest inputs).
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    /// Amounts must be strings or integers.
    #[error("float values are not permitted in canonical representations; use string or integer for amount: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
