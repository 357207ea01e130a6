//! # fara-policy — The Policy Engine
//!
//! Loads a declarative rule document and evaluates `(tool, operation,
//! params, context)` tuples against it (spec §4.2). Evaluation is pure: it
//! never performs I/O and never blocks, so the Lifecycle Coordinator can
//! call it directly on the request path.

mod engine;
mod file;
mod r#match;
mod types;

pub use engine::PolicyEngine;
pub use types::{Policy, PolicyRule, RiskRule};
