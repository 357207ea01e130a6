//! Pattern matching semantics (spec §4.2).

use fara_core::CanonicalBytes;
use serde_json::{Map, Value};

use crate::types::MatchSpec;

fn glob_eq(pattern: &str, value: &str) -> bool {
    pattern == "*" || pattern == value
}

fn lookup<'a>(key: &str, params: &'a Map<String, Value>, context: &'a Map<String, Value>) -> Option<&'a Value> {
    params.get(key).or_else(|| context.get(key))
}

fn as_f64(value: &Value) -> Option<f64> {
    value.as_f64()
}

/// Does `spec` match this `(tool, operation, params, context)` tuple?
///
/// A spec with no fields set matches everything. Every field that *is* set
/// must match for the rule to match.
pub fn matches(spec: &MatchSpec, tool: &str, operation: &str, params: &Map<String, Value>, context: &Map<String, Value>) -> bool {
    if let Some(t) = &spec.tool {
        if !glob_eq(t, tool) {
            return false;
        }
    }
    if let Some(op) = &spec.op {
        if !glob_eq(op, operation) {
            return false;
        }
    }
    if let Some(substr) = &spec.pattern {
        let canonical = match CanonicalBytes::new(params) {
            Ok(c) => c,
            Err(_) => return false,
        };
        let text = String::from_utf8_lossy(canonical.as_bytes());
        if !text.contains(substr.as_str()) {
            return false;
        }
    }
    if let Some(threshold) = spec.amount_gt {
        match lookup("amount", params, context).and_then(as_f64) {
            Some(amount) if amount > threshold => {}
            _ => return false,
        }
    }
    if let Some(threshold) = spec.amount_lt {
        match lookup("amount", params, context).and_then(as_f64) {
            Some(amount) if amount < threshold => {}
            _ => return false,
        }
    }
    for (key, expected) in &spec.predicates {
        match lookup(key, params, context) {
            Some(actual) if actual == expected => {}
            _ => return false,
        }
    }
    true
}
