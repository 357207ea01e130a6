//! In-memory policy representation (spec §3, Policy / PolicyRule / RiskRule).

use fara_core::{Decision, RiskLevel};
use serde_json::{Map, Value};

/// A match pattern shared by `PolicyRule` and `RiskRule`.
///
/// `tool`/`op` use glob semantics: `"*"` is a wildcard, anything else is a
/// literal equality check. `pattern` is a substring check against the
/// canonical JSON of `params`. `amount_gt`/`amount_lt` compare a named
/// numeric param field. Any other key is an equality predicate checked
/// first against `params`, falling back to `context`. A spec with no
/// fields at all matches every input.
#[derive(Debug, Clone, Default)]
pub struct MatchSpec {
    pub tool: Option<String>,
    pub op: Option<String>,
    pub pattern: Option<String>,
    pub amount_gt: Option<f64>,
    pub amount_lt: Option<f64>,
    pub predicates: Map<String, Value>,
}

/// One ordered rule in the active policy. The first rule whose `match`
/// matches the input decides the action (spec §4.2 step 2).
#[derive(Debug, Clone)]
pub struct PolicyRule {
    pub match_spec: MatchSpec,
    pub effect: Decision,
    pub risk: Option<RiskLevel>,
    pub description: Option<String>,
}

/// A risk-classification rule. All risk rules are evaluated on every input;
/// the highest `risk_level` among matches wins (spec §4.2 step 1).
#[derive(Debug, Clone)]
pub struct RiskRule {
    pub when: MatchSpec,
    pub risk_level: RiskLevel,
}

/// The active, loaded ruleset.
#[derive(Debug, Clone)]
pub struct Policy {
    pub rules: Vec<PolicyRule>,
    pub risk_rules: Vec<RiskRule>,
    /// Content hash of the source document (`H(source_text)`).
    pub version: String,
}
