//! Policy file parsing (spec §6, "Policy file format").
//!
//! A document with top-level keys `rules` (ordered list) and optional
//! `risk.rules`. Each rule: `match: {tool, op, pattern?, <predicates>}`,
//! plus exactly one of `allow: true`, `deny: true`, `require_approval: true`,
//! plus optional `description`, `risk`.

use fara_core::{sha256_hex, CanonicalBytes, Decision, GovernorError, RiskLevel};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::types::{MatchSpec, Policy, PolicyRule, RiskRule};

#[derive(Debug, Deserialize, Default)]
struct RawMatchSpec {
    tool: Option<String>,
    op: Option<String>,
    pattern: Option<String>,
    amount_gt: Option<f64>,
    amount_lt: Option<f64>,
    #[serde(flatten)]
    predicates: Map<String, Value>,
}

impl From<RawMatchSpec> for MatchSpec {
    fn from(raw: RawMatchSpec) -> Self {
        MatchSpec {
            tool: raw.tool,
            op: raw.op,
            pattern: raw.pattern,
            amount_gt: raw.amount_gt,
            amount_lt: raw.amount_lt,
            predicates: raw.predicates,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRule {
    #[serde(rename = "match", default)]
    match_spec: RawMatchSpec,
    #[serde(default)]
    allow: bool,
    #[serde(default)]
    deny: bool,
    #[serde(default)]
    require_approval: bool,
    description: Option<String>,
    risk: Option<RiskLevel>,
}

#[derive(Debug, Deserialize)]
struct RawRiskRule {
    #[serde(rename = "when")]
    when: RawMatchSpec,
    risk_level: RiskLevel,
}

#[derive(Debug, Deserialize, Default)]
struct RiskSection {
    #[serde(default)]
    rules: Vec<RawRiskRule>,
}

#[derive(Debug, Deserialize)]
struct PolicyFile {
    #[serde(default)]
    rules: Vec<RawRule>,
    #[serde(default)]
    risk: RiskSection,
}

fn rule_effect(raw: &RawRule) -> Result<Decision, GovernorError> {
    let flags = [raw.allow, raw.deny, raw.require_approval];
    match flags.iter().filter(|f| **f).count() {
        1 => Ok(if raw.allow {
            Decision::Allow
        } else if raw.deny {
            Decision::Deny
        } else {
            Decision::RequireApproval
        }),
        0 => Err(GovernorError::ValidationError {
            field: Some("rules[].allow|deny|require_approval".to_string()),
            message: "rule must set exactly one of allow, deny, require_approval".to_string(),
        }),
        _ => Err(GovernorError::ValidationError {
            field: Some("rules[].allow|deny|require_approval".to_string()),
            message: "rule must set exactly one of allow, deny, require_approval, not several".to_string(),
        }),
    }
}

/// Parse a policy document and compute its content-hash version.
///
/// `version = H(source_text)`, so reloading with byte-identical content
/// always yields the same version (spec §8 round-trip property).
pub fn parse(source_text: &str) -> Result<Policy, GovernorError> {
    let parsed: PolicyFile = serde_yaml::from_str(source_text).map_err(|e| GovernorError::ValidationError {
        field: Some("policy_file".to_string()),
        message: format!("invalid policy document: {e}"),
    })?;

    let mut rules = Vec::with_capacity(parsed.rules.len());
    for raw in parsed.rules {
        let effect = rule_effect(&raw)?;
        rules.push(PolicyRule {
            match_spec: raw.match_spec.into(),
            effect,
            risk: raw.risk,
            description: raw.description,
        });
    }

    let risk_rules = parsed
        .risk
        .rules
        .into_iter()
        .map(|raw| RiskRule {
            when: raw.when.into(),
            risk_level: raw.risk_level,
        })
        .collect();

    let canonical = CanonicalBytes::new(&source_text)?;
    let version = sha256_hex(&canonical);

    Ok(Policy { rules, risk_rules, version })
}
