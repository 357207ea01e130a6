//! The Policy Engine (spec §4.2): `load()` + `evaluate()`.

use std::sync::RwLock;

use fara_core::{Decision, GovernorError, RiskLevel};
use serde_json::{Map, Value};

use crate::file;
use crate::r#match::matches;
use crate::types::Policy;

const NO_MATCHING_RULE_REASON: &str = "no matching policy rule";

/// Holds the currently active `Policy` behind a lock so `load()` can swap
/// it atomically while `evaluate()` calls proceed concurrently. Evaluation
/// itself never performs I/O and never blocks on anything but this lock,
/// which is held only long enough to clone the rule vectors it needs.
pub struct PolicyEngine {
    policy: RwLock<Policy>,
}

impl PolicyEngine {
    /// Load a policy document's source text directly.
    pub fn load(source_text: &str) -> Result<Self, GovernorError> {
        let policy = file::parse(source_text)?;
        Ok(Self { policy: RwLock::new(policy) })
    }

    /// Load from a policy file path. If the file does not exist, starts
    /// with an empty ruleset (every action falls through to the
    /// default-deny rule) rather than failing process startup — the
    /// governor should boot even with a misconfigured or not-yet-created
    /// policy file, the same way it tolerates an unreachable networked
    /// storage backend.
    pub fn from_file(path: &std::path::Path) -> Result<Self, GovernorError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::load(&text),
            Err(_) => {
                tracing::warn!(path = %path.display(), "policy file not found, starting with an empty (default-deny) ruleset");
                Self::load("")
            }
        }
    }

    /// Replace the active policy in place. `version` is recomputed; readers
    /// in flight see either the old or the new policy atomically, never a
    /// partial mix.
    pub fn reload(&self, source_text: &str) -> Result<(), GovernorError> {
        let policy = file::parse(source_text)?;
        let mut guard = self.policy.write().expect("policy lock poisoned");
        *guard = policy;
        Ok(())
    }

    /// The content-hash version of the currently loaded policy.
    pub fn policy_version(&self) -> String {
        self.policy.read().expect("policy lock poisoned").version.clone()
    }

    /// Evaluate `(tool, operation, params, context)` against the active
    /// policy. Pure: no I/O, never blocks beyond the read lock above.
    pub fn evaluate(
        &self,
        tool: &str,
        operation: &str,
        params: &Map<String, Value>,
        context: &Map<String, Value>,
    ) -> (Decision, String, RiskLevel) {
        let policy = self.policy.read().expect("policy lock poisoned");

        let risk_level = policy
            .risk_rules
            .iter()
            .filter(|rule| matches(&rule.when, tool, operation, params, context))
            .map(|rule| rule.risk_level)
            .max()
            .unwrap_or_default();

        let (mut decision, mut reason) = (Decision::Deny, NO_MATCHING_RULE_REASON.to_string());
        for rule in &policy.rules {
            if matches(&rule.match_spec, tool, operation, params, context) {
                decision = rule.effect;
                reason = rule
                    .description
                    .clone()
                    .unwrap_or_else(|| format!("matched rule: {:?}", rule.effect));
                break;
            }
        }

        // Risk override: high-risk allows always require a human (spec §4.2 step 4).
        if decision == Decision::Allow && risk_level == RiskLevel::High {
            decision = Decision::RequireApproval;
            reason = format!("{reason} (escalated: risk_level=high)");
        }

        (decision, reason, risk_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn default_deny_when_no_rule_matches() {
        let engine = PolicyEngine::load("rules: []").unwrap();
        let (decision, reason, risk) = engine.evaluate("unknown", "do", &map(json!({})), &map(json!({})));
        assert_eq!(decision, Decision::Deny);
        assert_eq!(reason, NO_MATCHING_RULE_REASON);
        assert_eq!(risk, RiskLevel::Low);
    }

    #[test]
    fn first_matching_rule_wins() {
        let yaml = r#"
rules:
  - match: { tool: "http", op: "*" }
    allow: true
    description: "allow all http"
  - match: { tool: "*", op: "*" }
    deny: true
"#;
        let engine = PolicyEngine::load(yaml).unwrap();
        let (decision, reason, _) = engine.evaluate("http", "get", &map(json!({})), &map(json!({})));
        assert_eq!(decision, Decision::Allow);
        assert_eq!(reason, "allow all http");
    }

    #[test]
    fn high_risk_escalates_allow_to_require_approval() {
        let yaml = r#"
rules:
  - match: { tool: "shell", op: "*" }
    allow: true
risk:
  rules:
    - when: { tool: "shell", pattern: "rm -rf" }
      risk_level: high
"#;
        let engine = PolicyEngine::load(yaml).unwrap();
        let (decision, _, risk) = engine.evaluate("shell", "run", &map(json!({"cmd": "rm -rf /tmp"})), &map(json!({})));
        assert_eq!(decision, Decision::RequireApproval);
        assert_eq!(risk, RiskLevel::High);
    }

    #[test]
    fn reload_with_identical_content_yields_same_version() {
        let source = "rules: []";
        let engine = PolicyEngine::load(source).unwrap();
        let v1 = engine.policy_version();
        engine.reload(source).unwrap();
        let v2 = engine.policy_version();
        assert_eq!(v1, v2);
    }

    #[test]
    fn reload_with_different_content_changes_version() {
        let engine = PolicyEngine::load("rules: []").unwrap();
        let v1 = engine.policy_version();
        engine
            .reload(r#"rules: [{match: {tool: "*"}, allow: true}]"#)
            .unwrap();
        let v2 = engine.policy_version();
        assert_ne!(v1, v2);
    }

    #[test]
    fn evaluation_is_pure_and_deterministic() {
        let engine = PolicyEngine::load(r#"rules: [{match: {tool: "http"}, allow: true}]"#).unwrap();
        let params = map(json!({"url": "https://example.com"}));
        let a = engine.evaluate("http", "get", &params, &map(json!({})));
        let b = engine.evaluate("http", "get", &params, &map(json!({})));
        assert_eq!(a, b);
    }
}
