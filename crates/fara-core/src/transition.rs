//! # Transition Validation — Runtime State Machine Guard
//!
//! `validate_transition` enforces the edges of the action lifecycle state
//! machine (spec §4.3) against an action whose status was just read from
//! storage. This is the same "Dyn enum + fallible transition" shape used
//! elsewhere in the codebase for persisted, reloadable state machines:
//! the legal pairs are a hardcoded `matches!` set, and anything else is
//! rejected rather than silently coerced.
//!
//! Guards that depend on more than `(from, to)` — the decision/risk_level
//! split out of `pending_decision`, approval token validity — are the
//! Lifecycle Coordinator's responsibility; this function only answers
//! "is this edge in the graph at all".

use crate::model::Status;

/// Returns `true` if `to` is a legal next status for an action currently at
/// `from`.
pub fn validate_transition(from: Status, to: Status) -> bool {
    use Status::*;
    matches!(
        (from, to),
        (PendingDecision, Allowed)
            | (PendingDecision, Denied)
            | (PendingDecision, PendingApproval)
            | (PendingApproval, Approved)
            | (PendingApproval, Denied)
            | (Allowed, Executing)
            | (Approved, Executing)
            | (Executing, Succeeded)
            | (Executing, Failed)
            | (Executing, Timeout)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use Status::*;

    #[test]
    fn allow_path_is_legal() {
        assert!(validate_transition(PendingDecision, Allowed));
        assert!(validate_transition(Allowed, Executing));
        assert!(validate_transition(Executing, Succeeded));
    }

    #[test]
    fn approval_path_is_legal() {
        assert!(validate_transition(PendingDecision, PendingApproval));
        assert!(validate_transition(PendingApproval, Approved));
        assert!(validate_transition(Approved, Executing));
    }

    #[test]
    fn terminal_states_accept_no_further_transitions() {
        for terminal in [Denied, Succeeded, Failed, Timeout] {
            for to in [Allowed, Denied, PendingApproval, Approved, Executing, Succeeded, Failed, Timeout] {
                assert!(!validate_transition(terminal, to), "{terminal:?} -> {to:?} should be illegal");
            }
        }
    }

    #[test]
    fn start_from_pending_decision_is_illegal() {
        assert!(!validate_transition(PendingDecision, Executing));
    }

    #[test]
    fn approving_an_already_approved_action_is_illegal() {
        assert!(!validate_transition(Approved, Approved));
    }
}
