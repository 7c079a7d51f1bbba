//! Property-based checks for budgets, the state graph, and append-only
//! structures.

use proptest::prelude::*;

use waypoint::domain::foundation::Lifecycle;
use waypoint::domain::policy::{Budget, StateTransitions};
use waypoint::domain::run::{EvidenceKind, EvidenceSource, Ledger, LedgerKind, Run};
use waypoint::domain::AgentState;

fn any_state() -> impl Strategy<Value = AgentState> {
    prop::sample::select(AgentState::all().to_vec())
}

proptest! {
    #[test]
    fn charging_by_one_succeeds_exactly_cap_times(cap in 0u64..200) {
        let budget = Budget::with_caps([("tool_calls", cap)]);
        let mut successes = 0u64;
        for _ in 0..cap + 50 {
            if budget.charge("tool_calls", 1).is_ok() {
                successes += 1;
            }
        }
        prop_assert_eq!(successes, cap);
        prop_assert!(budget.is_exhausted());
    }

    #[test]
    fn charge_never_exceeds_cap(cap in 0u64..100, amounts in prop::collection::vec(1u64..10, 0..50)) {
        let budget = Budget::with_caps([("tokens", cap)]);
        for amount in amounts {
            let _ = budget.charge("tokens", amount);
        }
        prop_assert!(budget.snapshot()["tokens"].count <= cap);
    }

    #[test]
    fn default_transition_map_matches_the_state_enum(from in any_state(), to in any_state()) {
        let transitions = StateTransitions::default();
        prop_assert_eq!(transitions.contains(from, to), from.permits(to));
    }

    #[test]
    fn terminal_targets_survive_budget_exhaustion(from in any_state()) {
        let transitions = StateTransitions::default();
        if transitions.contains(from, AgentState::Failed) {
            prop_assert!(transitions.validate(from, AgentState::Failed, true).is_ok());
        }
    }

    #[test]
    fn ledger_sequences_stay_contiguous(appends in 1usize..40) {
        let mut ledger = Ledger::new();
        for _ in 0..appends {
            ledger.append(LedgerKind::DecisionMade, serde_json::json!({})).unwrap();
        }
        for (i, entry) in ledger.entries().iter().enumerate() {
            prop_assert_eq!(entry.sequence, i as u64);
        }
    }

    #[test]
    fn evidence_appends_are_contiguous_and_monotonic(appends in 1usize..40) {
        let mut run = Run::new("property goal");
        for i in 0..appends {
            run.append_evidence(
                EvidenceSource::Engine,
                EvidenceKind::Observation,
                serde_json::json!({ "i": i }),
            ).unwrap();
        }
        for (i, record) in run.evidence().iter().enumerate() {
            prop_assert_eq!(record.sequence, i as u64);
        }
        for pair in run.evidence().windows(2) {
            prop_assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }
}
