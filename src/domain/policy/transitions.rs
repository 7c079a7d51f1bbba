//! State transitions - The configurable transition map and its guard.
//!
//! The default map encodes the canonical graph. Hosts may supply a custom
//! map at engine construction; the guard semantics stay the same.

use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

use crate::domain::foundation::Lifecycle;
use crate::domain::AgentState;

/// Errors from transition validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// The target is not an edge of the configured graph.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: AgentState, to: AgentState },

    /// The budget is exhausted and the target is not exempt from the guard.
    #[error("transition from {from} to {to} blocked: budget exhausted")]
    BudgetExhausted { from: AgentState, to: AgentState },
}

/// Mapping from state to the set of states it may transition to.
#[derive(Debug, Clone)]
pub struct StateTransitions {
    edges: HashMap<AgentState, BTreeSet<AgentState>>,
}

impl StateTransitions {
    /// Creates an empty map with no edges.
    pub fn empty() -> Self {
        Self {
            edges: HashMap::new(),
        }
    }

    /// Adds an edge from one state to another.
    pub fn allow(&mut self, from: AgentState, to: AgentState) -> &mut Self {
        self.edges.entry(from).or_default().insert(to);
        self
    }

    /// Builder-style variant of [`allow`](Self::allow).
    pub fn with_edge(mut self, from: AgentState, to: AgentState) -> Self {
        self.allow(from, to);
        self
    }

    /// Returns true if the edge exists.
    pub fn contains(&self, from: AgentState, to: AgentState) -> bool {
        self.edges
            .get(&from)
            .map(|targets| targets.contains(&to))
            .unwrap_or(false)
    }

    /// Returns the targets reachable in one step from a state, sorted.
    pub fn targets_from(&self, from: AgentState) -> Vec<AgentState> {
        self.edges
            .get(&from)
            .map(|targets| targets.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Validates a transition under the budget guard.
    ///
    /// A transition succeeds iff the edge exists and, for targets that are
    /// neither `act` nor terminal, the budget is not exhausted. Terminal
    /// targets stay reachable so an exhausted run can still finish.
    pub fn validate(
        &self,
        from: AgentState,
        to: AgentState,
        budget_exhausted: bool,
    ) -> Result<(), TransitionError> {
        if !self.contains(from, to) {
            return Err(TransitionError::InvalidTransition { from, to });
        }
        let guard_exempt = to == AgentState::Act || to.is_terminal();
        if budget_exhausted && !guard_exempt {
            return Err(TransitionError::BudgetExhausted { from, to });
        }
        Ok(())
    }

    /// Returns true if `target` is reachable from `from` through any number
    /// of edges. Used to decide whether a run may finish from its current
    /// state.
    pub fn is_reachable(&self, from: AgentState, target: AgentState) -> bool {
        if from == target {
            return true;
        }
        let mut visited = BTreeSet::new();
        let mut frontier = vec![from];
        while let Some(state) = frontier.pop() {
            if !visited.insert(state) {
                continue;
            }
            for next in self.targets_from(state) {
                if next == target {
                    return true;
                }
                frontier.push(next);
            }
        }
        false
    }
}

impl Default for StateTransitions {
    /// The canonical graph: every non-terminal state may fail; the happy
    /// path runs intake → explore → decide → act → validate → done with
    /// decide → done and validate → explore shortcuts.
    fn default() -> Self {
        let mut transitions = Self::empty();
        for state in AgentState::all() {
            for target in state.successors() {
                transitions.allow(state, *target);
            }
        }
        transitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_the_canonical_graph() {
        let transitions = StateTransitions::default();
        assert!(transitions.contains(AgentState::Intake, AgentState::Explore));
        assert!(transitions.contains(AgentState::Decide, AgentState::Done));
        assert!(transitions.contains(AgentState::Validate, AgentState::Explore));
        assert!(!transitions.contains(AgentState::Intake, AgentState::Act));
        assert!(!transitions.contains(AgentState::Done, AgentState::Explore));
    }

    #[test]
    fn validate_rejects_missing_edges() {
        let transitions = StateTransitions::default();
        assert_eq!(
            transitions.validate(AgentState::Intake, AgentState::Act, false),
            Err(TransitionError::InvalidTransition {
                from: AgentState::Intake,
                to: AgentState::Act,
            })
        );
    }

    #[test]
    fn validate_accepts_canonical_edges() {
        let transitions = StateTransitions::default();
        assert!(transitions
            .validate(AgentState::Intake, AgentState::Explore, false)
            .is_ok());
    }

    #[test]
    fn exhausted_budget_blocks_ordinary_targets() {
        let transitions = StateTransitions::default();
        assert_eq!(
            transitions.validate(AgentState::Intake, AgentState::Explore, true),
            Err(TransitionError::BudgetExhausted {
                from: AgentState::Intake,
                to: AgentState::Explore,
            })
        );
    }

    #[test]
    fn exhausted_budget_still_allows_terminal_targets() {
        let transitions = StateTransitions::default();
        assert!(transitions
            .validate(AgentState::Explore, AgentState::Failed, true)
            .is_ok());
        assert!(transitions
            .validate(AgentState::Decide, AgentState::Done, true)
            .is_ok());
    }

    #[test]
    fn exhausted_budget_still_allows_act_target() {
        let transitions = StateTransitions::default();
        assert!(transitions
            .validate(AgentState::Decide, AgentState::Act, true)
            .is_ok());
    }

    #[test]
    fn done_is_reachable_from_every_non_terminal_state() {
        let transitions = StateTransitions::default();
        for state in [
            AgentState::Intake,
            AgentState::Explore,
            AgentState::Decide,
            AgentState::Act,
            AgentState::Validate,
        ] {
            assert!(transitions.is_reachable(state, AgentState::Done));
        }
    }

    #[test]
    fn nothing_is_reachable_from_failed() {
        let transitions = StateTransitions::default();
        assert!(!transitions.is_reachable(AgentState::Failed, AgentState::Done));
    }

    #[test]
    fn reachability_is_reflexive() {
        let transitions = StateTransitions::default();
        assert!(transitions.is_reachable(AgentState::Done, AgentState::Done));
    }

    #[test]
    fn custom_maps_start_empty() {
        let transitions = StateTransitions::empty();
        assert!(!transitions.contains(AgentState::Intake, AgentState::Explore));
    }
}
