//! Tool eligibility - Which tools may run in which state.

use std::collections::{BTreeSet, HashMap};

use crate::domain::AgentState;

/// Mapping from state to the set of tool names permitted in that state.
///
/// The `is_allowed` query is total: unknown pairs answer false. Eligibility
/// says nothing about whether a tool exists; the engine checks the registry
/// separately.
#[derive(Debug, Clone, Default)]
pub struct ToolEligibility {
    allowed: HashMap<AgentState, BTreeSet<String>>,
}

impl ToolEligibility {
    /// Creates an empty eligibility map; nothing is allowed anywhere.
    pub fn new() -> Self {
        Self::default()
    }

    /// Permits a tool in a state.
    pub fn allow(&mut self, state: AgentState, tool: impl Into<String>) -> &mut Self {
        self.allowed.entry(state).or_default().insert(tool.into());
        self
    }

    /// Builder-style variant of [`allow`](Self::allow).
    pub fn with_allowed(mut self, state: AgentState, tool: impl Into<String>) -> Self {
        self.allow(state, tool);
        self
    }

    /// Returns true if the tool is permitted in the state.
    pub fn is_allowed(&self, state: AgentState, tool: &str) -> bool {
        self.allowed
            .get(&state)
            .map(|tools| tools.contains(tool))
            .unwrap_or(false)
    }

    /// Returns the tools permitted in a state, sorted for determinism.
    pub fn allowed_in(&self, state: AgentState) -> Vec<String> {
        self.allowed
            .get(&state)
            .map(|tools| tools.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_pairs_are_not_allowed() {
        let eligibility = ToolEligibility::new();
        assert!(!eligibility.is_allowed(AgentState::Explore, "echo"));
    }

    #[test]
    fn allow_makes_the_pair_eligible() {
        let mut eligibility = ToolEligibility::new();
        eligibility.allow(AgentState::Explore, "echo");
        assert!(eligibility.is_allowed(AgentState::Explore, "echo"));
        assert!(!eligibility.is_allowed(AgentState::Act, "echo"));
    }

    #[test]
    fn allowed_in_returns_sorted_names() {
        let eligibility = ToolEligibility::new()
            .with_allowed(AgentState::Explore, "zeta")
            .with_allowed(AgentState::Explore, "alpha");
        assert_eq!(
            eligibility.allowed_in(AgentState::Explore),
            vec!["alpha", "zeta"]
        );
    }

    #[test]
    fn allowed_in_is_empty_for_unknown_state() {
        let eligibility = ToolEligibility::new();
        assert!(eligibility.allowed_in(AgentState::Validate).is_empty());
    }

    #[test]
    fn allowing_twice_is_idempotent() {
        let mut eligibility = ToolEligibility::new();
        eligibility.allow(AgentState::Explore, "echo");
        eligibility.allow(AgentState::Explore, "echo");
        assert_eq!(eligibility.allowed_in(AgentState::Explore).len(), 1);
    }
}
