//! Planner Port - Interface for deciding the next action of a run.
//!
//! The planner is a pure function over the run's visible context: given the
//! current state, the evidence so far, the tools allowed here, and a budget
//! snapshot, it proposes exactly one Decision. The engine validates the
//! decision against policy at dispatch; the planner performs no side effects
//! of its own.
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//! use waypoint::ports::{PlanRequest, Planner, PlannerError};
//! use waypoint::domain::Decision;
//!
//! struct AlwaysFail;
//!
//! #[async_trait]
//! impl Planner for AlwaysFail {
//!     async fn plan(&self, _request: PlanRequest) -> Result<Decision, PlannerError> {
//!         Ok(Decision::fail("nothing to do"))
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::foundation::RunId;
use crate::domain::policy::BudgetSnapshot;
use crate::domain::run::EvidenceRecord;
use crate::domain::AgentState;

/// Errors a planner can produce.
///
/// Any planner error fails the step: the engine records the error and
/// moves the run to `failed` with reason `planner_error`.
#[derive(Debug, Clone, Error)]
pub enum PlannerError {
    /// The planner's backing service could not be reached.
    #[error("planner unavailable: {0}")]
    Unavailable(String),

    /// The planner produced output it could not shape into a Decision.
    #[error("planner produced an invalid decision: {0}")]
    InvalidDecision(String),

    /// The planner observed a state it did not expect.
    #[error("planner expected state {expected} but observed {observed}")]
    UnexpectedState {
        expected: AgentState,
        observed: AgentState,
    },

    /// The planner has no further decisions to offer.
    #[error("planner script exhausted after {steps} steps")]
    ScriptExhausted { steps: usize },
}

/// Everything a planner may consider when proposing the next action.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    /// Run the decision is for.
    pub run_id: RunId,
    /// State the run is currently in.
    pub current_state: AgentState,
    /// Ordered, append-only view of the run's evidence.
    pub evidence: Vec<EvidenceRecord>,
    /// Names of the tools allowed in the current state, sorted.
    pub allowed_tools: Vec<String>,
    /// Atomic view of all budget counters.
    pub budgets: BudgetSnapshot,
    /// Arbitrary run variables supplied by the host.
    pub vars: HashMap<String, JsonValue>,
}

/// Port for planning the next action of a run.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Proposes the next decision for the run.
    async fn plan(&self, request: PlanRequest) -> Result<crate::domain::Decision, PlannerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planner_errors_render_helpful_messages() {
        let err = PlannerError::UnexpectedState {
            expected: AgentState::Explore,
            observed: AgentState::Act,
        };
        assert!(err.to_string().contains("explore"));
        assert!(err.to_string().contains("act"));
    }

    #[test]
    fn script_exhaustion_reports_step_count() {
        let err = PlannerError::ScriptExhausted { steps: 3 };
        assert!(err.to_string().contains('3'));
    }
}
