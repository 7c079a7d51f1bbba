//! Scripted planner for deterministic integration tests.
//!
//! Pops the next `(expected_state, decision)` pair on each call and fails
//! if the observed state does not match the expectation. This gives the
//! test suite full control over a run without an LLM in the loop.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::domain::{AgentState, Decision};
use crate::ports::{PlanRequest, Planner, PlannerError};

/// One scripted step: the state the planner expects to observe and the
/// decision it returns there.
#[derive(Debug, Clone)]
pub struct ScriptStep {
    /// State the run must be in when this step is served.
    pub expected_state: AgentState,
    /// Decision to return.
    pub decision: Decision,
}

impl ScriptStep {
    /// Creates a script step.
    pub fn new(expected_state: AgentState, decision: Decision) -> Self {
        Self {
            expected_state,
            decision,
        }
    }
}

/// Planner that replays an ordered script of `(expected_state, decision)`
/// pairs, erroring on a state mismatch or an exhausted script.
pub struct ScriptedPlanner {
    script: Mutex<Vec<ScriptStep>>,
    served: Mutex<usize>,
}

impl ScriptedPlanner {
    /// Creates a planner from an ordered script.
    pub fn new(script: Vec<ScriptStep>) -> Self {
        let mut reversed = script;
        reversed.reverse();
        Self {
            script: Mutex::new(reversed),
            served: Mutex::new(0),
        }
    }

    /// Convenience constructor from `(state, decision)` pairs.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (AgentState, Decision)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(state, decision)| ScriptStep::new(state, decision))
                .collect(),
        )
    }

    /// Number of steps not yet served.
    pub fn remaining(&self) -> usize {
        self.script
            .lock()
            .expect("ScriptedPlanner: script lock poisoned")
            .len()
    }
}

#[async_trait]
impl Planner for ScriptedPlanner {
    async fn plan(&self, request: PlanRequest) -> Result<Decision, PlannerError> {
        let mut script = self
            .script
            .lock()
            .expect("ScriptedPlanner: script lock poisoned");
        let mut served = self
            .served
            .lock()
            .expect("ScriptedPlanner: served lock poisoned");
        let step = script
            .pop()
            .ok_or(PlannerError::ScriptExhausted { steps: *served })?;
        *served += 1;
        if step.expected_state != request.current_state {
            return Err(PlannerError::UnexpectedState {
                expected: step.expected_state,
                observed: request.current_state,
            });
        }
        Ok(step.decision)
    }
}
