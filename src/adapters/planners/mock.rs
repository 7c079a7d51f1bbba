//! Mock planner for unit tests.
//!
//! Returns a pre-set decision on every call. Once the preset list is
//! exhausted the planner fails the run, so a misbehaving test cannot loop
//! forever.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::domain::Decision;
use crate::ports::{PlanRequest, Planner, PlannerError};

/// Planner that replays a fixed list of decisions in order.
///
/// For a single-decision planner use [`MockPlanner::returning`].
pub struct MockPlanner {
    decisions: Mutex<Vec<Decision>>,
}

impl MockPlanner {
    /// Creates a planner that returns the given decisions in order.
    pub fn new(decisions: Vec<Decision>) -> Self {
        let mut reversed = decisions;
        reversed.reverse();
        Self {
            decisions: Mutex::new(reversed),
        }
    }

    /// Creates a planner that returns one decision, then fails.
    pub fn returning(decision: Decision) -> Self {
        Self::new(vec![decision])
    }

    /// Number of decisions not yet served.
    pub fn remaining(&self) -> usize {
        self.decisions
            .lock()
            .expect("MockPlanner: decisions lock poisoned")
            .len()
    }
}

#[async_trait]
impl Planner for MockPlanner {
    async fn plan(&self, _request: PlanRequest) -> Result<Decision, PlannerError> {
        let mut decisions = self
            .decisions
            .lock()
            .expect("MockPlanner: decisions lock poisoned");
        match decisions.pop() {
            Some(decision) => Ok(decision),
            None => Ok(Decision::fail("mock planner out of decisions")),
        }
    }
}
