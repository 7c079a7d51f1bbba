//! Engine hooks - Optional observer middleware.
//!
//! Hooks observe the step loop; they cannot veto or mutate it. Hosts use
//! them for metrics, logging, or progress reporting.

use std::time::Duration;

use crate::domain::foundation::RunId;
use crate::domain::run::Run;
use crate::domain::{AgentState, Decision};

/// Observer of engine progress. All methods default to no-ops.
pub trait EngineHook: Send + Sync {
    /// A step is about to run.
    fn on_step_started(&self, _run_id: RunId, _state: AgentState, _step: u32) {}

    /// The planner returned a decision.
    fn on_decision(&self, _run_id: RunId, _decision: &Decision) {}

    /// A tool invocation finished.
    fn on_tool_result(&self, _run_id: RunId, _tool: &str, _success: bool, _duration: Duration) {}

    /// The run reached a terminal status.
    fn on_run_finished(&self, _run: &Run) {}
}
