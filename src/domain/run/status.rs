//! RunStatus enum for tracking the lifecycle of a run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an agent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The step loop is executing.
    #[default]
    Running,
    /// Terminal: the run finished with a result.
    Completed,
    /// Terminal: the run failed with an error.
    Failed,
    /// Terminal: the run was cancelled from outside.
    Cancelled,
}

impl RunStatus {
    /// Returns true if the run can still be modified.
    pub fn is_running(&self) -> bool {
        matches!(self, RunStatus::Running)
    }

    /// Returns true if the run has reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        !self.is_running()
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}
