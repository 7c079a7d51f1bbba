//! AgentState enum - The canonical execution states of a run.
//!
//! A run moves through a fixed graph: intake gathers the goal, explore
//! collects information with read-only tools, decide plans the next step,
//! act performs side-effecting tool calls, validate verifies outcomes with
//! read-only tools, and done/failed terminate the run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::foundation::{Lifecycle, ValidationError};

/// Execution state of an agent run.
///
/// Ordered by graph position so state sets render deterministically.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    /// Parse and normalize the goal.
    #[default]
    Intake,
    /// Gather information; read-only tool calls only.
    Explore,
    /// Plan the next step.
    Decide,
    /// Perform mutating or external-effect tool calls.
    Act,
    /// Verify outcomes; read-only tool calls only.
    Validate,
    /// Terminal success.
    Done,
    /// Terminal failure.
    Failed,
}

impl AgentState {
    /// Returns every state in graph order.
    pub fn all() -> [AgentState; 7] {
        use AgentState::*;
        [Intake, Explore, Decide, Act, Validate, Done, Failed]
    }

    /// Returns true if side-effecting tools may execute in this state.
    ///
    /// Only `Act` permits tools whose annotations are not read-only.
    pub fn allows_side_effects(&self) -> bool {
        matches!(self, AgentState::Act)
    }
}

impl Lifecycle for AgentState {
    fn successors(&self) -> &'static [AgentState] {
        use AgentState::*;
        match self {
            Intake => &[Explore, Failed],
            Explore => &[Decide, Failed],
            Decide => &[Act, Done, Failed],
            Act => &[Validate, Failed],
            Validate => &[Done, Explore, Failed],
            Done | Failed => &[],
        }
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentState::Intake => "intake",
            AgentState::Explore => "explore",
            AgentState::Decide => "decide",
            AgentState::Act => "act",
            AgentState::Validate => "validate",
            AgentState::Done => "done",
            AgentState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for AgentState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "intake" => Ok(AgentState::Intake),
            "explore" => Ok(AgentState::Explore),
            "decide" => Ok(AgentState::Decide),
            "act" => Ok(AgentState::Act),
            "validate" => Ok(AgentState::Validate),
            "done" => Ok(AgentState::Done),
            "failed" => Ok(AgentState::Failed),
            other => Err(ValidationError::unparseable(
                "agent state",
                other,
                "one of intake, explore, decide, act, validate, done, failed",
            )),
        }
    }
}
