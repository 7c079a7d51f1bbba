//! Decision - The planner's output.
//!
//! A closed tagged union of exactly five variants. Invalid combinations
//! (unknown tool name, forbidden transition) are detected at dispatch,
//! not at construction.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use super::AgentState;

/// One of the five actions a planner can propose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    /// Invoke a tool with an opaque input document.
    CallTool {
        name: String,
        input: JsonValue,
        reason: String,
    },
    /// Move the run to another state.
    Transition {
        target_state: AgentState,
        reason: String,
    },
    /// Ask a human for input.
    AskHuman { question: String },
    /// Finish the run successfully with a result document.
    Finish { reason: String, result: JsonValue },
    /// Fail the run.
    Fail { reason: String },
}

impl Decision {
    /// Creates a tool call decision.
    pub fn call_tool(
        name: impl Into<String>,
        input: JsonValue,
        reason: impl Into<String>,
    ) -> Self {
        Decision::CallTool {
            name: name.into(),
            input,
            reason: reason.into(),
        }
    }

    /// Creates a transition decision.
    pub fn transition(target_state: AgentState, reason: impl Into<String>) -> Self {
        Decision::Transition {
            target_state,
            reason: reason.into(),
        }
    }

    /// Creates an ask-human decision.
    pub fn ask_human(question: impl Into<String>) -> Self {
        Decision::AskHuman {
            question: question.into(),
        }
    }

    /// Creates a finish decision.
    pub fn finish(reason: impl Into<String>, result: JsonValue) -> Self {
        Decision::Finish {
            reason: reason.into(),
            result,
        }
    }

    /// Creates a fail decision.
    pub fn fail(reason: impl Into<String>) -> Self {
        Decision::Fail {
            reason: reason.into(),
        }
    }

    /// Short label used in ledger payloads and logs.
    pub fn variant_name(&self) -> &'static str {
        match self {
            Decision::CallTool { .. } => "call_tool",
            Decision::Transition { .. } => "transition",
            Decision::AskHuman { .. } => "ask_human",
            Decision::Finish { .. } => "finish",
            Decision::Fail { .. } => "fail",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::CallTool { name, .. } => write!(f, "call_tool({})", name),
            Decision::Transition { target_state, .. } => {
                write!(f, "transition({})", target_state)
            }
            Decision::AskHuman { .. } => write!(f, "ask_human"),
            Decision::Finish { .. } => write!(f, "finish"),
            Decision::Fail { .. } => write!(f, "fail"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn variant_names_are_stable() {
        assert_eq!(
            Decision::call_tool("echo", json!({}), "probe").variant_name(),
            "call_tool"
        );
        assert_eq!(
            Decision::transition(AgentState::Explore, "next").variant_name(),
            "transition"
        );
        assert_eq!(Decision::ask_human("ok?").variant_name(), "ask_human");
        assert_eq!(Decision::finish("done", json!(null)).variant_name(), "finish");
        assert_eq!(Decision::fail("broken").variant_name(), "fail");
    }

    #[test]
    fn serializes_with_a_kind_tag() {
        let decision = Decision::call_tool("echo", json!({"m": "hi"}), "probe");
        let value = serde_json::to_value(&decision).unwrap();
        assert_eq!(value["kind"], "call_tool");
        assert_eq!(value["name"], "echo");
    }

    #[test]
    fn round_trips_through_json() {
        let decision = Decision::transition(AgentState::Act, "ready to act");
        let json = serde_json::to_string(&decision).unwrap();
        let back: Decision = serde_json::from_str(&json).unwrap();
        assert_eq!(decision, back);
    }

    #[test]
    fn display_names_the_tool() {
        let decision = Decision::call_tool("fetch", json!({}), "");
        assert_eq!(decision.to_string(), "call_tool(fetch)");
    }
}
