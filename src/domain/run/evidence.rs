//! Evidence - Planner-visible observations accumulated by a run.
//!
//! Evidence is append-only. Each record carries a contiguous sequence
//! number (equal to the length before the append) and a non-decreasing
//! timestamp. The planner receives the full ordered sequence on every step.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::foundation::Timestamp;

/// Where an evidence record came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum EvidenceSource {
    /// Output of a named tool.
    Tool { name: String },
    /// Produced by the engine itself.
    Engine,
}

impl EvidenceSource {
    /// Creates a tool source.
    pub fn tool(name: impl Into<String>) -> Self {
        EvidenceSource::Tool { name: name.into() }
    }
}

/// Classification of an evidence record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    /// The output document of a successful tool call.
    ToolOutput,
    /// A state transition the run performed.
    Transition,
    /// An explicit observation recorded by a collaborator.
    Observation,
}

/// One observation in a run's evidence sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    /// Position in the sequence; contiguous from zero.
    pub sequence: u64,
    /// When the record was appended; non-decreasing within a run.
    pub timestamp: Timestamp,
    /// Origin of the observation.
    pub source: EvidenceSource,
    /// Classification.
    pub kind: EvidenceKind,
    /// Opaque content document.
    pub content: JsonValue,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_source_carries_the_name() {
        let source = EvidenceSource::tool("echo");
        assert_eq!(source, EvidenceSource::Tool { name: "echo".to_string() });
    }

    #[test]
    fn record_round_trips_through_json() {
        let record = EvidenceRecord {
            sequence: 0,
            timestamp: Timestamp::now(),
            source: EvidenceSource::tool("echo"),
            kind: EvidenceKind::ToolOutput,
            content: json!({"echoed": "hi"}),
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: EvidenceRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }

    #[test]
    fn kind_serializes_to_snake_case() {
        assert_eq!(
            serde_json::to_string(&EvidenceKind::ToolOutput).unwrap(),
            "\"tool_output\""
        );
    }
}
