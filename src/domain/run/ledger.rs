//! Ledger - Append-only record of every engine-internal operation.
//!
//! One ledger exists per run. Entries carry a contiguous sequence number
//! and a non-decreasing timestamp. After the run-finished entry the ledger
//! is frozen; further appends fail.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use thiserror::Error;

use crate::domain::foundation::Timestamp;

/// Errors from ledger operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The ledger saw its run-finished entry and accepts no more appends.
    #[error("ledger is frozen after run finished")]
    Frozen,
}

/// Classification of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    /// The planner returned a decision (or an error).
    DecisionMade,
    /// A tool attempt is about to execute.
    ToolStarted,
    /// A tool invocation completed successfully.
    ToolSucceeded,
    /// A tool invocation failed.
    ToolFailed,
    /// The run moved to another state.
    Transition,
    /// The engine asked the approver about a tool invocation.
    ApprovalRequested,
    /// The approver granted the invocation.
    ApprovalGranted,
    /// The approver denied the invocation.
    ApprovalDenied,
    /// A budget counter advanced.
    BudgetCharged,
    /// A charge was rejected because a counter hit its cap.
    BudgetExhausted,
    /// The run was created and the step loop entered.
    RunStarted,
    /// The run reached a terminal status.
    RunFinished,
}

impl fmt::Display for LedgerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LedgerKind::DecisionMade => "decision_made",
            LedgerKind::ToolStarted => "tool_started",
            LedgerKind::ToolSucceeded => "tool_succeeded",
            LedgerKind::ToolFailed => "tool_failed",
            LedgerKind::Transition => "transition",
            LedgerKind::ApprovalRequested => "approval_requested",
            LedgerKind::ApprovalGranted => "approval_granted",
            LedgerKind::ApprovalDenied => "approval_denied",
            LedgerKind::BudgetCharged => "budget_charged",
            LedgerKind::BudgetExhausted => "budget_exhausted",
            LedgerKind::RunStarted => "run_started",
            LedgerKind::RunFinished => "run_finished",
        };
        write!(f, "{}", s)
    }
}

/// One entry in a run's ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Position in the ledger; contiguous from zero.
    pub sequence: u64,
    /// When the entry was appended; non-decreasing within a ledger.
    pub timestamp: Timestamp,
    /// Classification.
    pub kind: LedgerKind,
    /// Opaque payload describing the operation.
    pub payload: JsonValue,
}

/// Append-only, per-run sequence of ledger entries.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
    frozen: bool,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, assigning the next sequence number and a timestamp
    /// no earlier than the previous entry's.
    ///
    /// Appending `RunFinished` freezes the ledger.
    pub fn append(&mut self, kind: LedgerKind, payload: JsonValue) -> Result<&LedgerEntry, LedgerError> {
        if self.frozen {
            return Err(LedgerError::Frozen);
        }
        // Clamp to the previous entry if the clock stepped backwards.
        let timestamp = match self.entries.last() {
            Some(last) => Timestamp::now().latest(last.timestamp),
            None => Timestamp::now(),
        };
        let entry = LedgerEntry {
            sequence: self.entries.len() as u64,
            timestamp,
            kind,
            payload,
        };
        if kind == LedgerKind::RunFinished {
            self.frozen = true;
        }
        self.entries.push(entry);
        Ok(self.entries.last().expect("entry was just pushed"))
    }

    /// Returns all entries in order.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Returns the entries of a given kind, in order.
    pub fn entries_of_kind(&self, kind: LedgerKind) -> Vec<&LedgerEntry> {
        self.entries.iter().filter(|e| e.kind == kind).collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True once the run-finished entry has been appended.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}
