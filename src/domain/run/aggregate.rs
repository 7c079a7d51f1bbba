//! Run aggregate - The root entity for one engine execution.
//!
//! A Run owns its evidence and tracks state, status, result, and timing.
//! Once the run reaches a terminal status every mutator fails; the engine
//! exclusively owns the Run for the lifetime of a `run()` call.

use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::domain::foundation::{RunId, Timestamp};
use crate::domain::AgentState;

use super::{EvidenceKind, EvidenceRecord, EvidenceSource, RunStatus};

/// Errors from run mutators.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RunError {
    /// The run is terminal; only reads are permitted.
    #[error("run {0} is terminal and cannot be modified")]
    Terminal(RunId),

    /// A result may only be set while finishing the run.
    #[error("run {0} is not finishing; result rejected")]
    NotFinishing(RunId),
}

/// The Run aggregate root.
///
/// Created in `intake` with status `running`. Terminal state and terminal
/// status move together: `done` ⇔ `completed`, `failed` ⇔ `failed`, and a
/// cancelled run keeps its last state with status `cancelled`.
#[derive(Debug, Clone)]
pub struct Run {
    id: RunId,
    goal: String,
    state: AgentState,
    status: RunStatus,
    evidence: Vec<EvidenceRecord>,
    result: Option<JsonValue>,
    error: Option<String>,
    created_at: Timestamp,
    started_at: Timestamp,
    ended_at: Option<Timestamp>,
}

impl Run {
    /// Creates a new running run for a goal.
    pub fn new(goal: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id: RunId::new(),
            goal: goal.into(),
            state: AgentState::Intake,
            status: RunStatus::Running,
            evidence: Vec::new(),
            result: None,
            error: None,
            created_at: now,
            started_at: now,
            ended_at: None,
        }
    }

    /// Reconstitutes a run from persisted data.
    ///
    /// Used by run-store implementations; bypasses invariant-checked
    /// mutation but expects internally consistent fields.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: RunId,
        goal: String,
        state: AgentState,
        status: RunStatus,
        evidence: Vec<EvidenceRecord>,
        result: Option<JsonValue>,
        error: Option<String>,
        created_at: Timestamp,
        started_at: Timestamp,
        ended_at: Option<Timestamp>,
    ) -> Self {
        Self {
            id,
            goal,
            state,
            status,
            evidence,
            result,
            error,
            created_at,
            started_at,
            ended_at,
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Accessors
    // ───────────────────────────────────────────────────────────────

    /// Returns the run ID.
    pub fn id(&self) -> RunId {
        self.id
    }

    /// Returns the goal the run was created for.
    pub fn goal(&self) -> &str {
        &self.goal
    }

    /// Returns the current state.
    pub fn state(&self) -> AgentState {
        self.state
    }

    /// Returns the lifecycle status.
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Returns the evidence sequence in order.
    pub fn evidence(&self) -> &[EvidenceRecord] {
        &self.evidence
    }

    /// Returns the final result document, if the run completed.
    pub fn result(&self) -> Option<&JsonValue> {
        self.result.as_ref()
    }

    /// Returns the error string, if the run failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns when the run was created.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns when the step loop started.
    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    /// Returns when the run ended, if it has.
    pub fn ended_at(&self) -> Option<Timestamp> {
        self.ended_at
    }

    /// True if the run is still running.
    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }

    // ───────────────────────────────────────────────────────────────
    // Mutators (all fail once the run is terminal)
    // ───────────────────────────────────────────────────────────────

    /// Moves the run to another state.
    ///
    /// Graph validity is the policy layer's concern; the aggregate keeps
    /// state and status consistent: entering `done` completes the run,
    /// entering `failed` fails it.
    pub fn transition_to(&mut self, state: AgentState) -> Result<(), RunError> {
        self.ensure_running()?;
        self.state = state;
        match state {
            AgentState::Done => {
                self.status = RunStatus::Completed;
                self.ended_at = Some(Timestamp::now());
            }
            AgentState::Failed => {
                self.status = RunStatus::Failed;
                self.ended_at = Some(Timestamp::now());
            }
            _ => {}
        }
        Ok(())
    }

    /// Fails the run with a reason, moving it to the failed state.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), RunError> {
        self.ensure_running()?;
        self.error = Some(reason.into());
        self.transition_to(AgentState::Failed)
    }

    /// Marks the run cancelled, keeping its current state.
    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<(), RunError> {
        self.ensure_running()?;
        self.error = Some(reason.into());
        self.status = RunStatus::Cancelled;
        self.ended_at = Some(Timestamp::now());
        Ok(())
    }

    /// Appends an evidence record with the next sequence number and a
    /// timestamp no earlier than the previous record's.
    pub fn append_evidence(
        &mut self,
        source: EvidenceSource,
        kind: EvidenceKind,
        content: JsonValue,
    ) -> Result<&EvidenceRecord, RunError> {
        self.ensure_running()?;
        // Clamp to the previous record if the clock stepped backwards.
        let timestamp = match self.evidence.last() {
            Some(last) => Timestamp::now().latest(last.timestamp),
            None => Timestamp::now(),
        };
        let record = EvidenceRecord {
            sequence: self.evidence.len() as u64,
            timestamp,
            source,
            kind,
            content,
        };
        self.evidence.push(record);
        Ok(self.evidence.last().expect("record was just pushed"))
    }

    /// Sets the final result document. Permitted only while the run is
    /// still running, during the finish dispatch.
    pub fn set_result(&mut self, result: JsonValue) -> Result<(), RunError> {
        self.ensure_running()?;
        self.result = Some(result);
        Ok(())
    }

    fn ensure_running(&self) -> Result<(), RunError> {
        if self.status.is_running() {
            Ok(())
        } else {
            Err(RunError::Terminal(self.id))
        }
    }
}
