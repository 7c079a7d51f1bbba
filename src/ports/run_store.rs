//! Run Store Port - Interface for run persistence.
//!
//! The core works entirely without a configured run store; when one is
//! present the engine saves the final run after the step loop exits.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::RunId;
use crate::domain::run::{Run, RunStatus};

/// Errors from run store operations.
#[derive(Debug, Clone, Error)]
pub enum RunStoreError {
    /// No run with the given ID exists.
    #[error("run not found: {0}")]
    NotFound(RunId),

    /// The backing store rejected or failed the operation.
    #[error("run store failure: {0}")]
    Storage(String),
}

/// Options for listing runs.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Only runs with this status.
    pub status: Option<RunStatus>,
    /// Maximum number of runs to return; unlimited when absent.
    pub limit: Option<usize>,
}

/// Port for run persistence.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Persists a run, replacing any existing run with the same ID.
    async fn save(&self, run: &Run) -> Result<(), RunStoreError>;

    /// Loads a run by ID.
    async fn load(&self, id: RunId) -> Result<Run, RunStoreError>;

    /// Lists runs, most recently created first.
    async fn list(&self, opts: ListOptions) -> Result<Vec<Run>, RunStoreError>;

    /// Counts stored runs.
    async fn count(&self) -> Result<usize, RunStoreError>;
}
