//! Event Store Port - Durable, ordered projection of a run's ledger.
//!
//! Each ledger entry becomes one stored event. Payload layout beyond the
//! envelope fields is the event store's concern, not the core's.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::domain::foundation::{EventId, RunId, Timestamp};
use crate::domain::run::LedgerKind;

/// Errors from event store operations.
#[derive(Debug, Clone, Error)]
pub enum EventStoreError {
    /// The backing store rejected or failed the operation.
    #[error("event store failure: {0}")]
    Storage(String),
}

/// One persisted engine event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Unique identifier for deduplication.
    pub event_id: EventId,
    /// Run the event belongs to.
    pub run_id: RunId,
    /// Position within the run's ledger.
    pub sequence: u64,
    /// Ledger kind of the event.
    pub kind: LedgerKind,
    /// When the underlying ledger entry was appended.
    pub occurred_at: Timestamp,
    /// Opaque payload.
    pub payload: JsonValue,
}

/// Port for ordered event persistence per run.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends events for a run, preserving order.
    async fn append(&self, events: Vec<StoredEvent>) -> Result<(), EventStoreError>;

    /// Loads all events for a run in sequence order.
    async fn load(&self, run_id: RunId) -> Result<Vec<StoredEvent>, EventStoreError>;
}
