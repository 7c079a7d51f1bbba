//! In-memory event store for testing and single-process hosts.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::foundation::RunId;
use crate::ports::{EventStore, EventStoreError, StoredEvent};

/// Event store backed by a process-local map of ordered event lists.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: RwLock<HashMap<RunId, Vec<StoredEvent>>>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored events across all runs.
    pub fn event_count(&self) -> usize {
        self.events
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .map(|events| events.len())
            .sum()
    }

    /// Clears all stored events (for test isolation).
    pub fn clear(&self) {
        self.events
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: Vec<StoredEvent>) -> Result<(), EventStoreError> {
        let mut store = self
            .events
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for event in events {
            store.entry(event.run_id).or_default().push(event);
        }
        Ok(())
    }

    async fn load(&self, run_id: RunId) -> Result<Vec<StoredEvent>, EventStoreError> {
        let mut events = self
            .events
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&run_id)
            .cloned()
            .unwrap_or_default();
        events.sort_by_key(|event| event.sequence);
        Ok(events)
    }
}
