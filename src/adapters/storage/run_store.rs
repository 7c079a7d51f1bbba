//! In-memory run store for testing and single-process hosts.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::foundation::RunId;
use crate::domain::run::Run;
use crate::ports::{ListOptions, RunStore, RunStoreError};

/// Run store backed by a process-local map.
#[derive(Debug, Default)]
pub struct InMemoryRunStore {
    runs: RwLock<HashMap<RunId, Run>>,
}

impl InMemoryRunStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all stored runs (for test isolation).
    pub fn clear(&self) {
        self.runs
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

#[async_trait]
impl RunStore for InMemoryRunStore {
    async fn save(&self, run: &Run) -> Result<(), RunStoreError> {
        self.runs
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(run.id(), run.clone());
        Ok(())
    }

    async fn load(&self, id: RunId) -> Result<Run, RunStoreError> {
        self.runs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&id)
            .cloned()
            .ok_or(RunStoreError::NotFound(id))
    }

    async fn list(&self, opts: ListOptions) -> Result<Vec<Run>, RunStoreError> {
        let runs = self
            .runs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut matching: Vec<Run> = runs
            .values()
            .filter(|run| opts.status.map_or(true, |status| run.status() == status))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        if let Some(limit) = opts.limit {
            matching.truncate(limit);
        }
        Ok(matching)
    }

    async fn count(&self) -> Result<usize, RunStoreError> {
        Ok(self
            .runs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::run::RunStatus;
    use crate::domain::AgentState;

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = InMemoryRunStore::new();
        let run = Run::new("goal");
        store.save(&run).await.unwrap();
        let loaded = store.load(run.id()).await.unwrap();
        assert_eq!(loaded.id(), run.id());
        assert_eq!(loaded.goal(), "goal");
    }

    #[tokio::test]
    async fn load_of_unknown_run_fails() {
        let store = InMemoryRunStore::new();
        assert!(matches!(
            store.load(RunId::new()).await,
            Err(RunStoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let store = InMemoryRunStore::new();
        let running = Run::new("a");
        let mut done = Run::new("b");
        done.transition_to(AgentState::Done).unwrap();
        store.save(&running).await.unwrap();
        store.save(&done).await.unwrap();

        let completed = store
            .list(ListOptions {
                status: Some(RunStatus::Completed),
                limit: None,
            })
            .await
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].goal(), "b");
    }

    #[tokio::test]
    async fn count_tracks_saves() {
        let store = InMemoryRunStore::new();
        assert_eq!(store.count().await.unwrap(), 0);
        store.save(&Run::new("a")).await.unwrap();
        store.save(&Run::new("b")).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
    }
}
