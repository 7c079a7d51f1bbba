//! In-memory artifact store for testing and single-process hosts.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::foundation::{ArtifactId, Timestamp};
use crate::ports::{ArtifactRef, ArtifactStore, ArtifactStoreError, StoreOptions};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone)]
struct StoredArtifact {
    reference: ArtifactRef,
    content: Vec<u8>,
}

/// Artifact store backed by a process-local map.
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    artifacts: RwLock<HashMap<ArtifactId, StoredArtifact>>,
}

impl InMemoryArtifactStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts.
    pub fn artifact_count(&self) -> usize {
        self.artifacts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn store(
        &self,
        content: Vec<u8>,
        opts: StoreOptions,
    ) -> Result<ArtifactRef, ArtifactStoreError> {
        let reference = ArtifactRef {
            id: ArtifactId::new(),
            size: content.len() as u64,
            content_type: opts
                .content_type
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            created_at: Timestamp::now(),
        };
        self.artifacts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(
                reference.id,
                StoredArtifact {
                    reference: reference.clone(),
                    content,
                },
            );
        Ok(reference)
    }

    async fn retrieve(&self, reference: &ArtifactRef) -> Result<Vec<u8>, ArtifactStoreError> {
        self.artifacts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&reference.id)
            .map(|stored| stored.content.clone())
            .ok_or_else(|| ArtifactStoreError::NotFound(reference.id.to_string()))
    }

    async fn delete(&self, reference: &ArtifactRef) -> Result<(), ArtifactStoreError> {
        self.artifacts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&reference.id)
            .map(|_| ())
            .ok_or_else(|| ArtifactStoreError::NotFound(reference.id.to_string()))
    }

    async fn exists(&self, reference: &ArtifactRef) -> Result<bool, ArtifactStoreError> {
        Ok(self
            .artifacts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(&reference.id))
    }

    async fn metadata(&self, id: ArtifactId) -> Result<ArtifactRef, ArtifactStoreError> {
        self.artifacts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&id)
            .map(|stored| stored.reference.clone())
            .ok_or_else(|| ArtifactStoreError::NotFound(id.to_string()))
    }
}
