//! Artifact Store Port - Interface for storing opaque tool artifacts.
//!
//! Tools that produce large or binary outputs store them through this port
//! and thread the returned reference into their result; the engine never
//! inspects artifact content.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{ArtifactId, Timestamp};

/// Errors from artifact store operations.
#[derive(Debug, Clone, Error)]
pub enum ArtifactStoreError {
    /// No artifact with the given reference exists.
    #[error("artifact not found: {0}")]
    NotFound(String),

    /// The backing store rejected or failed the operation.
    #[error("artifact store failure: {0}")]
    Storage(String),
}

/// Reference to an artifact produced by a tool and stored externally.
///
/// The engine never inspects artifact content; it threads the reference
/// into evidence and results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Identifier assigned by the artifact store.
    pub id: ArtifactId,
    /// Size of the stored content in bytes.
    pub size: u64,
    /// MIME type of the stored content.
    pub content_type: String,
    /// When the artifact was stored.
    pub created_at: Timestamp,
}

/// Options supplied when storing an artifact.
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    /// MIME type of the content; defaults to octet-stream.
    pub content_type: Option<String>,
}

impl StoreOptions {
    /// Sets the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Port for artifact persistence.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Stores content and returns a reference to it.
    async fn store(&self, content: Vec<u8>, opts: StoreOptions)
        -> Result<ArtifactRef, ArtifactStoreError>;

    /// Retrieves the content behind a reference.
    async fn retrieve(&self, reference: &ArtifactRef) -> Result<Vec<u8>, ArtifactStoreError>;

    /// Deletes the content behind a reference.
    async fn delete(&self, reference: &ArtifactRef) -> Result<(), ArtifactStoreError>;

    /// Returns true if the reference resolves to stored content.
    async fn exists(&self, reference: &ArtifactRef) -> Result<bool, ArtifactStoreError>;

    /// Returns the stored metadata for an artifact id.
    async fn metadata(&self, id: ArtifactId) -> Result<ArtifactRef, ArtifactStoreError>;
}
