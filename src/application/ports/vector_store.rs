use async_trait::async_trait;

use super::CollectionConfig;
use crate::domain::{Embedding, Fragment};

/// A fragment paired with its similarity to the query. Higher is closer.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub fragment: Fragment,
    pub score: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum VectorStoreError {
    #[error("collection does not exist")]
    CollectionMissing,
    #[error("invalid collection: {0}")]
    InvalidCollection(String),
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: u64, actual: u64 },
    #[error("{fragments} fragments but {embeddings} embeddings")]
    LengthMismatch { fragments: usize, embeddings: usize },
}

/// Single-collection similarity index backing the semantic index.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Returns `false` when the collection already exists.
    async fn create_collection(&self, config: &CollectionConfig) -> Result<bool, VectorStoreError>;

    async fn vector_size(&self) -> Result<Option<u64>, VectorStoreError>;

    /// Fragments and embeddings are paired by position. An existing fragment
    /// id is replaced.
    async fn upsert(
        &self,
        fragments: &[Fragment],
        embeddings: &[Embedding],
    ) -> Result<(), VectorStoreError>;

    async fn search(
        &self,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, VectorStoreError>;
}
