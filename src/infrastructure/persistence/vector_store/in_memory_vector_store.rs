use std::cmp::Ordering;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::ports::{
    CollectionConfig, DistanceMetric, SearchResult, VectorStore, VectorStoreError,
};
use crate::domain::{Embedding, Fragment};

/// Brute-force in-process vector index. Appends and searches may run
/// concurrently; the lock makes each upsert atomic with respect to search.
#[derive(Default)]
pub struct InMemoryVectorStore {
    collection: RwLock<Option<Collection>>,
}

struct Collection {
    config: CollectionConfig,
    entries: Vec<(Fragment, Embedding)>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.collection
            .read()
            .await
            .as_ref()
            .map(|c| c.entries.len())
            .unwrap_or(0)
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn create_collection(&self, config: &CollectionConfig) -> Result<bool, VectorStoreError> {
        if config.vector_dimensions == 0 {
            return Err(VectorStoreError::InvalidCollection(
                "vector dimensions must be positive".to_string(),
            ));
        }

        let mut collection = self.collection.write().await;
        if collection.is_some() {
            return Ok(false);
        }

        *collection = Some(Collection {
            config: config.clone(),
            entries: Vec::new(),
        });
        Ok(true)
    }

    async fn vector_size(&self) -> Result<Option<u64>, VectorStoreError> {
        Ok(self
            .collection
            .read()
            .await
            .as_ref()
            .map(|c| c.config.vector_dimensions))
    }

    async fn upsert(
        &self,
        fragments: &[Fragment],
        embeddings: &[Embedding],
    ) -> Result<(), VectorStoreError> {
        if fragments.len() != embeddings.len() {
            return Err(VectorStoreError::LengthMismatch {
                fragments: fragments.len(),
                embeddings: embeddings.len(),
            });
        }

        let mut guard = self.collection.write().await;
        let collection = guard.as_mut().ok_or(VectorStoreError::CollectionMissing)?;
        let expected = collection.config.vector_dimensions;

        if let Some(bad) = embeddings
            .iter()
            .find(|e| e.dimensions() as u64 != expected)
        {
            return Err(VectorStoreError::DimensionMismatch {
                expected,
                actual: bad.dimensions() as u64,
            });
        }

        for (fragment, embedding) in fragments.iter().zip(embeddings) {
            match collection
                .entries
                .iter_mut()
                .find(|(existing, _)| existing.id == fragment.id)
            {
                Some(entry) => *entry = (fragment.clone(), embedding.clone()),
                None => collection
                    .entries
                    .push((fragment.clone(), embedding.clone())),
            }
        }

        Ok(())
    }

    async fn search(
        &self,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, VectorStoreError> {
        let guard = self.collection.read().await;
        let collection = guard.as_ref().ok_or(VectorStoreError::CollectionMissing)?;

        let expected = collection.config.vector_dimensions;
        if embedding.dimensions() as u64 != expected {
            return Err(VectorStoreError::DimensionMismatch {
                expected,
                actual: embedding.dimensions() as u64,
            });
        }

        let metric = collection.config.distance_metric;
        let mut results: Vec<SearchResult> = collection
            .entries
            .iter()
            .map(|(fragment, stored)| SearchResult {
                fragment: fragment.clone(),
                score: score(metric, embedding, stored),
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        results.truncate(top_k);
        Ok(results)
    }
}

/// Higher is always closer.
fn score(metric: DistanceMetric, query: &Embedding, stored: &Embedding) -> f32 {
    match metric {
        DistanceMetric::Cosine => query.cosine_similarity(stored),
        DistanceMetric::DotProduct => query.dot(stored),
        DistanceMetric::Euclidean => 1.0 / (1.0 + query.euclidean_distance(stored)),
    }
}
