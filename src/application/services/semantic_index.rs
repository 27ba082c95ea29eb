use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::application::ports::{
    CollectionConfig, Embedder, EmbedderError, SearchResult, TextSplitter, TextSplitterError,
    VectorStore, VectorStoreError,
};
use crate::domain::{Fragment, FragmentId, FragmentMetadata};

/// Text embedded once during construction to discover the backend's vector
/// dimensionality.
pub const PROBE_TEXT: &str = "dimension probe";

/// Process-wide handle to the semantic index.
///
/// The index is built on first use: the embedder is probed for its vector
/// length and the backing collection is created with that size. Concurrent
/// first callers wait on the same construction, which runs at most once. A
/// failed construction is not cached, so a later caller retries it.
pub struct SemanticIndexCache {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    splitter: Arc<dyn TextSplitter>,
    index: OnceCell<Arc<SemanticIndex>>,
}

pub struct SemanticIndex {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    splitter: Arc<dyn TextSplitter>,
    dimensions: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum SemanticIndexError {
    #[error("embedding: {0}")]
    Embedding(#[from] EmbedderError),
    #[error("vector store: {0}")]
    Store(#[from] VectorStoreError),
    #[error("text splitting: {0}")]
    Splitting(#[from] TextSplitterError),
    #[error("embedding backend returned an empty probe vector")]
    EmptyProbe,
    #[error("existing collection has {existing} dimensions, backend produces {probed}")]
    DimensionMismatch { existing: u64, probed: u64 },
}

impl SemanticIndexCache {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        splitter: Arc<dyn TextSplitter>,
    ) -> Self {
        Self {
            embedder,
            store,
            splitter,
            index: OnceCell::new(),
        }
    }

    pub fn is_constructed(&self) -> bool {
        self.index.initialized()
    }

    pub async fn get_or_create(&self) -> Result<Arc<SemanticIndex>, SemanticIndexError> {
        if let Some(index) = self.index.get() {
            return Ok(Arc::clone(index));
        }

        let index = self.index.get_or_try_init(|| self.construct()).await?;
        Ok(Arc::clone(index))
    }

    async fn construct(&self) -> Result<Arc<SemanticIndex>, SemanticIndexError> {
        let probe = self.embedder.embed(PROBE_TEXT).await?;
        let dimensions = probe.dimensions();
        if dimensions == 0 {
            return Err(SemanticIndexError::EmptyProbe);
        }

        let config = CollectionConfig::new(dimensions as u64);
        let created = self.store.create_collection(&config).await?;
        if !created {
            if let Some(existing) = self.store.vector_size().await? {
                if existing != dimensions as u64 {
                    return Err(SemanticIndexError::DimensionMismatch {
                        existing,
                        probed: dimensions as u64,
                    });
                }
            }
        }

        tracing::info!(dimensions, created, "Semantic index initialized");

        Ok(Arc::new(SemanticIndex {
            embedder: Arc::clone(&self.embedder),
            store: Arc::clone(&self.store),
            splitter: Arc::clone(&self.splitter),
            dimensions,
        }))
    }
}

impl SemanticIndex {
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub async fn add(
        &self,
        text: &str,
        metadata: FragmentMetadata,
    ) -> Result<FragmentId, SemanticIndexError> {
        let embedding = self.embedder.embed(text).await?;
        let fragment = Fragment::new(text.to_string(), metadata);
        let id = fragment.id;

        self.store.upsert(&[fragment], &[embedding]).await?;
        tracing::debug!(fragment_id = %id.as_uuid(), "Fragment added to semantic index");

        Ok(id)
    }

    /// Splits `text` into overlapping chunks and indexes each one with a copy
    /// of `metadata`.
    pub async fn add_document(
        &self,
        text: &str,
        metadata: FragmentMetadata,
    ) -> Result<Vec<FragmentId>, SemanticIndexError> {
        let chunks = self.splitter.split(text).await?;
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let fragments: Vec<Fragment> = chunks
            .into_iter()
            .map(|chunk| Fragment::new(chunk, metadata.clone()))
            .collect();
        let ids = fragments.iter().map(|f| f.id).collect();

        self.store.upsert(&fragments, &embeddings).await?;
        tracing::debug!(chunks = fragments.len(), "Document added to semantic index");

        Ok(ids)
    }

    /// At most `top_k` matches, best first.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, SemanticIndexError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(query).await?;
        let mut results = self.store.search(&embedding, top_k).await?;
        results.truncate(top_k);
        Ok(results)
    }
}
