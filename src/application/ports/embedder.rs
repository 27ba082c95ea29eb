use async_trait::async_trait;

use crate::domain::Embedding;

#[derive(Debug, thiserror::Error)]
pub enum EmbedderError {
    #[error("embedding request failed: {0}")]
    RequestFailed(String),
    #[error("embedding backend rate limited")]
    RateLimited,
    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),
    #[error("invalid embedder configuration: {0}")]
    InvalidConfiguration(String),
}

/// Turns text into fixed-length vectors. Every call on one backend returns
/// vectors of the same length.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbedderError>;

    /// One embedding per input, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbedderError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }
}
