use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
#[error("invalid splitter configuration: {0}")]
pub struct TextSplitterError(pub String);

/// Cuts a document into chunks small enough to embed individually.
#[async_trait]
pub trait TextSplitter: Send + Sync {
    async fn split(&self, text: &str) -> Result<Vec<String>, TextSplitterError>;
}
