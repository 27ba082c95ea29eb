use async_trait::async_trait;
use url::Url;

/// Outbound HTTP used by the crawl worker. Every call is bounded by a
/// timeout owned by the implementation.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &Url) -> Result<String, PageFetcherError>;

    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, PageFetcherError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PageFetcherError {
    #[error("request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },
    #[error("request to {0} timed out")]
    Timeout(String),
    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },
    #[error("failed to read body from {url}: {reason}")]
    Body { url: String, reason: String },
}
