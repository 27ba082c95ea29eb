use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

/// Produces single-channel (grayscale) copies of raster images.
#[async_trait]
pub trait ImageConverter: Send + Sync {
    async fn convert_file(
        &self,
        source: &Path,
        target: &Path,
    ) -> Result<(), ImageConverterError>;

    /// Decodes `data` and writes the grayscale result as PNG.
    async fn convert_bytes(
        &self,
        data: Vec<u8>,
        target: &Path,
    ) -> Result<(), ImageConverterError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ImageConverterError {
    #[error("failed to read source image: {0}")]
    Read(String),
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error("failed to write converted image: {0}")]
    Write(String),
    #[error("image io timed out after {0:?}")]
    Timeout(Duration),
}
