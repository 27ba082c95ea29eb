use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;
use url::Url;
use uuid::Uuid;

use super::job_lifecycle::{Claim, JobLifecycle};
use super::semantic_index::SemanticIndexCache;
use super::worker_error::WorkerError;
use crate::application::ports::{
    ImageConverter, ImageConverterError, ImageLinkExtractor, PageFetcher, PageFetcherError,
};
use crate::domain::{FragmentMetadata, JobId, JobOutcome, ProcessedFile};

pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

const PAGE_PARSED_PROGRESS: u8 = 50;
const IMAGES_DONE_PROGRESS: u8 = 95;

/// Fetches a page, harvests up to `limit` image references and converts each
/// one independently. A bad image only shrinks the result set; the job fails
/// when the page cannot be fetched or when nothing usable was produced.
pub struct CrawlWorker {
    lifecycle: Arc<JobLifecycle>,
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<dyn ImageLinkExtractor>,
    converter: Arc<dyn ImageConverter>,
    semantic_index: Option<Arc<SemanticIndexCache>>,
    output_dir: PathBuf,
}

#[derive(Debug, thiserror::Error)]
enum HarvestError {
    #[error("download: {0}")]
    Download(#[from] PageFetcherError),
    #[error("conversion: {0}")]
    Conversion(#[from] ImageConverterError),
}

impl CrawlWorker {
    pub fn new(
        lifecycle: Arc<JobLifecycle>,
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<dyn ImageLinkExtractor>,
        converter: Arc<dyn ImageConverter>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            lifecycle,
            fetcher,
            extractor,
            converter,
            semantic_index: None,
            output_dir,
        }
    }

    /// Records every harvested image in the semantic index.
    pub fn with_semantic_index(mut self, semantic_index: Arc<SemanticIndexCache>) -> Self {
        self.semantic_index = Some(semantic_index);
        self
    }

    pub async fn run(&self, job_id: &JobId, url: &Url, limit: u32) -> Result<(), WorkerError> {
        match self.lifecycle.claim(job_id).await? {
            Claim::Claimed(_) => {}
            Claim::Vanished | Claim::AlreadyTerminal(_) => return Ok(()),
        }

        tracing::info!(url = %url, limit, "Start parsing page");

        let html = match self.fetcher.fetch_page(url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::error!(error = %e, "Page fetch failed");
                self.lifecycle
                    .fail(job_id, format!("page fetch: {}", e), None)
                    .await?;
                return Ok(());
            }
        };

        // Truncation happens before the extension filter, so unsupported
        // references still consume the limit.
        let mut candidates = self.extractor.extract(&html, url);
        candidates.truncate(limit as usize);
        let parsed_data: Vec<String> = candidates.iter().map(Url::to_string).collect();

        self.lifecycle.advance(job_id, PAGE_PARSED_PROGRESS).await?;

        let total = candidates.len();
        let mut processed_files = Vec::new();

        for (index, candidate) in candidates.iter().enumerate() {
            if !has_supported_extension(candidate) {
                tracing::warn!(image_url = %candidate, "Skip unsupported format");
            } else {
                match self.harvest(job_id, url, candidate).await {
                    Ok(file) => {
                        tracing::info!(filename = %file.filename, "Saved harvested image");
                        processed_files.push(file);
                    }
                    Err(e) => {
                        tracing::warn!(image_url = %candidate, error = %e, "Failed to process image");
                    }
                }
            }

            self.lifecycle
                .advance(job_id, image_progress(index + 1, total))
                .await?;
        }

        tracing::info!(
            discovered = total,
            processed = processed_files.len(),
            "Finished parsing page"
        );

        let usable = !processed_files.is_empty();
        let outcome = JobOutcome::Parsed {
            parsed_data,
            processed_files,
        };

        if usable {
            self.lifecycle.complete(job_id, outcome).await?;
        } else {
            self.lifecycle
                .fail(job_id, "no images could be processed", Some(outcome))
                .await?;
        }

        Ok(())
    }

    async fn harvest(
        &self,
        job_id: &JobId,
        page_url: &Url,
        image_url: &Url,
    ) -> Result<ProcessedFile, HarvestError> {
        tracing::debug!(image_url = %image_url, "Downloading image");
        let data = self.fetcher.fetch_bytes(image_url).await?;

        let filename = format!("parsed_{}.png", Uuid::new_v4().simple());
        let target = self.output_dir.join(&filename);
        self.converter.convert_bytes(data, &target).await?;

        let file = ProcessedFile::new(filename, target.display().to_string())
            .with_source_url(image_url.to_string());

        self.record(job_id, page_url, &file, &target).await;

        Ok(file)
    }

    async fn record(&self, job_id: &JobId, page_url: &Url, file: &ProcessedFile, target: &Path) {
        let Some(cache) = &self.semantic_index else {
            return;
        };

        let text = format!(
            "Image {} harvested from page {}",
            file.source_url.as_deref().unwrap_or_default(),
            page_url
        );
        let mut metadata = FragmentMetadata::new();
        metadata.insert("job_id".to_string(), json!(job_id.as_str()));
        metadata.insert("page_url".to_string(), json!(page_url.as_str()));
        metadata.insert("source_url".to_string(), json!(file.source_url));
        metadata.insert("file_path".to_string(), json!(target.display().to_string()));

        let result = match cache.get_or_create().await {
            Ok(index) => index.add(&text, metadata).await.map(|_| ()),
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to record harvested image in semantic index");
        }
    }
}

pub fn has_supported_extension(url: &Url) -> bool {
    Path::new(url.path())
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

fn image_progress(done: usize, total: usize) -> u8 {
    if total == 0 {
        return IMAGES_DONE_PROGRESS;
    }
    let span = usize::from(IMAGES_DONE_PROGRESS - PAGE_PARSED_PROGRESS);
    PAGE_PARSED_PROGRESS + (span * done / total) as u8
}
