use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::job_lifecycle::{Claim, JobLifecycle};
use super::worker_error::WorkerError;
use crate::application::ports::ImageConverter;
use crate::domain::{JobId, JobOutcome, ProcessedFile};

/// Converts one uploaded image to grayscale.
///
/// Runs are idempotent per job: the output lands on a path derived only from
/// the logical filename, so a redelivered task overwrites its own result.
pub struct ConversionWorker {
    lifecycle: Arc<JobLifecycle>,
    converter: Arc<dyn ImageConverter>,
    output_dir: PathBuf,
}

impl ConversionWorker {
    pub fn new(
        lifecycle: Arc<JobLifecycle>,
        converter: Arc<dyn ImageConverter>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            lifecycle,
            converter,
            output_dir,
        }
    }

    pub async fn run(
        &self,
        job_id: &JobId,
        filename: &str,
        source: &Path,
    ) -> Result<(), WorkerError> {
        match self.lifecycle.claim(job_id).await? {
            Claim::Claimed(_) => {}
            Claim::Vanished | Claim::AlreadyTerminal(_) => return Ok(()),
        }

        let output_name = processed_filename(filename);
        let target = self.output_dir.join(&output_name);

        tracing::info!(source = %source.display(), target = %target.display(), "Converting image");

        match self.converter.convert_file(source, &target).await {
            Ok(()) => {
                let file = ProcessedFile::new(output_name, target.display().to_string());
                self.lifecycle
                    .complete(job_id, JobOutcome::Converted(file))
                    .await?;
                tracing::info!("Image conversion completed");
            }
            Err(e) => {
                tracing::error!(error = %e, "Image conversion failed");
                self.lifecycle
                    .fail(job_id, format!("conversion: {}", e), None)
                    .await?;
            }
        }

        Ok(())
    }
}

/// `processed_<name>`, using only the final path component of `filename`.
pub fn processed_filename(filename: &str) -> String {
    let base = Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(filename);
    format!("processed_{}", base)
}
