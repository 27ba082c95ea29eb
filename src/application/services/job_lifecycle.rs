use std::sync::Arc;

use crate::application::ports::{JobNotification, JobNotifier, JobRepository, RepositoryError};
use crate::domain::{Job, JobId, JobOutcome, JobStatus, JobUpdate};

pub const CLAIM_PROGRESS: u8 = 25;
pub const TERMINAL_PROGRESS: u8 = 100;

/// Status protocol for job records. Every worker-side mutation goes through
/// here so that status only moves forward, progress never decreases and
/// terminal records stay terminal.
pub struct JobLifecycle {
    repository: Arc<dyn JobRepository>,
    notifier: Arc<dyn JobNotifier>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Claim {
    Claimed(Job),
    Vanished,
    AlreadyTerminal(JobStatus),
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
    #[error("job {job_id} is already {status}; transition rejected")]
    AlreadyTerminal { job_id: JobId, status: JobStatus },
}

impl JobLifecycle {
    pub fn new(repository: Arc<dyn JobRepository>, notifier: Arc<dyn JobNotifier>) -> Self {
        Self {
            repository,
            notifier,
        }
    }

    /// Moves a queued (or redelivered, still processing) job to `processing`.
    /// Terminal jobs are left untouched so a redelivered task becomes a no-op.
    pub async fn claim(&self, job_id: &JobId) -> Result<Claim, LifecycleError> {
        let Some(job) = self.repository.get(job_id).await? else {
            tracing::warn!(job_id = %job_id, "Job vanished before it could be claimed");
            return Ok(Claim::Vanished);
        };

        if job.is_terminal() {
            tracing::info!(job_id = %job_id, status = %job.status, "Job already finished, skipping");
            return Ok(Claim::AlreadyTerminal(job.status));
        }

        let update = JobUpdate::status(JobStatus::Processing)
            .with_progress(job.progress.max(CLAIM_PROGRESS));
        tracing::debug!(job_id = %job_id, status = %JobStatus::Processing, "Job status transition");

        match self.repository.update(job_id, update).await? {
            Some(job) => Ok(Claim::Claimed(job)),
            None => Ok(Claim::Vanished),
        }
    }

    /// Raises progress on a job that is still running. Lower values are
    /// ignored and 100 is reserved for terminal states.
    pub async fn advance(
        &self,
        job_id: &JobId,
        progress: u8,
    ) -> Result<Option<Job>, LifecycleError> {
        let Some(job) = self.repository.get(job_id).await? else {
            return Ok(None);
        };

        if job.is_terminal() {
            return Err(self.reject(job_id, job.status));
        }

        let progress = progress.min(TERMINAL_PROGRESS - 1);
        if progress <= job.progress {
            return Ok(Some(job));
        }

        Ok(self
            .repository
            .update(job_id, JobUpdate::progress(progress))
            .await?)
    }

    pub async fn complete(
        &self,
        job_id: &JobId,
        outcome: JobOutcome,
    ) -> Result<Option<Job>, LifecycleError> {
        let details = describe(&outcome);
        self.finish(job_id, JobStatus::Ready, outcome.into_update(), details)
            .await
    }

    /// Marks the job failed. `partial` carries whatever the worker gathered
    /// before giving up so clients can inspect it.
    pub async fn fail(
        &self,
        job_id: &JobId,
        reason: impl Into<String>,
        partial: Option<JobOutcome>,
    ) -> Result<Option<Job>, LifecycleError> {
        let reason = reason.into();
        let update = partial
            .map(JobOutcome::into_update)
            .unwrap_or_default()
            .with_error(reason.clone());
        self.finish(job_id, JobStatus::Failed, update, reason).await
    }

    async fn finish(
        &self,
        job_id: &JobId,
        status: JobStatus,
        mut update: JobUpdate,
        details: String,
    ) -> Result<Option<Job>, LifecycleError> {
        let Some(current) = self.repository.get(job_id).await? else {
            tracing::warn!(job_id = %job_id, "Job vanished before it could be finalized");
            return Ok(None);
        };

        if current.is_terminal() {
            return Err(self.reject(job_id, current.status));
        }

        update.status = Some(status);
        update.progress = Some(TERMINAL_PROGRESS);
        tracing::debug!(job_id = %job_id, status = %status, "Job status transition");

        let updated = self.repository.update(job_id, update).await?;
        if let Some(job) = &updated {
            self.notify(job, details);
        }

        Ok(updated)
    }

    fn reject(&self, job_id: &JobId, status: JobStatus) -> LifecycleError {
        tracing::error!(
            job_id = %job_id,
            status = %status,
            "Rejected transition out of a terminal state"
        );
        LifecycleError::AlreadyTerminal {
            job_id: job_id.clone(),
            status,
        }
    }

    fn notify(&self, job: &Job, details: String) {
        let notification = JobNotification {
            recipient: job.owner.clone(),
            job_id: job.job_id.clone(),
            status: job.status,
            details,
        };

        if let Err(e) = self.notifier.notify(&notification) {
            tracing::warn!(job_id = %job.job_id, error = %e, "Job notification failed");
        }
    }
}

fn describe(outcome: &JobOutcome) -> String {
    match outcome {
        JobOutcome::Converted(file) => format!("converted to {}", file.filename),
        JobOutcome::Parsed {
            parsed_data,
            processed_files,
        } => format!(
            "processed {} of {} discovered images",
            processed_files.len(),
            parsed_data.len()
        ),
    }
}
