use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::Instrument;

use super::conversion_worker::ConversionWorker;
use super::crawl_worker::CrawlWorker;
use super::job_lifecycle::{JobLifecycle, LifecycleError};
use super::task_dispatcher::{JobTask, TaskQueue};
use super::worker_error::WorkerError;
use crate::domain::{JobId, JobPayload};

/// Runs one task to completion, isolating the pool from panics and from
/// jobs that exceed the overall deadline.
pub struct JobExecutor {
    conversion: ConversionWorker,
    crawl: CrawlWorker,
    lifecycle: Arc<JobLifecycle>,
    job_deadline: Duration,
}

impl JobExecutor {
    pub fn new(
        conversion: ConversionWorker,
        crawl: CrawlWorker,
        lifecycle: Arc<JobLifecycle>,
        job_deadline: Duration,
    ) -> Self {
        Self {
            conversion,
            crawl,
            lifecycle,
            job_deadline,
        }
    }

    pub async fn execute(self: Arc<Self>, task: JobTask) {
        let span = tracing::info_span!(
            "job",
            job_id = %task.job_id,
            kind = %task.payload.kind(),
        );

        async move {
            let job_id = task.job_id.clone();
            let executor = Arc::clone(&self);
            let mut handle = tokio::spawn(
                async move { executor.run_task(task).await }.in_current_span(),
            );

            match tokio::time::timeout(self.job_deadline, &mut handle).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => {
                    tracing::error!(error = %e, "Job execution failed");
                }
                Ok(Err(join_error)) => {
                    tracing::error!(error = %join_error, "Job task aborted unexpectedly");
                    self.fail_abandoned(&job_id, "worker crashed while processing the job")
                        .await;
                }
                Err(_) => {
                    // The task must be gone before the failure is written, or a
                    // late completion could land after it.
                    handle.abort();
                    if let Err(join_error) = handle.await {
                        if !join_error.is_cancelled() {
                            tracing::error!(error = %join_error, "Timed-out job task panicked");
                        }
                    }
                    tracing::error!(
                        deadline_secs = self.job_deadline.as_secs(),
                        "Job exceeded its deadline"
                    );
                    self.fail_abandoned(&job_id, "job deadline exceeded").await;
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_task(&self, task: JobTask) -> Result<(), WorkerError> {
        match task.payload {
            JobPayload::Convert {
                filename,
                file_path,
            } => {
                self.conversion
                    .run(&task.job_id, &filename, &file_path)
                    .await
            }
            JobPayload::Parse { url, limit } => self.crawl.run(&task.job_id, &url, limit).await,
        }
    }

    async fn fail_abandoned(&self, job_id: &JobId, reason: &str) {
        match self.lifecycle.fail(job_id, reason, None).await {
            Ok(_) => {}
            Err(LifecycleError::AlreadyTerminal { .. }) => {
                tracing::debug!("Abandoned job had already reached a terminal state");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to mark abandoned job as failed");
            }
        }
    }
}

/// Fixed set of workers draining one shared FIFO queue.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn spawn(queue: TaskQueue, executor: Arc<JobExecutor>, size: usize) -> Self {
        let receiver = Arc::new(Mutex::new(queue.into_receiver()));
        let size = size.max(1);

        let handles = (0..size)
            .map(|worker_index| {
                let receiver = Arc::clone(&receiver);
                let executor = Arc::clone(&executor);
                tokio::spawn(async move {
                    tracing::info!(worker_index, "Job worker started");
                    loop {
                        let task = receiver.lock().await.recv().await;
                        let Some(task) = task else {
                            break;
                        };
                        Arc::clone(&executor).execute(task).await;
                    }
                    tracing::info!(worker_index, "Job worker stopped: queue closed");
                })
            })
            .collect();

        tracing::info!(size, "Worker pool started");
        Self { handles }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Waits for every worker to exit. Workers exit once all dispatchers
    /// are dropped and the queue is drained.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Job worker terminated abnormally");
            }
        }
    }
}
