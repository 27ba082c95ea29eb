mod helpers;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rasterq::application::ports::{ImageConverter, ImageConverterError, JobRepository};
use rasterq::application::services::{
    ConversionWorker, CrawlWorker, DispatchError, JobExecutor, JobService, JobServiceError,
    JobTask, WorkerPool, task_queue,
};
use rasterq::domain::{JobId, JobPayload, JobStatus};
use rasterq::infrastructure::crawling::ScraperImageLinkExtractor;
use rasterq::infrastructure::imaging::GrayscaleConverter;

use helpers::{LifecycleFixture, ScriptedFetcher, wait_for_terminal, write_fixture};

/// Panics on sources named `panic*`, stalls on `slow*`, converts the rest.
struct TroublesomeConverter {
    inner: GrayscaleConverter,
}

#[async_trait::async_trait]
impl ImageConverter for TroublesomeConverter {
    async fn convert_file(
        &self,
        source: &Path,
        target: &Path,
    ) -> Result<(), ImageConverterError> {
        let name = source.file_name().unwrap().to_string_lossy().to_string();
        if name.starts_with("panic") {
            panic!("decoder blew up on {name}");
        }
        if name.starts_with("slow") {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        self.inner.convert_file(source, target).await
    }

    async fn convert_bytes(
        &self,
        data: Vec<u8>,
        target: &Path,
    ) -> Result<(), ImageConverterError> {
        self.inner.convert_bytes(data, target).await
    }
}

fn executor(
    fixture: &LifecycleFixture,
    output_dir: &Path,
    deadline: Duration,
) -> Arc<JobExecutor> {
    let converter = Arc::new(TroublesomeConverter {
        inner: GrayscaleConverter::new(Duration::from_secs(10)),
    });
    let conversion = ConversionWorker::new(
        Arc::clone(&fixture.lifecycle),
        converter.clone(),
        output_dir.to_path_buf(),
    );
    let crawl = CrawlWorker::new(
        Arc::clone(&fixture.lifecycle),
        Arc::new(ScriptedFetcher::new()),
        Arc::new(ScraperImageLinkExtractor::new()),
        converter,
        output_dir.to_path_buf(),
    );
    Arc::new(JobExecutor::new(
        conversion,
        crawl,
        Arc::clone(&fixture.lifecycle),
        deadline,
    ))
}

fn repository(fixture: &LifecycleFixture) -> Arc<dyn JobRepository> {
    Arc::clone(&fixture.repository) as Arc<dyn JobRepository>
}

#[test]
fn given_full_queue_when_submitting_then_dispatch_is_unavailable_without_blocking() {
    let (dispatcher, _queue) = task_queue(1);
    let payload = JobPayload::convert("a.png", "/in/a.png").unwrap();

    dispatcher.submit(JobId::new(), payload.clone()).unwrap();
    let second = dispatcher.submit(JobId::new(), payload);

    assert!(matches!(second, Err(DispatchError::Unavailable(_))));
}

#[test]
fn given_closed_queue_when_submitting_then_dispatch_is_unavailable() {
    let (dispatcher, queue) = task_queue(4);
    drop(queue);

    let result = dispatcher.submit(
        JobId::new(),
        JobPayload::convert("a.png", "/in/a.png").unwrap(),
    );

    assert!(dispatcher.is_closed());
    assert!(matches!(result, Err(DispatchError::Unavailable(_))));
}

#[tokio::test]
async fn given_rejected_dispatch_when_submitting_job_then_record_is_rolled_back() {
    let fixture = LifecycleFixture::new();
    let (dispatcher, _queue) = task_queue(1);
    let service = JobService::new(repository(&fixture), dispatcher);
    let payload = JobPayload::convert("a.png", "/in/a.png").unwrap();

    let accepted = service.submit(payload.clone(), None).await.unwrap();
    let rejected = service.submit(payload, None).await;

    assert!(matches!(rejected, Err(JobServiceError::Dispatch(_))));
    assert_eq!(fixture.repository.len().await, 1);
    assert_eq!(
        service.get_job(&accepted.job_id).await.unwrap().status,
        JobStatus::Queued
    );
}

#[tokio::test]
async fn given_invalid_payload_when_creating_job_then_nothing_is_stored() {
    let fixture = LifecycleFixture::new();
    let (dispatcher, _queue) = task_queue(1);
    let service = JobService::new(repository(&fixture), dispatcher);

    let result = service
        .create_job(
            &JobPayload::Convert {
                filename: String::new(),
                file_path: "/in/x.png".into(),
            },
            None,
        )
        .await;

    assert!(matches!(result, Err(JobServiceError::Validation(_))));
    assert!(fixture.repository.is_empty().await);
}

#[tokio::test]
async fn given_unknown_id_when_getting_job_then_not_found() {
    let fixture = LifecycleFixture::new();
    let (dispatcher, _queue) = task_queue(1);
    let service = JobService::new(repository(&fixture), dispatcher);

    let result = service.get_job(&JobId::from_raw("nope")).await;

    assert!(matches!(result, Err(JobServiceError::NotFound(_))));
}

#[tokio::test]
async fn given_submitted_convert_job_when_pool_runs_then_job_becomes_ready() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let source = write_fixture(input.path(), "a.png");
    let fixture = LifecycleFixture::new();
    let (dispatcher, queue) = task_queue(8);
    let pool = WorkerPool::spawn(
        queue,
        executor(&fixture, output.path(), Duration::from_secs(10)),
        2,
    );
    let service = JobService::new(repository(&fixture), dispatcher);

    let job = service
        .submit(JobPayload::convert("a.png", &source).unwrap(), None)
        .await
        .unwrap();
    let finished = wait_for_terminal(fixture.repository.as_ref(), &job.job_id).await;

    assert_eq!(pool.size(), 2);
    assert_eq!(finished.status, JobStatus::Ready);
    assert_eq!(finished.filename.as_deref(), Some("processed_a.png"));
}

#[tokio::test]
async fn given_panicking_job_when_pool_runs_then_job_fails_and_pool_keeps_serving() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let panicking = write_fixture(input.path(), "panic.png");
    let healthy = write_fixture(input.path(), "fine.png");
    let fixture = LifecycleFixture::new();
    let (dispatcher, queue) = task_queue(8);
    let pool = WorkerPool::spawn(
        queue,
        executor(&fixture, output.path(), Duration::from_secs(10)),
        1,
    );
    let service = JobService::new(repository(&fixture), dispatcher);

    let first = service
        .submit(JobPayload::convert("panic.png", &panicking).unwrap(), None)
        .await
        .unwrap();
    let second = service
        .submit(JobPayload::convert("fine.png", &healthy).unwrap(), None)
        .await
        .unwrap();

    let crashed = wait_for_terminal(fixture.repository.as_ref(), &first.job_id).await;
    let served = wait_for_terminal(fixture.repository.as_ref(), &second.job_id).await;

    assert_eq!(crashed.status, JobStatus::Failed);
    assert_eq!(
        crashed.error.as_deref(),
        Some("worker crashed while processing the job")
    );
    assert_eq!(served.status, JobStatus::Ready);

    drop(service);
    pool.join().await;
}

#[tokio::test]
async fn given_job_exceeding_deadline_when_pool_runs_then_job_is_failed() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let source = write_fixture(input.path(), "slow.png");
    let fixture = LifecycleFixture::new();
    let (dispatcher, queue) = task_queue(8);
    let _pool = WorkerPool::spawn(
        queue,
        executor(&fixture, output.path(), Duration::from_millis(100)),
        1,
    );
    let service = JobService::new(repository(&fixture), dispatcher);

    let job = service
        .submit(JobPayload::convert("slow.png", &source).unwrap(), None)
        .await
        .unwrap();
    let finished = wait_for_terminal(fixture.repository.as_ref(), &job.job_id).await;

    assert_eq!(finished.status, JobStatus::Failed);
    assert_eq!(finished.error.as_deref(), Some("job deadline exceeded"));
    assert_eq!(finished.progress, 100);
}

/// Never finishes on its own; flips `released` when its future is dropped.
struct StallingConverter {
    released: Arc<AtomicBool>,
}

struct ReleaseOnDrop(Arc<AtomicBool>);

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ImageConverter for StallingConverter {
    async fn convert_file(&self, _: &Path, _: &Path) -> Result<(), ImageConverterError> {
        let _guard = ReleaseOnDrop(Arc::clone(&self.released));
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }

    async fn convert_bytes(&self, _: Vec<u8>, _: &Path) -> Result<(), ImageConverterError> {
        let _guard = ReleaseOnDrop(Arc::clone(&self.released));
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn given_job_past_deadline_when_executor_returns_then_job_task_is_already_gone() {
    let output = tempfile::tempdir().unwrap();
    let fixture = LifecycleFixture::new();
    let released = Arc::new(AtomicBool::new(false));
    let converter = Arc::new(StallingConverter {
        released: Arc::clone(&released),
    });
    let executor = Arc::new(JobExecutor::new(
        ConversionWorker::new(
            Arc::clone(&fixture.lifecycle),
            converter.clone(),
            output.path().to_path_buf(),
        ),
        CrawlWorker::new(
            Arc::clone(&fixture.lifecycle),
            Arc::new(ScriptedFetcher::new()),
            Arc::new(ScraperImageLinkExtractor::new()),
            converter,
            output.path().to_path_buf(),
        ),
        Arc::clone(&fixture.lifecycle),
        Duration::from_millis(100),
    ));
    let payload = JobPayload::convert("stuck.png", "/in/stuck.png").unwrap();
    let job = fixture.seed(&payload).await;

    Arc::clone(&executor)
        .execute(JobTask {
            job_id: job.job_id.clone(),
            payload,
        })
        .await;

    assert!(released.load(Ordering::SeqCst));
    let stored = fixture.job(&job.job_id).await;
    assert_eq!(stored.status, JobStatus::Failed);
    assert_eq!(stored.error.as_deref(), Some("job deadline exceeded"));
    assert_eq!(
        fixture.history(&job.job_id),
        vec![(JobStatus::Processing, 25), (JobStatus::Failed, 100)]
    );
}

#[tokio::test]
async fn given_redelivered_task_when_executed_twice_then_outcome_is_unchanged() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let source = write_fixture(input.path(), "a.png");
    let fixture = LifecycleFixture::new();
    let (dispatcher, queue) = task_queue(8);
    let _pool = WorkerPool::spawn(
        queue,
        executor(&fixture, output.path(), Duration::from_secs(10)),
        2,
    );
    let payload = JobPayload::convert("a.png", &source).unwrap();
    let job = fixture.seed(&payload).await;

    dispatcher.submit(job.job_id.clone(), payload.clone()).unwrap();
    let first = wait_for_terminal(fixture.repository.as_ref(), &job.job_id).await;
    dispatcher.submit(job.job_id.clone(), payload).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(fixture.job(&job.job_id).await, first);
    assert_eq!(fixture.notifier.notifications().len(), 1);
}
