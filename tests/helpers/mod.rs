#![allow(dead_code)]

mod test_postgres;

pub use test_postgres::TestPostgres;

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::{DynamicImage, ImageFormat, RgbImage};
use url::Url;

use rasterq::application::ports::{
    Embedder, EmbedderError, JobNotification, JobNotifier, JobRepository, NotifierError,
    PageFetcher, PageFetcherError, RepositoryError,
};
use rasterq::application::services::JobLifecycle;
use rasterq::domain::{Embedding, Job, JobId, JobPayload, JobStatus, JobUpdate};
use rasterq::infrastructure::persistence::InMemoryJobRepository;

#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<JobNotification>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<JobNotification> {
        self.notifications.lock().unwrap().clone()
    }
}

impl JobNotifier for RecordingNotifier {
    fn notify(&self, notification: &JobNotification) -> Result<(), NotifierError> {
        self.notifications.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

pub struct FailingNotifier;

impl JobNotifier for FailingNotifier {
    fn notify(&self, _notification: &JobNotification) -> Result<(), NotifierError> {
        Err(NotifierError::Rejected("mail server down".to_string()))
    }
}

/// Serves canned pages and image bodies; anything unknown answers 404.
#[derive(Default)]
pub struct ScriptedFetcher {
    pages: HashMap<String, String>,
    images: HashMap<String, Vec<u8>>,
    image_requests: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn with_image(mut self, url: &str, data: Vec<u8>) -> Self {
        self.images.insert(url.to_string(), data);
        self
    }

    pub fn image_requests(&self) -> Vec<String> {
        self.image_requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch_page(&self, url: &Url) -> Result<String, PageFetcherError> {
        self.pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| PageFetcherError::RequestFailed {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            })
    }

    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, PageFetcherError> {
        self.image_requests.lock().unwrap().push(url.to_string());
        self.images
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| PageFetcherError::HttpStatus {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// Counts embedding calls; optionally slow so that concurrent first callers
/// overlap.
pub struct CountingEmbedder {
    dimensions: usize,
    delay: Duration,
    calls: AtomicUsize,
}

impl CountingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector(&self, text: &str) -> Embedding {
        let seed = text.len() as f32 + 1.0;
        Embedding::new((0..self.dimensions).map(|i| seed + i as f32).collect())
    }
}

#[async_trait::async_trait]
impl Embedder for CountingEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbedderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbedderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }
}

/// Fails until `failures` calls have been made, then delegates.
pub struct FlakyEmbedder {
    inner: CountingEmbedder,
    failures: usize,
}

impl FlakyEmbedder {
    pub fn new(dimensions: usize, failures: usize) -> Self {
        Self {
            inner: CountingEmbedder::new(dimensions),
            failures,
        }
    }

    pub fn calls(&self) -> usize {
        self.inner.calls()
    }
}

#[async_trait::async_trait]
impl Embedder for FlakyEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbedderError> {
        if self.inner.calls() < self.failures {
            self.inner.calls.fetch_add(1, Ordering::SeqCst);
            return Err(EmbedderError::RequestFailed("backend offline".to_string()));
        }
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbedderError> {
        self.inner.embed_batch(texts).await
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 40) as u8, (y * 40) as u8, 200])
    });
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

pub fn write_fixture(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, png_bytes(4, 3)).unwrap();
    path
}

/// Passes through to an inner store and keeps the `(status, progress)` of
/// every record an `update` produced, in write order.
pub struct RecordingJobRepository {
    inner: Arc<dyn JobRepository>,
    updates: Mutex<Vec<(JobId, JobStatus, u8)>>,
}

impl RecordingJobRepository {
    pub fn new(inner: Arc<dyn JobRepository>) -> Self {
        Self {
            inner,
            updates: Mutex::new(Vec::new()),
        }
    }

    pub fn updates_for(&self, job_id: &JobId) -> Vec<(JobStatus, u8)> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _, _)| id == job_id)
            .map(|(_, status, progress)| (*status, *progress))
            .collect()
    }
}

#[async_trait::async_trait]
impl JobRepository for RecordingJobRepository {
    async fn create(&self, job: &Job) -> Result<(), RepositoryError> {
        self.inner.create(job).await
    }

    async fn get(&self, job_id: &JobId) -> Result<Option<Job>, RepositoryError> {
        self.inner.get(job_id).await
    }

    async fn update(
        &self,
        job_id: &JobId,
        update: JobUpdate,
    ) -> Result<Option<Job>, RepositoryError> {
        let updated = self.inner.update(job_id, update).await?;
        if let Some(job) = &updated {
            self.updates
                .lock()
                .unwrap()
                .push((job.job_id.clone(), job.status, job.progress));
        }
        Ok(updated)
    }

    async fn delete(&self, job_id: &JobId) -> Result<bool, RepositoryError> {
        self.inner.delete(job_id).await
    }
}

/// Status only moves forward, progress never drops, and the last observed
/// state is terminal at 100.
pub fn assert_forward_only(history: &[(JobStatus, u8)]) {
    fn rank(status: JobStatus) -> u8 {
        match status {
            JobStatus::Queued => 0,
            JobStatus::Processing => 1,
            JobStatus::Ready | JobStatus::Failed => 2,
        }
    }

    assert!(!history.is_empty(), "no updates were observed");
    for pair in history.windows(2) {
        let (before_status, before_progress) = pair[0];
        let (after_status, after_progress) = pair[1];
        assert!(
            rank(after_status) >= rank(before_status),
            "status moved backwards in {history:?}"
        );
        assert!(
            !before_status.is_terminal(),
            "update after terminal state in {history:?}"
        );
        assert!(
            after_progress >= before_progress,
            "progress dropped in {history:?}"
        );
    }
    let (last_status, last_progress) = history[history.len() - 1];
    assert!(last_status.is_terminal(), "ended non-terminal: {history:?}");
    assert_eq!(last_progress, 100, "terminal progress in {history:?}");
}

pub struct LifecycleFixture {
    pub repository: Arc<InMemoryJobRepository>,
    pub recorder: Arc<RecordingJobRepository>,
    pub notifier: Arc<RecordingNotifier>,
    pub lifecycle: Arc<JobLifecycle>,
}

impl LifecycleFixture {
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryJobRepository::new());
        let recorder = Arc::new(RecordingJobRepository::new(
            Arc::clone(&repository) as Arc<dyn JobRepository>
        ));
        let notifier = Arc::new(RecordingNotifier::default());
        let lifecycle = Arc::new(JobLifecycle::new(
            Arc::clone(&recorder) as Arc<dyn JobRepository>,
            Arc::clone(&notifier) as Arc<dyn JobNotifier>,
        ));
        Self {
            repository,
            recorder,
            notifier,
            lifecycle,
        }
    }

    pub fn history(&self, job_id: &JobId) -> Vec<(JobStatus, u8)> {
        self.recorder.updates_for(job_id)
    }

    pub async fn seed(&self, payload: &JobPayload) -> Job {
        let job = Job::new(JobId::new(), payload, Some("owner@example.com".to_string()));
        self.repository.create(&job).await.unwrap();
        job
    }

    pub async fn job(&self, job_id: &JobId) -> Job {
        self.repository.get(job_id).await.unwrap().unwrap()
    }
}

/// Polls until the job reaches a terminal state or the timeout elapses.
pub async fn wait_for_terminal(repository: &dyn JobRepository, job_id: &JobId) -> Job {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        if let Some(job) = repository.get(job_id).await.unwrap() {
            if job.is_terminal() {
                return job;
            }
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job {job_id} did not finish in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
