use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;

use rasterq::application::ports::{JobNotifier, JobRepository, VectorStore};
use rasterq::application::services::{
    ConversionWorker, CrawlWorker, JobExecutor, JobLifecycle, JobService, SemanticIndexCache,
    WorkerPool, task_queue,
};
use rasterq::infrastructure::crawling::{ReqwestPageFetcher, ScraperImageLinkExtractor};
use rasterq::infrastructure::embeddings::EmbedderFactory;
use rasterq::infrastructure::imaging::GrayscaleConverter;
use rasterq::infrastructure::notification::{TracingNotifier, WebhookNotifier};
use rasterq::infrastructure::observability::{TracingConfig, init_tracing};
use rasterq::infrastructure::persistence::{
    InMemoryJobRepository, InMemoryVectorStore, PgJobRepository, create_pool, run_migrations,
};
use rasterq::infrastructure::text_processing::RecursiveCharacterSplitter;
use rasterq::presentation::{AppState, Environment, Settings, create_router};

const CHUNK_SIZE: usize = 500;
const CHUNK_OVERLAP: usize = 100;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;

    let settings = Settings::load(environment).context("Failed to load configuration")?;

    init_tracing(&TracingConfig::new(environment.as_str()).with_json(settings.logging.json))?;

    tokio::fs::create_dir_all(&settings.storage.output_dir)
        .await
        .context("Failed to create output directory")?;
    tokio::fs::create_dir_all(&settings.storage.upload_dir)
        .await
        .context("Failed to create upload directory")?;

    let repository: Arc<dyn JobRepository> = match &settings.database.url {
        Some(url) => {
            let pool = create_pool(url, settings.database.max_connections).await?;
            run_migrations(&pool).await?;
            tracing::info!("Using PostgreSQL job store");
            Arc::new(PgJobRepository::new(pool))
        }
        None => {
            tracing::info!("Using in-memory job store");
            Arc::new(InMemoryJobRepository::new())
        }
    };

    let notifier: Arc<dyn JobNotifier> = match &settings.notifications.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url.clone())),
        None => Arc::new(TracingNotifier),
    };

    let lifecycle = Arc::new(JobLifecycle::new(Arc::clone(&repository), notifier));

    let embedder = EmbedderFactory::create(&settings.embeddings)?;
    let vector_store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new());
    let semantic_index = Arc::new(SemanticIndexCache::new(
        embedder,
        vector_store,
        Arc::new(RecursiveCharacterSplitter::new(CHUNK_SIZE, CHUNK_OVERLAP)),
    ));

    let converter = Arc::new(GrayscaleConverter::new(settings.workers.io_timeout()));
    let fetcher = Arc::new(
        ReqwestPageFetcher::new(
            &settings.crawler.user_agent,
            Duration::from_secs(settings.crawler.page_timeout_secs),
            Duration::from_secs(settings.crawler.image_timeout_secs),
        )
        .context("Failed to build HTTP client")?,
    );

    let conversion = ConversionWorker::new(
        Arc::clone(&lifecycle),
        converter.clone(),
        settings.storage.output_dir.clone(),
    );
    let crawl = CrawlWorker::new(
        Arc::clone(&lifecycle),
        fetcher,
        Arc::new(ScraperImageLinkExtractor::new()),
        converter,
        settings.storage.output_dir.clone(),
    )
    .with_semantic_index(Arc::clone(&semantic_index));

    let (dispatcher, queue) = task_queue(settings.workers.queue_capacity);
    let executor = Arc::new(JobExecutor::new(
        conversion,
        crawl,
        lifecycle,
        settings.workers.job_deadline(),
    ));
    let pool = WorkerPool::spawn(queue, executor, settings.workers.pool_size);

    let state = AppState {
        job_service: Arc::new(JobService::new(repository, dispatcher)),
        semantic_index,
        upload_dir: settings.storage.upload_dir.clone(),
        default_parse_limit: settings.crawler.default_limit,
    };

    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, workers = pool.size(), "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped, draining job queue");
    pool.join().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
