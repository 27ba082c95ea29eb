mod conversion_worker;
mod crawl_worker;
mod job_lifecycle;
mod job_service;
mod semantic_index;
mod task_dispatcher;
mod worker_error;
mod worker_pool;

pub use conversion_worker::{ConversionWorker, processed_filename};
pub use crawl_worker::{CrawlWorker, SUPPORTED_EXTENSIONS, has_supported_extension};
pub use job_lifecycle::{CLAIM_PROGRESS, Claim, JobLifecycle, LifecycleError, TERMINAL_PROGRESS};
pub use job_service::{JobService, JobServiceError};
pub use semantic_index::{PROBE_TEXT, SemanticIndex, SemanticIndexCache, SemanticIndexError};
pub use task_dispatcher::{DispatchError, JobTask, TaskDispatcher, TaskQueue, task_queue};
pub use worker_error::WorkerError;
pub use worker_pool::{JobExecutor, WorkerPool};
