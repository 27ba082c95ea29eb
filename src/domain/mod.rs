mod embedding;
mod fragment;
mod job;
mod job_id;
mod job_kind;
mod job_payload;
mod job_status;
mod job_view;
mod processed_file;

pub use embedding::Embedding;
pub use fragment::{Fragment, FragmentId, FragmentMetadata};
pub use job::{Job, JobOutcome, JobUpdate};
pub use job_id::JobId;
pub use job_kind::JobKind;
pub use job_payload::{DEFAULT_PARSE_LIMIT, JobPayload, MAX_PARSE_LIMIT, ValidationError};
pub use job_status::JobStatus;
pub use job_view::JobView;
pub use processed_file::ProcessedFile;
