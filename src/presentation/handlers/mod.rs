mod download;
mod error;
mod health;
mod job_status;
mod rag;
mod submit_job;

pub use download::download_handler;
pub use error::{ErrorResponse, error_response};
pub use health::health_handler;
pub use job_status::job_status_handler;
pub use rag::{add_document_handler, search_handler};
pub use submit_job::{image_job_handler, parse_job_handler};
