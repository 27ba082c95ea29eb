use std::path::PathBuf;
use std::sync::Arc;

use crate::application::services::{JobService, SemanticIndexCache};

#[derive(Clone)]
pub struct AppState {
    pub job_service: Arc<JobService>,
    pub semantic_index: Arc<SemanticIndexCache>,
    pub upload_dir: PathBuf,
    pub default_parse_limit: u32,
}
