use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};

use crate::domain::{JobId, JobView};
use crate::presentation::state::AppState;

#[tracing::instrument(skip(state))]
pub async fn job_status_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Response {
    match state.job_service.get_job(&JobId::from_raw(job_id)).await {
        Ok(job) => Json(JobView::from(&job)).into_response(),
        Err(e) => e.into_response(),
    }
}
