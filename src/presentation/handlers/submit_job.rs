use std::path::Path;

use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::error_response;
use crate::application::services::JobServiceError;
use crate::domain::{Job, JobPayload};
use crate::presentation::state::AppState;

#[derive(Debug, Serialize)]
pub struct JobAcceptedResponse {
    pub job_id: String,
    pub status: String,
    pub progress: u8,
}

impl From<&Job> for JobAcceptedResponse {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.job_id.to_string(),
            status: job.status.to_string(),
            progress: job.progress,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ParseJobRequest {
    pub url: String,
    pub limit: Option<i64>,
    pub owner: Option<String>,
}

fn accepted(job: &Job) -> Response {
    (StatusCode::ACCEPTED, Json(JobAcceptedResponse::from(job))).into_response()
}

#[tracing::instrument(skip(state, request))]
pub async fn parse_job_handler(
    State(state): State<AppState>,
    Json(request): Json<ParseJobRequest>,
) -> Response {
    tracing::debug!(url = %request.url, "Parse job requested");
    let limit = request
        .limit
        .unwrap_or_else(|| i64::from(state.default_parse_limit));

    let payload = match JobPayload::parse(&request.url, limit) {
        Ok(payload) => payload,
        Err(e) => return JobServiceError::from(e).into_response(),
    };

    match state.job_service.submit(payload, request.owner).await {
        Ok(job) => accepted(&job),
        Err(e) => e.into_response(),
    }
}

/// Accepts a multipart form with a `file` part and an optional `owner`
/// text part. The upload is stored under a unique name; the job keeps the
/// client's filename.
#[tracing::instrument(skip(state, multipart))]
pub async fn image_job_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Response {
    let mut upload: Option<(String, bytes::Bytes)> = None;
    let mut owner: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read multipart");
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "invalid_multipart",
                    Some(e.to_string()),
                );
            }
        };

        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .and_then(|name| Path::new(name).file_name())
                    .and_then(|name| name.to_str())
                    .unwrap_or_default()
                    .to_string();
                match field.bytes().await {
                    Ok(data) => upload = Some((filename, data)),
                    Err(e) => {
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            "invalid_multipart",
                            Some(e.to_string()),
                        );
                    }
                }
            }
            Some("owner") => owner = field.text().await.ok().filter(|o| !o.is_empty()),
            _ => {}
        }
    }

    let Some((filename, data)) = upload else {
        return error_response(StatusCode::BAD_REQUEST, "missing_file", None);
    };

    let stored_path = state
        .upload_dir
        .join(format!("{}_{}", Uuid::new_v4().simple(), filename));

    let payload = match JobPayload::convert(filename.as_str(), stored_path.as_path()) {
        Ok(payload) => payload,
        Err(e) => return JobServiceError::from(e).into_response(),
    };

    if let Err(e) = save_upload(&stored_path, &data).await {
        tracing::error!(error = %e, path = %stored_path.display(), "Failed to store upload");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "upload_failed", None);
    }

    tracing::debug!(filename = %filename, bytes = data.len(), "Upload stored");

    match state.job_service.submit(payload, owner).await {
        Ok(job) => accepted(&job),
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(&stored_path).await {
                tracing::warn!(error = %cleanup, "Failed to remove orphaned upload");
            }
            e.into_response()
        }
    }
}

async fn save_upload(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, data).await
}
