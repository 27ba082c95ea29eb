use std::path::Path;

use axum::extract::{Path as UrlPath, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use super::error::error_response;
use crate::domain::{JobId, JobStatus};
use crate::presentation::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub index: Option<usize>,
}

/// Serves a converted file. Multi-file jobs pick one with `?index=N`
/// (default 0); single-file jobs ignore the index.
#[tracing::instrument(skip(state))]
pub async fn download_handler(
    State(state): State<AppState>,
    UrlPath(job_id): UrlPath<String>,
    Query(query): Query<DownloadQuery>,
) -> Response {
    let job = match state.job_service.get_job(&JobId::from_raw(job_id)).await {
        Ok(job) => job,
        Err(e) => return e.into_response(),
    };

    if job.status != JobStatus::Ready {
        return error_response(StatusCode::CONFLICT, "not_ready", None);
    }

    let (filename, file_path) = match job.processed_files.as_deref() {
        Some(files) if !files.is_empty() => {
            let index = query.index.unwrap_or(0);
            let Some(file) = files.get(index) else {
                return error_response(StatusCode::CONFLICT, "invalid_index", None);
            };
            (file.filename.clone(), file.file_path.clone())
        }
        _ => match (job.filename, job.file_path) {
            (Some(filename), Some(file_path)) => (filename, file_path),
            _ => return error_response(StatusCode::CONFLICT, "no_file", None),
        },
    };

    let data = match tokio::fs::read(&file_path).await {
        Ok(data) => data,
        Err(e) => {
            tracing::error!(error = %e, file_path = %file_path, "Processed file is unreadable");
            return error_response(StatusCode::NOT_FOUND, "file_missing", None);
        }
    };

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type_for(&filename).to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename.replace('"', "")),
            ),
        ],
        data,
    )
        .into_response()
}

fn content_type_for(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif" | "tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}
