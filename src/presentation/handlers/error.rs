use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::services::{JobServiceError, SemanticIndexError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

pub fn error_response(status: StatusCode, error: &str, detail: Option<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            detail,
        }),
    )
        .into_response()
}

impl IntoResponse for JobServiceError {
    fn into_response(self) -> Response {
        match self {
            JobServiceError::Validation(e) => error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                Some(e.to_string()),
            ),
            JobServiceError::NotFound(_) => error_response(StatusCode::NOT_FOUND, "not_found", None),
            JobServiceError::Dispatch(e) => {
                tracing::error!(error = %e, "Job dispatch rejected");
                error_response(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "unavailable",
                    Some(e.to_string()),
                )
            }
            JobServiceError::Repository(e) => {
                tracing::error!(error = %e, "Job store failure");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        }
    }
}

impl IntoResponse for SemanticIndexError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Semantic index request failed");
        error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "index_unavailable",
            Some(self.to_string()),
        )
    }
}
