use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub queue: &'static str,
    pub semantic_index: &'static str,
}

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let accepting = state.job_service.is_accepting();
    let checks = HealthChecks {
        queue: if accepting { "ok" } else { "closed" },
        semantic_index: if state.semantic_index.is_constructed() {
            "ready"
        } else {
            "lazy"
        },
    };

    let (status_code, status) = if accepting {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            checks,
        }),
    )
}
