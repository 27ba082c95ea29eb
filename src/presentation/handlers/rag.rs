use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use super::error::error_response;
use crate::domain::FragmentMetadata;
use crate::presentation::state::AppState;

const DEFAULT_TOP_K: usize = 5;
const MAX_TOP_K: usize = 50;

#[derive(Debug, Deserialize)]
pub struct AddDocumentRequest {
    pub text: Option<String>,
    #[serde(default)]
    pub metadata: FragmentMetadata,
}

#[derive(Debug, Serialize)]
pub struct AddDocumentResponse {
    pub message: String,
    pub metadata: FragmentMetadata,
    pub fragment_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub text: String,
    pub metadata: FragmentMetadata,
    pub score: f32,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

#[tracing::instrument(skip(state, request))]
pub async fn add_document_handler(
    State(state): State<AppState>,
    Json(request): Json<AddDocumentRequest>,
) -> Response {
    let Some(text) = request.text.filter(|t| !t.trim().is_empty()) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "missing_text",
            Some("Missing 'text' field".to_string()),
        );
    };

    let index = match state.semantic_index.get_or_create().await {
        Ok(index) => index,
        Err(e) => return e.into_response(),
    };

    match index.add_document(&text, request.metadata.clone()).await {
        Ok(ids) => (
            StatusCode::OK,
            Json(AddDocumentResponse {
                message: format!("Added {} chunks to vectorstore", ids.len()),
                metadata: request.metadata,
                fragment_ids: ids.iter().map(|id| id.as_uuid().to_string()).collect(),
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

#[tracing::instrument(skip(state, request))]
pub async fn search_handler(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Response {
    if request.query.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "missing_query", None);
    }

    let top_k = request.top_k.unwrap_or(DEFAULT_TOP_K).min(MAX_TOP_K);

    let index = match state.semantic_index.get_or_create().await {
        Ok(index) => index,
        Err(e) => return e.into_response(),
    };

    match index.search(&request.query, top_k).await {
        Ok(results) => Json(SearchResponse {
            results: results
                .into_iter()
                .map(|r| SearchHit {
                    text: r.fragment.text,
                    metadata: r.fragment.metadata,
                    score: r.score,
                })
                .collect(),
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}
