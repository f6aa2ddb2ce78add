//! HTTP layer exposing the pipeline's two operations.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/documents` | Index a PDF, returning its index key |
//! | `POST` | `/query` | Answer a question against a stored index |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! Error responses use a JSON envelope with a machine-readable code:
//!
//! ```json
//! { "error": { "code": "not_found", "message": "index not found: x.pdf_tfidf" } }
//! ```
//!
//! All origins, methods, and headers are permitted so browser-based
//! clients can call the API cross-origin. Authentication and upload
//! handling belong to the surrounding application, not this layer.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::error::PipelineError;
use crate::models::Answer;
use crate::pipeline::Pipeline;

#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
}

/// Serve the pipeline on the configured bind address until terminated.
pub async fn run_server(pipeline: Arc<Pipeline>) -> anyhow::Result<()> {
    let bind_addr = pipeline.config().server.bind.clone();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/documents", post(handle_process_document))
        .route("/query", post(handle_query))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { pipeline });

    tracing::info!(addr = %bind_addr, "listening");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl AppError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "bad_request",
            message: message.into(),
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let status = match &err {
            PipelineError::InvalidDocument(_) | PipelineError::UnreadableDocument(_) => {
                StatusCode::BAD_REQUEST
            }
            PipelineError::IndexNotFound(_) => StatusCode::NOT_FOUND,
            PipelineError::VectorSpaceMismatch(_) => StatusCode::CONFLICT,
            PipelineError::GenerationFailed(_) => StatusCode::BAD_GATEWAY,
            PipelineError::CorruptIndex(_) | PipelineError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            code: err.code(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

// ============ Handlers ============

#[derive(Deserialize)]
struct ProcessDocumentRequest {
    /// Path of the uploaded PDF on local storage.
    path: PathBuf,
}

#[derive(Serialize)]
struct ProcessDocumentResponse {
    index_key: String,
    chunks: usize,
}

async fn handle_process_document(
    State(state): State<AppState>,
    Json(req): Json<ProcessDocumentRequest>,
) -> Result<Json<ProcessDocumentResponse>, AppError> {
    let processed = state.pipeline.process_document(&req.path).await?;
    Ok(Json(ProcessDocumentResponse {
        index_key: processed.index_key,
        chunks: processed.chunk_count,
    }))
}

#[derive(Deserialize)]
struct QueryRequest {
    /// Index key returned by `/documents`, or the document path.
    index_key: String,
    question: String,
}

async fn handle_query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<Answer>, AppError> {
    if req.question.trim().is_empty() {
        return Err(AppError::bad_request("question must not be empty"));
    }
    let key = state.pipeline.resolve_index_key(&req.index_key).await?;
    let answer = state.pipeline.answer_query(&key, &req.question).await?;
    Ok(Json(answer))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_map_to_distinct_statuses() {
        let cases = [
            (
                PipelineError::InvalidDocument("x".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                PipelineError::UnreadableDocument("x".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                PipelineError::IndexNotFound("x".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                PipelineError::VectorSpaceMismatch("x".into()),
                StatusCode::CONFLICT,
            ),
            (
                PipelineError::GenerationFailed("x".into()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                PipelineError::CorruptIndex("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            let code = err.code();
            let app_err = AppError::from(err);
            assert_eq!(app_err.status, expected);
            assert_eq!(app_err.code, code);
        }
    }
}
