//! HTTP request handlers for the Gateway.
//!
//! Validates incoming documents, runs them through the convergence
//! controller and maps pipeline failures onto HTTP status codes.

use crate::provider::Backend;
use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use condenser_domain::{char_len, StopReason, SummaryOutcome};
use condenser_pipeline::{ConvergenceController, PipelineError};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Pipeline driver shared by every request
    pub controller: Arc<ConvergenceController<Backend>>,
    /// Longest accepted document, in characters
    pub max_text_length: usize,
    /// Backend label reported by `/health`
    pub provider_name: String,
}

/// Summarize inline text
#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    /// Document text
    pub text: String,
}

/// Summarize a text file on the server's filesystem
#[derive(Debug, Deserialize)]
pub struct DocumentRequest {
    /// Path to a UTF-8 text file
    pub document_path: String,
}

/// Successful summarization
#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    /// Final summary
    pub summary: String,
    /// Rounds executed
    pub rounds: usize,
    /// How the run terminated
    pub stop_reason: StopReason,
    /// Input length in characters
    pub original_length: usize,
    /// Summary length in characters
    pub summary_length: usize,
}

impl From<SummaryOutcome> for SummaryResponse {
    fn from(outcome: SummaryOutcome) -> Self {
        let summary_length = outcome.char_len();
        SummaryResponse {
            summary: outcome.text,
            rounds: outcome.rounds,
            stop_reason: outcome.stop_reason,
            original_length: outcome.original_char_len,
            summary_length,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
    /// Inference backend in use
    pub provider: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Stable error kind
    pub kind: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Request carried no text
    EmptyText,
    /// Text longer than the configured limit
    TextTooLarge {
        /// Characters received
        length: usize,
        /// Configured limit
        max: usize,
    },
    /// Document path does not exist
    DocumentNotFound(String),
    /// Document exists but could not be read as UTF-8 text
    DocumentUnreadable(String),
    /// Summarization failed
    Pipeline(PipelineError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::EmptyText => StatusCode::BAD_REQUEST,
            AppError::TextTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::DocumentNotFound(_) => StatusCode::NOT_FOUND,
            AppError::DocumentUnreadable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Pipeline(e) => match e.kind() {
                "inference_error" => StatusCode::BAD_GATEWAY,
                "timeout" => StatusCode::GATEWAY_TIMEOUT,
                "convergence_exceeded" => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::BAD_REQUEST,
            },
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::EmptyText => "empty_text",
            AppError::TextTooLarge { .. } => "text_too_large",
            AppError::DocumentNotFound(_) => "document_not_found",
            AppError::DocumentUnreadable(_) => "document_unreadable",
            AppError::Pipeline(e) => e.kind(),
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::EmptyText => "No text provided".to_string(),
            AppError::TextTooLarge { length, max } => {
                format!("Text of {} characters exceeds the limit of {}", length, max)
            }
            AppError::DocumentNotFound(path) => format!("Document not found: {}", path),
            AppError::DocumentUnreadable(msg) => format!("Document unreadable: {}", msg),
            AppError::Pipeline(e) => e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("Request failed ({}): {}", status, self.message());
        }

        let body = Json(ErrorResponse {
            error: self.message(),
            kind: self.kind().to_string(),
        });
        (status, body).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        AppError::Pipeline(e)
    }
}

async fn run_pipeline(state: &AppState, text: &str) -> Result<SummaryResponse, AppError> {
    if text.trim().is_empty() {
        return Err(AppError::EmptyText);
    }

    let length = char_len(text);
    if length > state.max_text_length {
        return Err(AppError::TextTooLarge {
            length,
            max: state.max_text_length,
        });
    }

    let outcome = state.controller.summarize(text).await?;
    info!(
        "Summarized {} chars to {} in {} rounds",
        outcome.original_char_len,
        outcome.char_len(),
        outcome.rounds
    );
    Ok(outcome.into())
}

/// POST /summarize - Summarize inline text
async fn summarize_text(
    State(state): State<AppState>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<SummaryResponse>, AppError> {
    run_pipeline(&state, &request.text).await.map(Json)
}

/// POST /summarize/document - Summarize a text file
async fn summarize_document(
    State(state): State<AppState>,
    Json(request): Json<DocumentRequest>,
) -> Result<Json<SummaryResponse>, AppError> {
    let text = tokio::fs::read_to_string(&request.document_path)
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => AppError::DocumentNotFound(request.document_path.clone()),
            _ => AppError::DocumentUnreadable(e.to_string()),
        })?;

    info!("Loaded document {}", request.document_path);
    run_pipeline(&state, &text).await.map(Json)
}

/// GET /health - Liveness check
async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        provider: state.provider_name.clone(),
    })
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    // UTF-8 needs at most 4 bytes per char; leave room for the JSON envelope
    let body_limit = state.max_text_length.saturating_mul(4).saturating_add(64 * 1024);

    AxumRouter::new()
        .route("/summarize", post(summarize_text))
        .route("/summarize/document", post(summarize_document))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
