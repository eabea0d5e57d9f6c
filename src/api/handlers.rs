//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    CreateConversationResponse, ErrorResponse, OkResponse, SubmitRequest, SubmitResponse,
};
use super::AppState;
use crate::form::SAMPLE_PROMPTS;
use crate::progress::ProgressStage;
use crate::runtime::{ConversationHandle, ConversationSnapshot, SubmitError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Conversation lifecycle
        .route("/api/conversations/new", post(create_conversation))
        .route(
            "/api/conversations/:id",
            get(get_conversation).delete(delete_conversation),
        )
        // SSE streaming
        .route("/api/conversations/:id/stream", get(stream_conversation))
        // User actions
        .route("/api/conversations/:id/submit", post(submit_prompt))
        .route("/api/conversations/:id/resubmit", post(resubmit_prompt))
        .route("/api/conversations/:id/reset", post(reset_conversation))
        // Progress checklist labels
        .route("/api/stages", get(list_stages))
        .route("/api/sample-prompts", get(list_sample_prompts))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Conversations
// ============================================================

async fn create_conversation(State(state): State<AppState>) -> Json<CreateConversationResponse> {
    let (id, _) = state.runtime.create().await;
    Json(CreateConversationResponse { id })
}

async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationSnapshot>, AppError> {
    let handle = lookup(&state, &id).await?;
    Ok(Json(handle.snapshot()))
}

async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, AppError> {
    if state.runtime.remove(&id).await {
        Ok(Json(OkResponse { ok: true }))
    } else {
        Err(AppError::NotFound(format!("Conversation not found: {id}")))
    }
}

async fn stream_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let handle = lookup(&state, &id).await?;

    // Subscribe first so nothing published after the snapshot is lost
    let broadcast_rx = handle.subscribe();
    let init = handle.snapshot();

    Ok(sse_stream(init, broadcast_rx))
}

// ============================================================
// User Actions
// ============================================================

async fn submit_prompt(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SubmitRequest>,
) -> Result<impl IntoResponse, AppError> {
    let handle = lookup(&state, &id).await?;
    handle.submit(req.prompt).await?;
    Ok((StatusCode::ACCEPTED, Json(SubmitResponse { accepted: true })))
}

async fn resubmit_prompt(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SubmitRequest>,
) -> Result<impl IntoResponse, AppError> {
    let handle = lookup(&state, &id).await?;
    handle.resubmit(req.prompt).await?;
    Ok((StatusCode::ACCEPTED, Json(SubmitResponse { accepted: true })))
}

async fn reset_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, AppError> {
    let handle = lookup(&state, &id).await?;
    handle.reset().await?;
    Ok(Json(OkResponse { ok: true }))
}

// ============================================================
// Metadata
// ============================================================

async fn list_stages(State(state): State<AppState>) -> Json<Vec<ProgressStage>> {
    Json(state.runtime.stages())
}

async fn list_sample_prompts() -> Json<[&'static str; 6]> {
    Json(SAMPLE_PROMPTS)
}

async fn get_version() -> &'static str {
    concat!("fgpt ", env!("CARGO_PKG_VERSION"))
}

async fn lookup(state: &AppState, id: &str) -> Result<ConversationHandle, AppError> {
    state
        .runtime
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Conversation not found: {id}")))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl From<SubmitError> for AppError {
    fn from(error: SubmitError) -> Self {
        let message = error.to_string();
        match error {
            SubmitError::EmptyInput => AppError::BadRequest(message),
            SubmitError::InvalidState { .. } => AppError::Conflict(message),
            SubmitError::RuntimeStopped => AppError::Internal(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
