//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ChatResponse, ConversationListResponse, ConversationResponse, ConversationSummary,
    ErrorResponse, ListQuery, ModelsResponse, QuickQueriesResponse, QuickQueryInfo,
    RenameRequest, SelectModelRequest, SessionResponse, SubmitRequest, SuccessResponse,
};
use super::AppState;
use crate::config::{MODELS, QUICK_QUERIES};
use crate::runtime::RuntimeError;
use crate::state_machine::{ConversationId, SessionState, TransitionError};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Conversation listing and search
        .route("/api/conversations", get(list_conversations))
        .route("/api/conversations/new", post(create_conversation))
        .route("/api/conversations/:id", get(get_conversation))
        // Conversation commands
        .route("/api/conversations/:id/select", post(select_conversation))
        .route("/api/conversations/:id/rename", post(rename_conversation))
        .route("/api/conversations/:id/delete", post(delete_conversation))
        .route("/api/conversations/:id/chat", post(send_chat))
        // Presets
        .route("/api/quick-queries", get(list_quick_queries))
        .route("/api/quick-queries/:index", post(submit_quick_query))
        // Model selection
        .route("/api/models", get(list_models))
        .route("/api/models/select", post(select_model))
        // Live updates
        .route("/api/stream", get(stream_session))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

fn session_response(state: &Arc<SessionState>) -> Json<SessionResponse> {
    Json(SessionResponse {
        session: state.as_ref().clone(),
    })
}

// ============================================================
// Conversation Listing
// ============================================================

async fn list_conversations(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<ConversationListResponse> {
    let snapshot = state.session.snapshot();
    let conversations = state
        .session
        .search(&query.search)
        .iter()
        .map(ConversationSummary::from)
        .collect();

    Json(ConversationListResponse {
        conversations,
        current_conversation_id: snapshot.current_conversation_id,
    })
}

async fn create_conversation(
    State(state): State<AppState>,
) -> Result<Json<SessionResponse>, AppError> {
    let snapshot = state.session.create_conversation().await?;
    Ok(session_response(&snapshot))
}

async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<ConversationId>,
) -> Result<Json<ConversationResponse>, AppError> {
    let snapshot = state.session.snapshot();
    let conversation = snapshot
        .conversation(id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Conversation not found: {id}")))?;

    Ok(Json(ConversationResponse {
        conversation,
        is_current: snapshot.current_conversation_id == Some(id),
    }))
}

// ============================================================
// Conversation Commands
// ============================================================

async fn select_conversation(
    State(state): State<AppState>,
    Path(id): Path<ConversationId>,
) -> Result<Json<SessionResponse>, AppError> {
    let snapshot = state.session.select_conversation(id).await?;
    Ok(session_response(&snapshot))
}

async fn rename_conversation(
    State(state): State<AppState>,
    Path(id): Path<ConversationId>,
    Json(req): Json<RenameRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let snapshot = state.session.rename_conversation(id, req.title).await?;
    Ok(session_response(&snapshot))
}

async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<ConversationId>,
) -> Result<Json<SessionResponse>, AppError> {
    let snapshot = state.session.delete_conversation(id).await?;
    Ok(session_response(&snapshot))
}

async fn send_chat(
    State(state): State<AppState>,
    Path(id): Path<ConversationId>,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    state.session.submit(id, req.query).await?;
    Ok(Json(ChatResponse { queued: true }))
}

// ============================================================
// Quick Queries
// ============================================================

async fn list_quick_queries() -> Json<QuickQueriesResponse> {
    Json(QuickQueriesResponse {
        quick_queries: QUICK_QUERIES
            .iter()
            .enumerate()
            .map(|(index, preset)| QuickQueryInfo::new(index, preset))
            .collect(),
    })
}

async fn submit_quick_query(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<ChatResponse>, AppError> {
    state.session.submit_quick_query(index).await?;
    Ok(Json(ChatResponse { queued: true }))
}

// ============================================================
// Model Selection
// ============================================================

async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: MODELS.to_vec(),
        default: state.config.assistant.default_model.clone(),
    })
}

async fn select_model(
    State(state): State<AppState>,
    Json(req): Json<SelectModelRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !MODELS.contains(&req.model_name.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Unknown model: {}",
            req.model_name
        )));
    }

    state
        .session
        .select_model(&req.model_name)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// SSE Streaming
// ============================================================

async fn stream_session(State(state): State<AppState>) -> impl IntoResponse {
    // Subscribe before taking the snapshot so nothing falls in between
    let broadcast_rx = state.session.subscribe();
    sse_stream(state.session.snapshot(), broadcast_rx)
}

async fn get_version() -> &'static str {
    concat!("chatbook ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Upstream(String),
    Internal(String),
}

impl From<RuntimeError> for AppError {
    fn from(err: RuntimeError) -> Self {
        let message = err.to_string();
        match err {
            RuntimeError::Rejected(TransitionError::EmptyQuery) => AppError::BadRequest(message),
            RuntimeError::Rejected(TransitionError::ConversationNotFound(_))
            | RuntimeError::UnknownQuickQuery(_)
            | RuntimeError::NoActiveConversation => AppError::NotFound(message),
            RuntimeError::Rejected(TransitionError::ConversationBusy(_)) => {
                AppError::Conflict(message)
            }
            RuntimeError::Stopped => AppError::Internal(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
