//! API request and response types

use crate::config::QuickQuery;
use crate::state_machine::{Conversation, ConversationId, SessionState};
use serde::{Deserialize, Serialize};

/// Query string for conversation listing
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub search: String,
}

/// Request to rename a conversation
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub title: String,
}

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub query: String,
}

/// Request to switch the assistant model
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectModelRequest {
    pub model_name: String,
}

/// Sidebar entry
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub title: String,
    pub is_loading: bool,
    pub message_count: usize,
}

impl From<&Conversation> for ConversationSummary {
    fn from(conv: &Conversation) -> Self {
        Self {
            id: conv.id,
            title: conv.title.clone(),
            is_loading: conv.is_loading,
            message_count: conv.messages.len(),
        }
    }
}

/// Response with a (possibly filtered) list of conversations
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationListResponse {
    pub conversations: Vec<ConversationSummary>,
    pub current_conversation_id: Option<ConversationId>,
}

/// Response with a single conversation and its messages
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub conversation: Conversation,
    pub is_current: bool,
}

/// Full snapshot after a command was applied
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: SessionState,
}

/// Response for chat action
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub queued: bool,
}

/// A preset as shown to the client
#[derive(Debug, Serialize)]
pub struct QuickQueryInfo {
    pub index: usize,
    pub label: &'static str,
    pub query: &'static str,
}

impl QuickQueryInfo {
    pub fn new(index: usize, preset: &QuickQuery) -> Self {
        Self {
            index,
            label: preset.label,
            query: preset.query,
        }
    }
}

/// Response listing quick-query presets
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickQueriesResponse {
    pub quick_queries: Vec<QuickQueryInfo>,
}

/// Response for available models
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<&'static str>,
    pub default: String,
}

/// Generic success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
