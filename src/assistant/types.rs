//! Wire types of the remote assistant contract

use crate::state_machine::{Message, Role};
use serde::{Deserialize, Serialize};

/// One prior turn as the assistant sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for HistoryEntry {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Body of `POST /chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    pub history: Vec<HistoryEntry>,
}

/// Body returned by `POST /chat`.
///
/// With `error: true` the `response` field is a message for the user, not
/// assistant content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub error: bool,
}

/// Body of `POST /set_model`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetModelRequest {
    pub model_name: String,
}
