//! Events that can occur in a session

use super::state::{ConversationId, MessageId, Role};
use crate::assistant::{AssistantError, ChatReply};

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // User events
    CreateConversation,
    SelectConversation {
        conversation_id: ConversationId,
    },
    RenameConversation {
        conversation_id: ConversationId,
        title: String,
    },
    DeleteConversation {
        conversation_id: ConversationId,
    },
    UserSubmit {
        conversation_id: ConversationId,
        query: String,
    },

    // Raw store writes
    AppendMessage {
        conversation_id: ConversationId,
        role: Role,
        content: String,
    },
    SetLoading {
        conversation_id: ConversationId,
        value: bool,
    },

    // Assistant events, bound to the conversation captured at submit time
    AssistantReply {
        conversation_id: ConversationId,
        outcome: AssistantOutcome,
    },

    // Timer events
    HighlightExpired {
        conversation_id: ConversationId,
        message_id: MessageId,
    },
}

/// How a remote assistant call ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantOutcome {
    /// Assistant content to append
    Reply { content: String },
    /// The service answered with `error: true`; `message` is for the user
    Rejected { message: String },
    /// No usable response (network, HTTP status, undecodable body)
    TransportFailed { detail: String },
}

impl From<Result<ChatReply, AssistantError>> for AssistantOutcome {
    fn from(result: Result<ChatReply, AssistantError>) -> Self {
        match result {
            Ok(reply) if reply.error => AssistantOutcome::Rejected {
                message: reply.response,
            },
            Ok(reply) => AssistantOutcome::Reply {
                content: reply.response,
            },
            Err(e) => AssistantOutcome::TransportFailed {
                detail: e.to_string(),
            },
        }
    }
}

impl Event {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Event::CreateConversation => "create_conversation",
            Event::SelectConversation { .. } => "select_conversation",
            Event::RenameConversation { .. } => "rename_conversation",
            Event::DeleteConversation { .. } => "delete_conversation",
            Event::UserSubmit { .. } => "user_submit",
            Event::AppendMessage { .. } => "append_message",
            Event::SetLoading { .. } => "set_loading",
            Event::AssistantReply { .. } => "assistant_reply",
            Event::HighlightExpired { .. } => "highlight_expired",
        }
    }
}
