//! Effects produced by state transitions

use super::state::{ConversationId, Message, MessageId};
use crate::assistant::ChatRequest;
use std::time::Duration;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Write the whole collection to durable storage
    PersistConversations,

    /// Call the remote assistant; the reply is delivered back as
    /// `Event::AssistantReply` for `conversation_id`
    RequestAssistant {
        conversation_id: ConversationId,
        request: ChatRequest,
    },

    /// Clear a message's recent marker after `delay`
    ScheduleHighlightExpiry {
        conversation_id: ConversationId,
        message_id: MessageId,
        delay: Duration,
    },

    /// Tell observers a message was appended
    NotifyMessage {
        conversation_id: ConversationId,
        message: Message,
    },

    /// Surface a user-visible error
    NotifyError { message: String },
}

impl Effect {
    pub fn notify_message(conversation_id: ConversationId, message: &Message) -> Self {
        Effect::NotifyMessage {
            conversation_id,
            message: message.clone(),
        }
    }

    pub fn notify_error(message: impl Into<String>) -> Self {
        Effect::NotifyError {
            message: message.into(),
        }
    }

    pub fn expire_highlight(
        conversation_id: ConversationId,
        message_id: MessageId,
        delay: Duration,
    ) -> Self {
        Effect::ScheduleHighlightExpiry {
            conversation_id,
            message_id,
            delay,
        }
    }
}
