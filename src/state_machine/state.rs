//! Session state types
//!
//! `SessionState` is the authoritative in-memory snapshot: the ordered
//! conversation collection, the active conversation, and the id counters.
//! The store operations below mutate an owned copy; `transition` clones the
//! current snapshot, applies one of them, and hands back the result.

use crate::config::GREETING;
use crate::title::{derive_title, placeholder_title};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub type ConversationId = u64;
pub type MessageId = u64;

/// Author of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single turn in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Session-local identity, renumbered on load
    #[serde(default)]
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    /// Entry-animation marker, cleared by the highlight timer
    #[serde(default, alias = "isNew")]
    pub is_recent: bool,
}

/// An independently titled thread of messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub is_loading: bool,
}

impl Conversation {
    /// The message carrying `message_id`, if it is still present
    pub fn message(&self, message_id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == message_id)
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Full session snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub conversations: Vec<Conversation>,
    pub current_conversation_id: Option<ConversationId>,
    /// High-water mark; ids below it are never handed out again
    #[serde(skip)]
    pub next_conversation_id: ConversationId,
    #[serde(skip)]
    pub next_message_id: MessageId,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::empty()
    }
}

impl SessionState {
    pub fn empty() -> Self {
        Self {
            conversations: Vec::new(),
            current_conversation_id: None,
            next_conversation_id: 1,
            next_message_id: 1,
        }
    }

    /// Rebuild a session from a persisted collection.
    ///
    /// Flags that only make sense within a running session are cleared
    /// (`is_recent`, `is_loading`), duplicate or zero ids are dropped, empty
    /// conversations are re-seeded, and message ids are renumbered. The first
    /// conversation becomes active.
    pub fn restore(
        conversations: Vec<Conversation>,
        id_watermark: Option<ConversationId>,
    ) -> Self {
        let mut state = Self::empty();
        let mut seen = HashSet::new();

        for mut conv in conversations {
            if conv.id == 0 || !seen.insert(conv.id) {
                continue;
            }
            conv.is_loading = false;
            if conv.messages.is_empty() {
                conv.messages.push(greeting_message());
            }
            for msg in &mut conv.messages {
                msg.id = state.allocate_message_id();
                msg.is_recent = false;
            }
            state.conversations.push(conv);
        }

        let after_max = state
            .conversations
            .iter()
            .map(|c| c.id)
            .max()
            .map_or(1, |max| max + 1);
        state.next_conversation_id = id_watermark.unwrap_or(0).max(after_max);
        state.current_conversation_id = state.conversations.first().map(|c| c.id);
        state
    }

    pub fn conversation(&self, id: ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    fn conversation_mut(&mut self, id: ConversationId) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    /// The active conversation
    pub fn current(&self) -> Option<&Conversation> {
        self.current_conversation_id
            .and_then(|id| self.conversation(id))
    }

    pub fn contains(&self, id: ConversationId) -> bool {
        self.conversation(id).is_some()
    }

    pub fn is_loading(&self, id: ConversationId) -> bool {
        self.conversation(id).is_some_and(|c| c.is_loading)
    }

    fn allocate_message_id(&mut self) -> MessageId {
        let id = self.next_message_id;
        self.next_message_id += 1;
        id
    }

    // ==================== Store operations ====================

    /// Allocate the next id, seed the greeting, append and activate.
    pub fn create_conversation(&mut self) -> ConversationId {
        let after_max = self
            .conversations
            .iter()
            .map(|c| c.id)
            .max()
            .map_or(1, |max| max + 1);
        let id = self.next_conversation_id.max(after_max);
        self.next_conversation_id = id + 1;

        let mut greeting = greeting_message();
        greeting.id = self.allocate_message_id();

        self.conversations.push(Conversation {
            id,
            title: placeholder_title(id),
            messages: vec![greeting],
            is_loading: false,
        });
        self.current_conversation_id = Some(id);
        id
    }

    /// Activate `id`. Returns false (and changes nothing) if it is absent.
    pub fn select_conversation(&mut self, id: ConversationId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.current_conversation_id = Some(id);
        true
    }

    /// Set the title verbatim. Returns whether anything changed.
    pub fn rename_conversation(&mut self, id: ConversationId, title: &str) -> bool {
        match self.conversation_mut(id) {
            Some(conv) if conv.title != title => {
                conv.title = title.to_string();
                true
            }
            _ => false,
        }
    }

    /// Remove `id`, promoting the first remaining conversation (or a fresh
    /// one) when the active conversation was deleted.
    pub fn delete_conversation(&mut self, id: ConversationId) -> bool {
        let before = self.conversations.len();
        self.conversations.retain(|c| c.id != id);
        if self.conversations.len() == before {
            return false;
        }

        if self.current_conversation_id == Some(id) || self.current().is_none() {
            match self.conversations.first() {
                Some(first) => self.current_conversation_id = Some(first.id),
                None => {
                    self.current_conversation_id = None;
                    self.create_conversation();
                }
            }
        }
        true
    }

    /// Append a recent message. A user turn landing on a conversation that
    /// still holds only its greeting also names the conversation.
    pub fn append_message(
        &mut self,
        id: ConversationId,
        role: Role,
        content: &str,
    ) -> Option<Message> {
        let message_id = self.next_message_id;
        let conv = self.conversation_mut(id)?;

        if role == Role::User && conv.messages.len() == 1 {
            conv.title = derive_title(content);
        }

        let message = Message {
            id: message_id,
            role,
            content: content.to_string(),
            is_recent: true,
        };
        conv.messages.push(message.clone());
        self.next_message_id += 1;
        Some(message)
    }

    pub fn set_loading(&mut self, id: ConversationId, value: bool) -> bool {
        match self.conversation_mut(id) {
            Some(conv) => {
                conv.is_loading = value;
                true
            }
            None => false,
        }
    }

    /// Clear the recent marker of one message. No-op if the conversation or
    /// message has gone away or the marker is already clear.
    pub fn clear_recent(&mut self, id: ConversationId, message_id: MessageId) -> bool {
        let Some(msg) = self
            .conversation_mut(id)
            .and_then(|c| c.messages.iter_mut().find(|m| m.id == message_id))
        else {
            return false;
        };
        let was_recent = msg.is_recent;
        msg.is_recent = false;
        was_recent
    }
}

/// The seed turn every conversation starts with
pub fn greeting_message() -> Message {
    Message {
        id: 0,
        role: Role::Assistant,
        content: GREETING.to_string(),
        is_recent: false,
    }
}
