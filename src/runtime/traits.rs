//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::db::Database;
use crate::state_machine::{Conversation, ConversationId};
use std::sync::Arc;

/// What a previous session left behind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedSession {
    pub conversations: Vec<Conversation>,
    pub id_watermark: Option<ConversationId>,
}

/// Durable storage for the conversation collection.
///
/// Both calls are synchronous and best-effort: `load` degrades to an empty
/// session, `save` failures are reported but never undo in-memory state.
pub trait Persistence: Send + Sync {
    fn load(&self) -> PersistedSession;

    fn save(
        &self,
        conversations: &[Conversation],
        id_watermark: ConversationId,
    ) -> Result<(), String>;
}

impl<T: Persistence + ?Sized> Persistence for Arc<T> {
    fn load(&self) -> PersistedSession {
        (**self).load()
    }

    fn save(
        &self,
        conversations: &[Conversation],
        id_watermark: ConversationId,
    ) -> Result<(), String> {
        (**self).save(conversations, id_watermark)
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use Database as Persistence
#[derive(Clone)]
pub struct DatabasePersistence {
    db: Database,
}

impl DatabasePersistence {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl Persistence for DatabasePersistence {
    fn load(&self) -> PersistedSession {
        let conversations = self.db.load_conversations().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Stored conversations unreadable, starting empty");
            Vec::new()
        });
        let id_watermark = self.db.load_id_watermark().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Stored id watermark unreadable, ignoring");
            None
        });
        PersistedSession {
            conversations,
            id_watermark,
        }
    }

    fn save(
        &self,
        conversations: &[Conversation],
        id_watermark: ConversationId,
    ) -> Result<(), String> {
        self.db
            .save_conversations(conversations, id_watermark)
            .map_err(|e| e.to_string())
    }
}
