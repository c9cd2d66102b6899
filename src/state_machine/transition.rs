//! Pure state transition function
//!
//! Every store operation and every turn reconciliation goes through
//! `transition`, which takes the current snapshot and returns the next one
//! plus the effects the runtime must carry out.

use super::event::AssistantOutcome;
use super::state::{ConversationId, Role, SessionState};
use super::{Effect, Event};
use crate::assistant::{ChatRequest, HistoryEntry};
use crate::config::GENERIC_ERROR_MESSAGE;
use std::time::Duration;
use thiserror::Error;

/// How long a freshly appended message stays marked as recent
pub const HIGHLIGHT_DURATION: Duration = Duration::from_millis(2000);

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    /// State unchanged, nothing to do
    pub fn unchanged(state: &SessionState) -> Self {
        Self::new(state.clone())
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    pub fn is_noop(&self) -> bool {
        self.effects.is_empty()
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Query is empty")]
    EmptyQuery,
    #[error("Conversation not found: {0}")]
    ConversationNotFound(ConversationId),
    #[error("Conversation {0} is waiting for a reply")]
    ConversationBusy(ConversationId),
}

/// Pure transition function
///
/// Given the same snapshot and event it always produces the same result and
/// performs no I/O.
pub fn transition(
    state: &SessionState,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match event {
        // ============================================================
        // Conversation lifecycle
        // ============================================================
        Event::CreateConversation => {
            let mut next = state.clone();
            next.create_conversation();
            Ok(TransitionResult::new(next).with_effect(Effect::PersistConversations))
        }

        Event::SelectConversation { conversation_id } => {
            let mut next = state.clone();
            if state.current_conversation_id == Some(conversation_id)
                || !next.select_conversation(conversation_id)
            {
                return Ok(TransitionResult::unchanged(state));
            }
            Ok(TransitionResult::new(next).with_effect(Effect::PersistConversations))
        }

        Event::RenameConversation {
            conversation_id,
            title,
        } => {
            let mut next = state.clone();
            if !next.rename_conversation(conversation_id, &title) {
                return Ok(TransitionResult::unchanged(state));
            }
            Ok(TransitionResult::new(next).with_effect(Effect::PersistConversations))
        }

        Event::DeleteConversation { conversation_id } => {
            let mut next = state.clone();
            if !next.delete_conversation(conversation_id) {
                return Ok(TransitionResult::unchanged(state));
            }
            Ok(TransitionResult::new(next).with_effect(Effect::PersistConversations))
        }

        // ============================================================
        // Raw store writes
        // ============================================================
        Event::AppendMessage {
            conversation_id,
            role,
            content,
        } => {
            let mut next = state.clone();
            let Some(message) = next.append_message(conversation_id, role, &content) else {
                return Ok(TransitionResult::unchanged(state));
            };
            Ok(TransitionResult::new(next).with_effects([
                Effect::PersistConversations,
                Effect::notify_message(conversation_id, &message),
                Effect::expire_highlight(conversation_id, message.id, HIGHLIGHT_DURATION),
            ]))
        }

        Event::SetLoading {
            conversation_id,
            value,
        } => {
            if state.conversation(conversation_id).map(|c| c.is_loading) != Some(!value) {
                return Ok(TransitionResult::unchanged(state));
            }
            let mut next = state.clone();
            next.set_loading(conversation_id, value);
            Ok(TransitionResult::new(next).with_effect(Effect::PersistConversations))
        }

        // ============================================================
        // Turn handling
        // ============================================================
        Event::UserSubmit {
            conversation_id,
            query,
        } => submit(state, conversation_id, query),

        Event::AssistantReply {
            conversation_id,
            outcome,
        } => reconcile(state, conversation_id, outcome),

        // ============================================================
        // Highlight decay
        // ============================================================
        Event::HighlightExpired {
            conversation_id,
            message_id,
        } => {
            let mut next = state.clone();
            if !next.clear_recent(conversation_id, message_id) {
                return Ok(TransitionResult::unchanged(state));
            }
            Ok(TransitionResult::new(next).with_effect(Effect::PersistConversations))
        }
    }
}

/// Optimistic half of a turn: append the user message, mark the
/// conversation busy, and ask for the assistant call.
fn submit(
    state: &SessionState,
    conversation_id: ConversationId,
    query: String,
) -> Result<TransitionResult, TransitionError> {
    if query.trim().is_empty() {
        return Err(TransitionError::EmptyQuery);
    }
    let conv = state
        .conversation(conversation_id)
        .ok_or(TransitionError::ConversationNotFound(conversation_id))?;
    if conv.is_loading {
        return Err(TransitionError::ConversationBusy(conversation_id));
    }

    // History is everything before the new turn
    let history: Vec<HistoryEntry> = conv.messages.iter().map(HistoryEntry::from).collect();

    let mut next = state.clone();
    let message = next
        .append_message(conversation_id, Role::User, &query)
        .ok_or(TransitionError::ConversationNotFound(conversation_id))?;
    next.set_loading(conversation_id, true);

    Ok(TransitionResult::new(next).with_effects([
        Effect::PersistConversations,
        Effect::notify_message(conversation_id, &message),
        Effect::expire_highlight(conversation_id, message.id, HIGHLIGHT_DURATION),
        Effect::RequestAssistant {
            conversation_id,
            request: ChatRequest { query, history },
        },
    ]))
}

/// Apply the outcome of an assistant call to the conversation that issued it.
///
/// The user's own turn is never rolled back; every path ends with the
/// loading flag cleared. A conversation deleted while the call was in flight
/// absorbs the outcome silently.
fn reconcile(
    state: &SessionState,
    conversation_id: ConversationId,
    outcome: AssistantOutcome,
) -> Result<TransitionResult, TransitionError> {
    if !state.contains(conversation_id) {
        return Ok(TransitionResult::unchanged(state));
    }

    let mut next = state.clone();
    next.set_loading(conversation_id, false);

    match outcome {
        AssistantOutcome::Reply { content } => {
            let message = next
                .append_message(conversation_id, Role::Assistant, &content)
                .ok_or(TransitionError::ConversationNotFound(conversation_id))?;
            Ok(TransitionResult::new(next).with_effects([
                Effect::PersistConversations,
                Effect::notify_message(conversation_id, &message),
                Effect::expire_highlight(conversation_id, message.id, HIGHLIGHT_DURATION),
            ]))
        }
        AssistantOutcome::Rejected { message } => Ok(TransitionResult::new(next)
            .with_effect(Effect::PersistConversations)
            .with_effect(Effect::notify_error(message))),
        AssistantOutcome::TransportFailed { .. } => Ok(TransitionResult::new(next)
            .with_effect(Effect::PersistConversations)
            .with_effect(Effect::notify_error(GENERIC_ERROR_MESSAGE))),
    }
}
