//! Session runtime
//!
//! A single task owns the `SessionState` and applies every event to it in
//! order. Assistant calls and highlight timers run as spawned tasks whose
//! completions come back through the same loop as events bound to the
//! conversation they were issued for.

mod executor;
mod highlight;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;
pub use traits::*;

use crate::assistant::{AssistantError, AssistantService};
use crate::config::{MODEL_CHANGED_NOTICE, MODEL_CHANGE_FAILED, QUICK_QUERIES};
use crate::search::filter_conversations;
use crate::state_machine::{
    Conversation, ConversationId, Event, Message, SessionState, TransitionError,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

/// Events sent to observers (SSE clients, tests)
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The snapshot changed
    StateChange { state: Arc<SessionState> },
    /// A message was appended to `conversation_id`
    Message {
        conversation_id: ConversationId,
        message: Message,
    },
    /// User-visible error toast
    Error { message: String },
    /// User-visible success toast
    Notice { message: String },
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Rejected(#[from] TransitionError),
    #[error("No quick query at index {0}")]
    UnknownQuickQuery(usize),
    #[error("No active conversation")]
    NoActiveConversation,
    #[error("Session runtime stopped")]
    Stopped,
}

type Reply = oneshot::Sender<Result<Arc<SessionState>, TransitionError>>;

/// An event plus an optional channel for its outcome
pub(crate) struct Command {
    pub event: Event,
    pub reply: Option<Reply>,
}

/// Cheap, cloneable access to a running session
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<Command>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
    snapshot_rx: watch::Receiver<Arc<SessionState>>,
    assistant: Arc<dyn AssistantService>,
}

/// Load the session from `persistence` and start its runtime task.
///
/// Must be called from within a tokio runtime.
pub fn start<P, A>(persistence: P, assistant: A) -> SessionHandle
where
    P: Persistence + 'static,
    A: AssistantService + 'static,
{
    let assistant = Arc::new(assistant);
    let (command_tx, command_rx) = mpsc::channel(64);
    let (broadcast_tx, _) = broadcast::channel(128);

    let runtime = SessionRuntime::new(
        persistence,
        Arc::clone(&assistant),
        command_rx,
        broadcast_tx.clone(),
    );
    let snapshot_rx = runtime.subscribe_snapshots();

    tokio::spawn(async move {
        runtime.run().await;
        tracing::info!("Session runtime finished");
    });

    SessionHandle {
        command_tx,
        broadcast_tx,
        snapshot_rx,
        assistant,
    }
}

impl SessionHandle {
    /// Apply an event and wait for the resulting snapshot
    pub async fn dispatch(&self, event: Event) -> Result<Arc<SessionState>, RuntimeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command {
                event,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| RuntimeError::Stopped)?;
        let result = reply_rx.await.map_err(|_| RuntimeError::Stopped)?;
        Ok(result?)
    }

    pub async fn create_conversation(&self) -> Result<Arc<SessionState>, RuntimeError> {
        self.dispatch(Event::CreateConversation).await
    }

    pub async fn select_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Arc<SessionState>, RuntimeError> {
        self.dispatch(Event::SelectConversation { conversation_id })
            .await
    }

    pub async fn rename_conversation(
        &self,
        conversation_id: ConversationId,
        title: impl Into<String>,
    ) -> Result<Arc<SessionState>, RuntimeError> {
        self.dispatch(Event::RenameConversation {
            conversation_id,
            title: title.into(),
        })
        .await
    }

    pub async fn delete_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Arc<SessionState>, RuntimeError> {
        self.dispatch(Event::DeleteConversation { conversation_id })
            .await
    }

    /// Start a turn. Returns once the user message is in place and the
    /// assistant call is underway; the reply arrives later as a state change.
    pub async fn submit(
        &self,
        conversation_id: ConversationId,
        query: impl Into<String>,
    ) -> Result<Arc<SessionState>, RuntimeError> {
        self.dispatch(Event::UserSubmit {
            conversation_id,
            query: query.into(),
        })
        .await
    }

    /// Submit the preset at `index` to the active conversation
    pub async fn submit_quick_query(
        &self,
        index: usize,
    ) -> Result<Arc<SessionState>, RuntimeError> {
        let preset = QUICK_QUERIES
            .get(index)
            .ok_or(RuntimeError::UnknownQuickQuery(index))?;
        let conversation_id = self
            .snapshot()
            .current_conversation_id
            .ok_or(RuntimeError::NoActiveConversation)?;
        self.submit(conversation_id, preset.query).await
    }

    /// Ask the assistant service to switch models. Only observers hear
    /// about the outcome; conversation state is untouched.
    pub async fn select_model(&self, model_name: &str) -> Result<(), AssistantError> {
        let result = self.assistant.set_model(model_name).await;
        let event = match &result {
            Ok(()) => SessionEvent::Notice {
                message: format!("{MODEL_CHANGED_NOTICE} {model_name}"),
            },
            Err(_) => SessionEvent::Error {
                message: MODEL_CHANGE_FAILED.to_string(),
            },
        };
        let _ = self.broadcast_tx.send(event);
        result
    }

    /// Latest snapshot
    pub fn snapshot(&self) -> Arc<SessionState> {
        self.snapshot_rx.borrow().clone()
    }

    /// Conversations matching `term`, from the latest snapshot
    pub fn search(&self, term: &str) -> Vec<Conversation> {
        let snapshot = self.snapshot();
        filter_conversations(&snapshot.conversations, term)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Receiver that wakes on every snapshot change
    pub fn watch(&self) -> watch::Receiver<Arc<SessionState>> {
        self.snapshot_rx.clone()
    }
}
