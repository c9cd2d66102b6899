//! Session runtime executor

use super::highlight::schedule_expiry;
use super::traits::Persistence;
use super::{Command, SessionEvent};

use crate::assistant::{AssistantService, ChatRequest};
use crate::state_machine::{
    transition, AssistantOutcome, ConversationId, Effect, Event, SessionState, TransitionError,
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

/// Generic session runtime that can work with any persistence and assistant
/// implementations
pub struct SessionRuntime<P, A>
where
    P: Persistence + 'static,
    A: AssistantService + 'static,
{
    state: SessionState,
    persistence: P,
    assistant: Arc<A>,
    command_rx: mpsc::Receiver<Command>,
    /// Completions of spawned work (assistant replies, highlight expiries)
    completion_tx: mpsc::UnboundedSender<Event>,
    completion_rx: mpsc::UnboundedReceiver<Event>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
    snapshot_tx: watch::Sender<Arc<SessionState>>,
}

impl<P, A> SessionRuntime<P, A>
where
    P: Persistence + 'static,
    A: AssistantService + 'static,
{
    /// Restore the session from `persistence`, creating a first conversation
    /// when nothing usable was stored.
    pub fn new(
        persistence: P,
        assistant: Arc<A>,
        command_rx: mpsc::Receiver<Command>,
        broadcast_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        let stored = persistence.load();
        let state = SessionState::restore(stored.conversations, stored.id_watermark);
        tracing::info!(
            conversations = state.conversations.len(),
            next_id = state.next_conversation_id,
            "Session restored"
        );

        let (snapshot_tx, _) = watch::channel(Arc::new(state.clone()));
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        let mut runtime = Self {
            state,
            persistence,
            assistant,
            command_rx,
            completion_tx,
            completion_rx,
            broadcast_tx,
            snapshot_tx,
        };

        if runtime.state.conversations.is_empty() {
            if let Err(e) = runtime.process_event(Event::CreateConversation) {
                tracing::error!(error = %e, "Failed to create initial conversation");
            }
        }

        runtime
    }

    pub fn subscribe_snapshots(&self) -> watch::Receiver<Arc<SessionState>> {
        self.snapshot_tx.subscribe()
    }

    pub async fn run(mut self) {
        tracing::info!("Starting session runtime");

        loop {
            tokio::select! {
                command = self.command_rx.recv() => {
                    let Some(Command { event, reply }) = command else {
                        break;
                    };
                    let result = self.process_event(event);
                    if let Some(reply) = reply {
                        let _ = reply.send(result);
                    }
                }
                Some(event) = self.completion_rx.recv() => {
                    if let Err(e) = self.process_event(event) {
                        tracing::warn!(error = %e, "Completion event rejected");
                    }
                }
            }
        }

        tracing::info!("Session runtime stopped");
    }

    fn process_event(&mut self, event: Event) -> Result<Arc<SessionState>, TransitionError> {
        let event_name = event.name();

        // Pure state transition
        let result = match transition(&self.state, event) {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(event = event_name, error = %e, "Event rejected");
                return Err(e);
            }
        };

        if result.is_noop() {
            tracing::debug!(event = event_name, "Event had no effect");
            return Ok(self.snapshot_tx.borrow().clone());
        }

        self.state = result.new_state;
        let snapshot = Arc::new(self.state.clone());
        self.snapshot_tx.send_replace(Arc::clone(&snapshot));
        let _ = self.broadcast_tx.send(SessionEvent::StateChange {
            state: Arc::clone(&snapshot),
        });

        for effect in result.effects {
            self.execute_effect(effect);
        }

        Ok(snapshot)
    }

    fn execute_effect(&self, effect: Effect) {
        match effect {
            Effect::PersistConversations => {
                if let Err(e) = self
                    .persistence
                    .save(&self.state.conversations, self.state.next_conversation_id)
                {
                    // In-memory state stays authoritative
                    tracing::warn!(error = %e, "Failed to persist conversations");
                }
            }

            Effect::RequestAssistant {
                conversation_id,
                request,
            } => self.spawn_assistant_request(conversation_id, request),

            Effect::ScheduleHighlightExpiry {
                conversation_id,
                message_id,
                delay,
            } => {
                drop(schedule_expiry(
                    self.completion_tx.clone(),
                    conversation_id,
                    message_id,
                    delay,
                ));
            }

            Effect::NotifyMessage {
                conversation_id,
                message,
            } => {
                let _ = self.broadcast_tx.send(SessionEvent::Message {
                    conversation_id,
                    message,
                });
            }

            Effect::NotifyError { message } => {
                tracing::info!(message = %message, "Surfacing error to user");
                let _ = self.broadcast_tx.send(SessionEvent::Error { message });
            }
        }
    }

    /// Run the assistant call in the background. Its outcome is delivered
    /// for `conversation_id` regardless of which conversation is active by
    /// then.
    fn spawn_assistant_request(&self, conversation_id: ConversationId, request: ChatRequest) {
        let assistant = Arc::clone(&self.assistant);
        let completion_tx = self.completion_tx.clone();

        tracing::info!(
            conv_id = conversation_id,
            history_len = request.history.len(),
            "Requesting assistant reply"
        );

        tokio::spawn(async move {
            let outcome = AssistantOutcome::from(assistant.chat(&request).await);
            if let AssistantOutcome::TransportFailed { detail } = &outcome {
                tracing::error!(
                    conv_id = conversation_id,
                    error = %detail,
                    "Assistant unreachable"
                );
            }
            let _ = completion_tx.send(Event::AssistantReply {
                conversation_id,
                outcome,
            });
        });
    }
}
