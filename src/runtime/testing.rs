//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::{PersistedSession, Persistence};
use crate::assistant::{AssistantError, AssistantService, ChatReply, ChatRequest};
use crate::state_machine::{Conversation, ConversationId};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::oneshot;

// ============================================================================
// Mock Assistant
// ============================================================================

/// Mock assistant that returns queued replies immediately
pub struct MockAssistant {
    replies: Mutex<VecDeque<Result<ChatReply, AssistantError>>>,
    model_result: Mutex<Result<(), AssistantError>>,
    /// Record of all chat requests made
    pub requests: Mutex<Vec<ChatRequest>>,
    /// Record of all model names requested
    pub model_requests: Mutex<Vec<String>>,
}

impl MockAssistant {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            model_result: Mutex::new(Ok(())),
            requests: Mutex::new(Vec::new()),
            model_requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, content: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(ChatReply {
            response: content.into(),
            error: false,
        }));
    }

    /// Queue a reply flagged `error: true`
    pub fn queue_handled_error(&self, message: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(ChatReply {
            response: message.into(),
            error: true,
        }));
    }

    /// Queue a transport failure
    pub fn queue_failure(&self, error: AssistantError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn fail_model_changes(&self) {
        *self.model_result.lock().unwrap() = Err(AssistantError::http(500, "model unavailable"));
    }

    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockAssistant {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssistantService for MockAssistant {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, AssistantError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AssistantError::network("No mock reply queued")))
    }

    async fn set_model(&self, model_name: &str) -> Result<(), AssistantError> {
        self.model_requests
            .lock()
            .unwrap()
            .push(model_name.to_string());
        self.model_result.lock().unwrap().clone()
    }
}

// ============================================================================
// Gated Assistant (for ordering tests)
// ============================================================================

type PendingReply = oneshot::Sender<Result<ChatReply, AssistantError>>;

/// Assistant whose calls block until the test releases them by query text
pub struct GatedAssistant {
    pending: Mutex<HashMap<String, PendingReply>>,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl GatedAssistant {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Complete the in-flight call for `query`, waiting for it to start
    pub async fn release(&self, query: &str, result: Result<ChatReply, AssistantError>) {
        loop {
            let sender = self.pending.lock().unwrap().remove(query);
            if let Some(sender) = sender {
                let _ = sender.send(result);
                return;
            }
            tokio::task::yield_now().await;
        }
    }

    pub async fn reply(&self, query: &str, content: &str) {
        self.release(
            query,
            Ok(ChatReply {
                response: content.to_string(),
                error: false,
            }),
        )
        .await;
    }
}

#[async_trait]
impl AssistantService for GatedAssistant {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, AssistantError> {
        let (tx, rx) = oneshot::channel();
        self.requests.lock().unwrap().push(request.clone());
        self.pending
            .lock()
            .unwrap()
            .insert(request.query.clone(), tx);
        rx.await
            .unwrap_or_else(|_| Err(AssistantError::network("Gate dropped")))
    }

    async fn set_model(&self, _model_name: &str) -> Result<(), AssistantError> {
        Ok(())
    }
}

// ============================================================================
// In-Memory Persistence
// ============================================================================

/// In-memory persistence for testing
pub struct InMemoryPersistence {
    stored: Mutex<PersistedSession>,
    saves: Mutex<usize>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::with_session(PersistedSession::default())
    }

    pub fn with_session(session: PersistedSession) -> Self {
        Self {
            stored: Mutex::new(session),
            saves: Mutex::new(0),
        }
    }

    pub fn stored(&self) -> PersistedSession {
        self.stored.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl Default for InMemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

impl Persistence for InMemoryPersistence {
    fn load(&self) -> PersistedSession {
        self.stored()
    }

    fn save(
        &self,
        conversations: &[Conversation],
        id_watermark: ConversationId,
    ) -> Result<(), String> {
        *self.stored.lock().unwrap() = PersistedSession {
            conversations: conversations.to_vec(),
            id_watermark: Some(id_watermark),
        };
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

/// Persistence whose writes always fail (quota exceeded, disk full)
pub struct FailingPersistence {
    pub attempts: Mutex<usize>,
}

impl FailingPersistence {
    pub fn new() -> Self {
        Self {
            attempts: Mutex::new(0),
        }
    }
}

impl Persistence for FailingPersistence {
    fn load(&self) -> PersistedSession {
        PersistedSession::default()
    }

    fn save(&self, _: &[Conversation], _: ConversationId) -> Result<(), String> {
        *self.attempts.lock().unwrap() += 1;
        Err("storage quota exceeded".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GENERIC_ERROR_MESSAGE, QUICK_QUERIES};
    use crate::runtime::{start, RuntimeError, SessionEvent, SessionHandle};
    use crate::state_machine::state::greeting_message;
    use crate::state_machine::{Message, Role, SessionState, TransitionError};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::broadcast;

    const WAIT: Duration = Duration::from_secs(5);

    /// Wait until the snapshot satisfies `pred`
    async fn settle(
        handle: &SessionHandle,
        pred: impl FnMut(&Arc<SessionState>) -> bool,
    ) -> Arc<SessionState> {
        let mut rx = handle.watch();
        let state = tokio::time::timeout(WAIT, rx.wait_for(pred))
            .await
            .expect("state did not settle")
            .expect("runtime stopped");
        Arc::clone(&state)
    }

    async fn idle(handle: &SessionHandle, conversation_id: ConversationId) -> Arc<SessionState> {
        settle(handle, |s| !s.is_loading(conversation_id)).await
    }

    /// Drain broadcast events until one matches
    async fn expect_event(
        rx: &mut broadcast::Receiver<SessionEvent>,
        mut pred: impl FnMut(&SessionEvent) -> bool,
    ) -> SessionEvent {
        tokio::time::timeout(WAIT, async {
            loop {
                let event = rx.recv().await.expect("broadcast closed");
                if pred(&event) {
                    return event;
                }
            }
        })
        .await
        .expect("event not observed")
    }

    fn roles(messages: &[Message]) -> Vec<Role> {
        messages.iter().map(|m| m.role).collect()
    }

    #[tokio::test]
    async fn test_startup_on_empty_storage_creates_conversation() {
        let persistence = Arc::new(InMemoryPersistence::new());
        let handle = start(Arc::clone(&persistence), MockAssistant::new());

        let state = handle.snapshot();
        assert_eq!(state.conversations.len(), 1);
        assert_eq!(state.current_conversation_id, Some(1));
        assert_eq!(persistence.stored().conversations.len(), 1);
        assert_eq!(persistence.save_count(), 1);
    }

    #[tokio::test]
    async fn test_startup_restores_stored_session() {
        let mut stale = greeting_message();
        stale.is_recent = true;
        let stored = PersistedSession {
            conversations: vec![
                Conversation {
                    id: 5,
                    title: "Eo Gió".to_string(),
                    messages: vec![stale],
                    is_loading: true,
                },
                Conversation {
                    id: 2,
                    title: "Món ngon".to_string(),
                    messages: vec![greeting_message()],
                    is_loading: false,
                },
            ],
            id_watermark: Some(8),
        };
        let handle = start(
            InMemoryPersistence::with_session(stored),
            MockAssistant::new(),
        );

        let state = handle.snapshot();
        assert_eq!(state.current_conversation_id, Some(5));
        let eo_gio = state.conversation(5).unwrap();
        assert!(!eo_gio.is_loading);
        assert!(!eo_gio.messages[0].is_recent);

        let state = handle.create_conversation().await.unwrap();
        assert_eq!(state.current_conversation_id, Some(8));
    }

    #[tokio::test]
    async fn test_successful_turn() {
        let assistant = Arc::new(MockAssistant::new());
        assistant.queue_reply("Bãi biển Kỳ Co rất đẹp");
        let persistence = Arc::new(InMemoryPersistence::new());
        let handle = start(Arc::clone(&persistence), Arc::clone(&assistant));
        let mut events = handle.subscribe();

        let optimistic = handle.submit(1, "Địa điểm vui chơi").await.unwrap();
        let conv = optimistic.conversation(1).unwrap();
        assert_eq!(conv.title, "Địa điểm vui chơi");
        assert_eq!(conv.last_message().unwrap().role, Role::User);

        let state = idle(&handle, 1).await;
        let conv = state.conversation(1).unwrap();
        assert_eq!(
            roles(&conv.messages),
            vec![Role::Assistant, Role::User, Role::Assistant]
        );
        assert_eq!(conv.messages[2].content, "Bãi biển Kỳ Co rất đẹp");

        let requests = assistant.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].query, "Địa điểm vui chơi");
        assert_eq!(requests[0].history.len(), 1);

        expect_event(&mut events, |e| {
            matches!(e, SessionEvent::Message { message, .. } if message.role == Role::Assistant)
        })
        .await;

        let stored = persistence.stored();
        assert_eq!(stored.conversations[0].messages.len(), 3);
        assert!(!stored.conversations[0].is_loading);
    }

    #[tokio::test]
    async fn test_handled_error_keeps_user_turn_only() {
        let assistant = Arc::new(MockAssistant::new());
        assistant.queue_handled_error("rate limited");
        let handle = start(InMemoryPersistence::new(), Arc::clone(&assistant));
        let mut events = handle.subscribe();

        handle.submit(1, "Khách sạn").await.unwrap();
        let state = idle(&handle, 1).await;

        let conv = state.conversation(1).unwrap();
        assert_eq!(roles(&conv.messages), vec![Role::Assistant, Role::User]);

        let event = expect_event(&mut events, |e| matches!(e, SessionEvent::Error { .. })).await;
        assert!(matches!(event, SessionEvent::Error { message } if message == "rate limited"));
    }

    #[tokio::test]
    async fn test_transport_failure_surfaces_generic_error() {
        let assistant = Arc::new(MockAssistant::new());
        assistant.queue_failure(AssistantError::network("connection refused"));
        let handle = start(InMemoryPersistence::new(), Arc::clone(&assistant));
        let mut events = handle.subscribe();

        handle.submit(1, "Món ngon").await.unwrap();
        let state = idle(&handle, 1).await;
        assert_eq!(state.conversation(1).unwrap().messages.len(), 2);

        let event = expect_event(&mut events, |e| matches!(e, SessionEvent::Error { .. })).await;
        assert!(
            matches!(event, SessionEvent::Error { message } if message == GENERIC_ERROR_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_reply_lands_on_originating_conversation_after_switch() {
        let assistant = Arc::new(GatedAssistant::new());
        let handle = start(InMemoryPersistence::new(), Arc::clone(&assistant));
        handle.create_conversation().await.unwrap();

        handle.select_conversation(1).await.unwrap();
        handle.submit(1, "from A").await.unwrap();
        let switched = handle.select_conversation(2).await.unwrap();
        let b_before = switched.conversation(2).unwrap().clone();

        assistant.reply("from A", "answer for A").await;
        let state = idle(&handle, 1).await;

        let a = state.conversation(1).unwrap();
        assert_eq!(a.last_message().unwrap().content, "answer for A");
        assert_eq!(state.conversation(2).unwrap(), &b_before);
        assert_eq!(state.current_conversation_id, Some(2));
    }

    #[tokio::test]
    async fn test_concurrent_turns_reconcile_independently() {
        let assistant = Arc::new(GatedAssistant::new());
        let handle = start(InMemoryPersistence::new(), Arc::clone(&assistant));
        handle.create_conversation().await.unwrap();

        handle.submit(1, "question one").await.unwrap();
        let both = handle.submit(2, "question two").await.unwrap();
        assert!(both.is_loading(1) && both.is_loading(2));

        // Resolve out of order
        assistant.reply("question two", "answer two").await;
        let state = idle(&handle, 2).await;
        assert!(state.is_loading(1));
        assert_eq!(
            state.conversation(2).unwrap().last_message().unwrap().content,
            "answer two"
        );

        assistant.reply("question one", "answer one").await;
        let state = idle(&handle, 1).await;
        assert_eq!(
            state.conversation(1).unwrap().last_message().unwrap().content,
            "answer one"
        );
        assert_eq!(state.conversation(2).unwrap().messages.len(), 3);
    }

    #[tokio::test]
    async fn test_submit_while_loading_is_rejected_without_request() {
        let assistant = Arc::new(GatedAssistant::new());
        let handle = start(InMemoryPersistence::new(), Arc::clone(&assistant));

        handle.submit(1, "first").await.unwrap();
        let err = handle.submit(1, "second").await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Rejected(TransitionError::ConversationBusy(1))
        ));
        assert_eq!(handle.snapshot().conversation(1).unwrap().messages.len(), 2);

        assistant.reply("first", "done").await;
        idle(&handle, 1).await;
        assert_eq!(assistant.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected_locally() {
        let assistant = Arc::new(MockAssistant::new());
        let handle = start(InMemoryPersistence::new(), Arc::clone(&assistant));
        let before = handle.snapshot();

        let err = handle.submit(1, "   ").await.unwrap_err();
        assert!(matches!(err, RuntimeError::Rejected(TransitionError::EmptyQuery)));
        assert_eq!(handle.snapshot(), before);
        assert!(assistant.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_persistence_failure_does_not_abort_mutation() {
        let persistence = Arc::new(FailingPersistence::new());
        let assistant = Arc::new(MockAssistant::new());
        assistant.queue_reply("ok");
        let handle = start(Arc::clone(&persistence), Arc::clone(&assistant));

        handle.submit(1, "hello").await.unwrap();
        idle(&handle, 1).await;
        let state = handle.rename_conversation(1, "Chuyến đi").await.unwrap();

        let conv = state.conversation(1).unwrap();
        assert_eq!(conv.title, "Chuyến đi");
        assert_eq!(conv.messages.len(), 3);
        assert!(*persistence.attempts.lock().unwrap() >= 3);
    }

    #[tokio::test]
    async fn test_delete_during_request_absorbs_reply() {
        let assistant = Arc::new(GatedAssistant::new());
        let handle = start(InMemoryPersistence::new(), Arc::clone(&assistant));
        handle.create_conversation().await.unwrap();

        handle.submit(1, "doomed").await.unwrap();
        handle.delete_conversation(1).await.unwrap();
        assistant.reply("doomed", "nobody hears this").await;

        // Runtime keeps serving after the absorbed reply
        let state = handle.rename_conversation(2, "still alive").await.unwrap();
        assert!(!state.contains(1));
        assert_eq!(state.conversations.len(), 1);
        assert_eq!(state.conversation(2).unwrap().messages.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_last_conversation_seeds_replacement() {
        let handle = start(InMemoryPersistence::new(), MockAssistant::new());
        let state = handle.delete_conversation(1).await.unwrap();

        assert_eq!(state.conversations.len(), 1);
        let conv = &state.conversations[0];
        assert_eq!(conv.id, 2);
        assert_eq!(conv.messages.len(), 1);
        assert_eq!(state.current_conversation_id, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recent_marker_decays_after_two_seconds() {
        let assistant = Arc::new(MockAssistant::new());
        assistant.queue_reply("Tháp Đôi");
        let handle = start(InMemoryPersistence::new(), Arc::clone(&assistant));

        handle.submit(1, "Địa điểm").await.unwrap();
        let state = idle(&handle, 1).await;
        let conv = state.conversation(1).unwrap();
        assert!(conv.messages[1].is_recent);
        assert!(conv.messages[2].is_recent);

        let state = settle(&handle, |s| {
            s.conversation(1)
                .is_some_and(|c| c.messages.iter().all(|m| !m.is_recent))
        })
        .await;
        assert_eq!(state.conversation(1).unwrap().messages.len(), 3);
    }

    #[tokio::test]
    async fn test_quick_query_submits_preset_to_active_conversation() {
        let assistant = Arc::new(MockAssistant::new());
        assistant.queue_reply("Bánh hỏi lòng heo");
        let handle = start(InMemoryPersistence::new(), Arc::clone(&assistant));
        handle.create_conversation().await.unwrap();

        handle.submit_quick_query(2).await.unwrap();
        let state = idle(&handle, 2).await;
        assert_eq!(state.conversation(2).unwrap().title, QUICK_QUERIES[2].query);
        assert_eq!(assistant.recorded_requests()[0].query, "Món ngon");

        let err = handle.submit_quick_query(99).await.unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownQuickQuery(99)));
    }

    #[tokio::test]
    async fn test_select_model_reports_outcome_without_state_change() {
        let assistant = Arc::new(MockAssistant::new());
        let handle = start(InMemoryPersistence::new(), Arc::clone(&assistant));
        let mut events = handle.subscribe();
        let before = handle.snapshot();

        handle.select_model("openai/gpt-4o").await.unwrap();
        let event = expect_event(&mut events, |e| matches!(e, SessionEvent::Notice { .. })).await;
        assert!(matches!(
            event,
            SessionEvent::Notice { message } if message == "Đã đổi model thành openai/gpt-4o"
        ));

        assistant.fail_model_changes();
        assert!(handle.select_model("openai/gpt-4o-mini").await.is_err());
        let event = expect_event(&mut events, |e| matches!(e, SessionEvent::Error { .. })).await;
        assert!(matches!(
            event,
            SessionEvent::Error { message } if message == "Đổi model thất bại!"
        ));

        assert_eq!(handle.snapshot(), before);
        assert_eq!(
            *assistant.model_requests.lock().unwrap(),
            vec!["openai/gpt-4o".to_string(), "openai/gpt-4o-mini".to_string()]
        );
    }

    #[tokio::test]
    async fn test_search_reads_latest_snapshot() {
        let handle = start(InMemoryPersistence::new(), MockAssistant::new());
        handle.create_conversation().await.unwrap();
        handle.rename_conversation(2, "Lễ hội Bình Định").await.unwrap();

        assert_eq!(handle.search("").len(), 2);
        let found = handle.search("BÌNH");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 2);
        assert!(handle.search("Đà Lạt").is_empty());
    }
}
