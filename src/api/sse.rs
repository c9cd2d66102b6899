//! Server-Sent Events support
//!
//! Each client first receives the full snapshot, then every session event.

use crate::runtime::SessionEvent;
use crate::state_machine::SessionState;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream
pub fn sse_stream(
    init: Arc<SessionState>,
    broadcast_rx: tokio::sync::broadcast::Receiver<SessionEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Create stream that starts with init event then broadcasts
    let init = futures::stream::once(async move {
        Ok(Event::default().event("init").data(
            json!({
                "type": "init",
                "session": init.as_ref()
            })
            .to_string(),
        ))
    });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(session_event_to_axum(&event))),
        Err(_) => None, // Skip lagged messages
    });

    let combined = init.chain(broadcasts);

    Sse::new(combined).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn session_event_to_axum(event: &SessionEvent) -> Event {
    let (event_type, data) = match event {
        SessionEvent::StateChange { state } => (
            "state_change",
            json!({
                "type": "state_change",
                "session": state.as_ref()
            }),
        ),
        SessionEvent::Message {
            conversation_id,
            message,
        } => (
            "message",
            json!({
                "type": "message",
                "conversationId": conversation_id,
                "message": message
            }),
        ),
        SessionEvent::Error { message } => (
            "error",
            json!({
                "type": "error",
                "message": message
            }),
        ),
        SessionEvent::Notice { message } => (
            "notice",
            json!({
                "type": "notice",
                "message": message
            }),
        ),
    };

    Event::default().event(event_type).data(data.to_string())
}
