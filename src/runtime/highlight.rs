//! Transient highlight timer
//!
//! One sleep per appended message. There is no cancellation: the expiry is
//! always delivered and the transition ignores it if the message is gone.

use crate::state_machine::{ConversationId, Event, MessageId};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub(super) fn schedule_expiry(
    event_tx: mpsc::UnboundedSender<Event>,
    conversation_id: ConversationId,
    message_id: MessageId,
    delay: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        // Send only fails once the runtime has stopped
        let _ = event_tx.send(Event::HighlightExpired {
            conversation_id,
            message_id,
        });
    })
}
