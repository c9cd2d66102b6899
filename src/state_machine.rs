//! Conversation session state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.
//! The runtime owns the current `SessionState`, feeds it `Event`s, and
//! executes the returned `Effect`s.

mod effect;
pub mod event;
pub mod state;
mod transition;


pub use effect::Effect;
pub use event::{AssistantOutcome, Event};
pub use state::{Conversation, ConversationId, Message, MessageId, Role, SessionState};
pub use transition::{transition, TransitionError};
