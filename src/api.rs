//! HTTP API for Chatbook
//!
//! Local JSON + SSE surface over a single running session.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::config::Config;
use crate::runtime::SessionHandle;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(session: SessionHandle, config: Config) -> Self {
        Self {
            session,
            config: Arc::new(config),
        }
    }
}
