//! Remote assistant client
//!
//! The assistant is an opaque request/response service: a chat call taking
//! the query plus prior turns, and a model-selection call.

mod error;
mod http;
mod types;

pub use error::{AssistantError, AssistantErrorKind};
pub use http::HttpAssistant;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for assistant backends
#[async_trait]
pub trait AssistantService: Send + Sync {
    /// Ask the assistant about `request.query`
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, AssistantError>;

    /// Switch the model used for subsequent chat calls
    async fn set_model(&self, model_name: &str) -> Result<(), AssistantError>;
}

#[async_trait]
impl<T: AssistantService + ?Sized> AssistantService for Arc<T> {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, AssistantError> {
        (**self).chat(request).await
    }

    async fn set_model(&self, model_name: &str) -> Result<(), AssistantError> {
        (**self).set_model(model_name).await
    }
}

/// Logging wrapper for assistant services
pub struct LoggingAssistant<T> {
    inner: T,
}

impl<T: AssistantService> LoggingAssistant<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: AssistantService> AssistantService for LoggingAssistant<T> {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, AssistantError> {
        let start = std::time::Instant::now();
        let result = self.inner.chat(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    duration_ms = %duration.as_millis(),
                    history_len = request.history.len(),
                    handled_error = reply.error,
                    "Assistant request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = ?e.kind,
                    "Assistant request failed"
                );
            }
        }

        result
    }

    async fn set_model(&self, model_name: &str) -> Result<(), AssistantError> {
        let result = self.inner.set_model(model_name).await;
        match &result {
            Ok(()) => tracing::info!(model = %model_name, "Assistant model changed"),
            Err(e) => {
                tracing::warn!(model = %model_name, error = %e, "Assistant model change failed");
            }
        }
        result
    }
}
