//! HTTP implementation of the assistant contract

use super::types::{ChatReply, ChatRequest, SetModelRequest};
use super::{AssistantError, AssistantService};
use crate::config::AssistantConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

/// Longest body excerpt kept in an error message
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Talks to the assistant server over JSON/HTTP
pub struct HttpAssistant {
    client: Client,
    chat_url: String,
    set_model_url: String,
}

impl HttpAssistant {
    pub fn new(config: &AssistantConfig) -> Result<Self, AssistantError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                AssistantError::unavailable(format!("Failed to create HTTP client: {e}"))
            })?;

        let base = config.server_url.trim_end_matches('/');
        Ok(Self {
            client,
            chat_url: format!("{base}/chat"),
            set_model_url: format!("{base}/set_model"),
        })
    }

    async fn post<B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<String, AssistantError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AssistantError::timeout(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    AssistantError::network(format!("Connection failed: {e}"))
                } else {
                    AssistantError::network(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AssistantError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let excerpt: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            return Err(AssistantError::http(
                status.as_u16(),
                format!("HTTP {status}: {excerpt}"),
            ));
        }

        Ok(body)
    }
}

#[async_trait]
impl AssistantService for HttpAssistant {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, AssistantError> {
        let body = self.post(&self.chat_url, request).await?;
        serde_json::from_str(&body)
            .map_err(|e| AssistantError::decode(format!("Failed to parse response: {e}")))
    }

    async fn set_model(&self, model_name: &str) -> Result<(), AssistantError> {
        let request = SetModelRequest {
            model_name: model_name.to_string(),
        };
        self.post(&self.set_model_url, &request).await.map(|_| ())
    }
}
