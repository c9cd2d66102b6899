//! Assistant client error types

use thiserror::Error;

/// Failure to obtain a usable response from the assistant service
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AssistantError {
    pub kind: AssistantErrorKind,
    pub message: String,
}

impl AssistantError {
    pub fn new(kind: AssistantErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(AssistantErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(AssistantErrorKind::Timeout, message)
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::new(AssistantErrorKind::Http(status), message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(AssistantErrorKind::Decode, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(AssistantErrorKind::Unavailable, message)
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantErrorKind {
    /// Connection refused, reset, DNS
    Network,
    /// No answer within the configured timeout
    Timeout,
    /// Non-success HTTP status
    Http(u16),
    /// Body was not a valid reply
    Decode,
    /// Client could not be constructed
    Unavailable,
}
