//! Failure taxonomy shared by the session, guard and request pipeline.

use serde::Serialize;
use thiserror::Error;

/// Result type used across the client.
pub type ClientResult<T> = Result<T, ClientError>;

/// What went wrong below the response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum TransportCause {
    /// The request did not complete within the configured timeout.
    Timeout,
    /// No response was received (DNS, refused connection, reset, ...).
    Network,
    /// A response arrived with a non-success HTTP status.
    Status(u16),
}

/// A call that failed before a response envelope could be read.
///
/// Never retried automatically; the caller may retry by hand.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportFailure {
    pub cause: TransportCause,
    /// User-facing message for this cause.
    pub message: String,
}

/// Client-level error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The login collaborator rejected the credentials.
    #[error("login rejected: {message}")]
    AuthFailure { code: i64, message: String },

    /// The server answered with an authoritative `401` envelope.
    #[error("session expired: {message}")]
    SessionExpired { message: String },

    /// Any other non-success envelope.
    #[error("request failed ({code}): {message}")]
    Remote { code: i64, message: String },

    #[error(transparent)]
    Transport(#[from] TransportFailure),

    /// The payload did not have the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// The message to show the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthFailure { message, .. }
            | Self::SessionExpired { message }
            | Self::Remote { message, .. } => message.clone(),
            Self::Transport(failure) => failure.message.clone(),
            Self::Decode(_) => "unexpected response from server".to_string(),
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired { .. })
    }
}
