//! Transport errors.

use thiserror::Error;

/// Errors raised by a [`crate::DebuggerTransport`] backend.
///
/// Clone so a single failed negotiation can be reported to every caller
/// that was waiting on it.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Transport connection failed: {0}")]
    Connection(String),

    #[error("Tab not found: {0}")]
    TabNotFound(String),

    #[error("Command {method} failed: {message}")]
    Command { method: String, message: String },

    #[error("Relay error: {0}")]
    Relay(String),

    #[error("Relay channel closed")]
    ChannelClosed,

    #[error("Timed out waiting for response to {0}")]
    Timeout(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TransportError {
    pub fn command(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            method: method.into(),
            message: message.into(),
        }
    }
}
