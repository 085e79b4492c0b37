//! Controller error types.

use formpilot_protocols::TransportError;
use thiserror::Error;

/// Errors raised by the remote page controller.
///
/// Clone because a single failed attach negotiation is shared with every
/// caller that joined it.
#[derive(Debug, Clone, Error)]
pub enum ControlError {
    /// Any operation attempted after `destroy()`.
    #[error("Controller is destroyed")]
    ControllerDestroyed,

    /// Attach attempted against an internal/privileged page.
    #[error(
        "Cannot attach debugger to {url}: internal pages are not debuggable, \
         switch to a normal page with http://, https:// or file://"
    )]
    RestrictedPage { url: String },

    /// A command was sent without a live attachment.
    #[error("Debugger is not attached")]
    NotAttached,

    /// The underlying tab/debugger call rejected.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Page-content evaluation returned no value.
    #[error("Failed to get page content from page, error: {description}")]
    ExtractionFailed { description: String },

    /// `wait_until_network_idle` exceeded its bound.
    #[error("Failed to wait until network idle, last readyState: {last_state}")]
    NetworkIdleTimeout { last_state: String },

    /// The pinned tab cannot be reassigned once set.
    #[error("Active tab id is already set, which is {current}, cannot set it to {requested}")]
    ActiveTabAlreadyPinned { current: String, requested: String },

    /// A key name with no definition in the layout table.
    #[error("Unknown key: {0}")]
    UnknownKey(String),

    /// Lost or malformed structured data at the controller boundary.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ControlError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl ControlError {
    pub fn extraction(description: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            description: description.into(),
        }
    }
}
