//! Relay message envelope.
//!
//! Relayed backends cannot speak CDP directly; they forward every operation
//! as a tagged request to a broker (typically an extension service worker)
//! and read back a loose response object. The broker signals failure by
//! setting the `error` field instead of rejecting the channel itself.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransportError;
use crate::tab::{TabId, TabInfo};

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;

/// Request forwarded to the relay broker, tagged by operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RelayRequest {
    #[serde(rename = "GET_ACTIVE_TAB")]
    GetActiveTab,
    #[serde(rename = "GET_TAB_LIST")]
    GetTabList,
    #[serde(rename = "GET_TAB_URL")]
    GetTabUrl {
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },
    #[serde(rename = "SET_ACTIVE_TAB")]
    SetActiveTab {
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },
    #[serde(rename = "GET_EXTENSION_RESOURCE")]
    GetExtensionResource {
        #[serde(rename = "resourcePath")]
        resource_path: String,
    },
    #[serde(rename = "ATTACH_DEBUGGER")]
    AttachDebugger {
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },
    #[serde(rename = "DETACH_DEBUGGER")]
    DetachDebugger {
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },
    #[serde(rename = "SEND_DEBUGGER_COMMAND")]
    SendDebuggerCommand {
        #[serde(rename = "tabId")]
        tab_id: TabId,
        command: String,
        #[serde(default)]
        params: Value,
    },
}

impl RelayRequest {
    /// Operation tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GetActiveTab => "GET_ACTIVE_TAB",
            Self::GetTabList => "GET_TAB_LIST",
            Self::GetTabUrl { .. } => "GET_TAB_URL",
            Self::SetActiveTab { .. } => "SET_ACTIVE_TAB",
            Self::GetExtensionResource { .. } => "GET_EXTENSION_RESOURCE",
            Self::AttachDebugger { .. } => "ATTACH_DEBUGGER",
            Self::DetachDebugger { .. } => "DETACH_DEBUGGER",
            Self::SendDebuggerCommand { .. } => "SEND_DEBUGGER_COMMAND",
        }
    }
}

/// Response from the relay broker.
///
/// A loose union of every per-operation shape; fields not produced by the
/// answered operation stay `None` and are skipped on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<TabId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tabs: Option<Vec<TabInfo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

impl RelayResponse {
    pub fn ok() -> Self {
        Self {
            success: Some(true),
            ..Self::default()
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn tab_id(id: impl Into<TabId>) -> Self {
        Self {
            tab_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn tabs(tabs: Vec<TabInfo>) -> Self {
        Self {
            tabs: Some(tabs),
            ..Self::default()
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn command(response: Value) -> Self {
        Self {
            success: Some(true),
            response: Some(response),
            ..Self::default()
        }
    }

    /// Promote the broker's `error` field to a real error.
    pub fn into_result(self) -> Result<Self, TransportError> {
        match self.error {
            Some(message) => Err(TransportError::Relay(message)),
            None => Ok(self),
        }
    }
}
