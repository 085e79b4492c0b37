//! Debugger transport protocol.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;
use crate::tab::{TabId, TabInfo};

/// Backend that carries debugger traffic for the page controller.
///
/// Two families exist: direct backends that own a CDP connection to the
/// browser, and relayed backends that forward the same operations through
/// a broker process. The controller never distinguishes the two.
///
/// Implementations must be safe to share behind an `Arc` and callable
/// from concurrent tasks.
#[async_trait]
pub trait DebuggerTransport: Send + Sync {
    /// Id of the currently focused page tab.
    async fn active_tab(&self) -> Result<TabId, TransportError>;

    /// All page tabs in the current window, focused tab flagged.
    async fn list_tabs(&self) -> Result<Vec<TabInfo>, TransportError>;

    /// Current URL of the given tab.
    async fn tab_url(&self, tab: &TabId) -> Result<String, TransportError>;

    /// Bring the given tab to the foreground.
    async fn activate_tab(&self, tab: &TabId) -> Result<(), TransportError>;

    /// Attach the debugger to the given tab.
    async fn attach(&self, tab: &TabId) -> Result<(), TransportError>;

    /// Detach the debugger from the given tab.
    async fn detach(&self, tab: &TabId) -> Result<(), TransportError>;

    /// Execute one CDP command against an attached tab.
    async fn send_command(
        &self,
        tab: &TabId,
        method: &str,
        params: Value,
    ) -> Result<Value, TransportError>;

    /// Load a bundled script resource by logical path.
    async fn fetch_resource(&self, path: &str) -> Result<String, TransportError>;
}
