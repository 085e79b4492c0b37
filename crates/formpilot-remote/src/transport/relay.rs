//! Relayed transport: every operation crosses a broker as a tagged
//! envelope instead of a CDP frame.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::trace;

use formpilot_protocols::{
    DebuggerTransport, RelayRequest, RelayResponse, TabId, TabInfo, TransportError,
};

#[cfg(test)]
#[path = "relay_tests.rs"]
mod tests;

/// Carries one request to the broker and returns its response.
///
/// The channel only fails when the broker itself is unreachable; broker-
/// level failures come back inside the [`RelayResponse`].
#[async_trait]
pub trait RelayChannel: Send + Sync {
    async fn exchange(&self, request: RelayRequest) -> Result<RelayResponse, TransportError>;
}

/// [`DebuggerTransport`] over any [`RelayChannel`].
pub struct RelayTransport<C> {
    channel: C,
}

impl<C: RelayChannel> RelayTransport<C> {
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    async fn exchange(&self, request: RelayRequest) -> Result<RelayResponse, TransportError> {
        trace!(kind = request.kind(), "relaying request");
        self.channel.exchange(request).await?.into_result()
    }
}

#[async_trait]
impl<C: RelayChannel> DebuggerTransport for RelayTransport<C> {
    async fn active_tab(&self) -> Result<TabId, TransportError> {
        let response = self.exchange(RelayRequest::GetActiveTab).await?;
        response
            .tab_id
            .ok_or_else(|| TransportError::Relay("active tab response carried no id".to_string()))
    }

    async fn list_tabs(&self) -> Result<Vec<TabInfo>, TransportError> {
        let response = self.exchange(RelayRequest::GetTabList).await?;
        Ok(response.tabs.unwrap_or_default())
    }

    async fn tab_url(&self, tab: &TabId) -> Result<String, TransportError> {
        let response = self
            .exchange(RelayRequest::GetTabUrl {
                tab_id: tab.clone(),
            })
            .await?;
        Ok(response.url.unwrap_or_default())
    }

    async fn activate_tab(&self, tab: &TabId) -> Result<(), TransportError> {
        self.exchange(RelayRequest::SetActiveTab {
            tab_id: tab.clone(),
        })
        .await?;
        Ok(())
    }

    async fn attach(&self, tab: &TabId) -> Result<(), TransportError> {
        self.exchange(RelayRequest::AttachDebugger {
            tab_id: tab.clone(),
        })
        .await?;
        Ok(())
    }

    async fn detach(&self, tab: &TabId) -> Result<(), TransportError> {
        self.exchange(RelayRequest::DetachDebugger {
            tab_id: tab.clone(),
        })
        .await?;
        Ok(())
    }

    async fn send_command(
        &self,
        tab: &TabId,
        method: &str,
        params: Value,
    ) -> Result<Value, TransportError> {
        let response = self
            .exchange(RelayRequest::SendDebuggerCommand {
                tab_id: tab.clone(),
                command: method.to_string(),
                params,
            })
            .await?;
        // Commands without a result (input dispatch, mostly) come back
        // with a bare success flag.
        Ok(response.response.unwrap_or(Value::Null))
    }

    async fn fetch_resource(&self, path: &str) -> Result<String, TransportError> {
        let response = self
            .exchange(RelayRequest::GetExtensionResource {
                resource_path: path.to_string(),
            })
            .await?;
        response
            .content
            .ok_or_else(|| TransportError::ResourceNotFound(path.to_string()))
    }
}

/// One in-flight relay exchange: the request plus the slot its response
/// goes back through.
pub struct RelayExchange {
    pub request: RelayRequest,
    pub reply: oneshot::Sender<RelayResponse>,
}

/// In-process [`RelayChannel`] backed by an mpsc queue.
///
/// The consuming side receives [`RelayExchange`]s and answers them; a
/// dropped receiver or reply slot surfaces as a closed channel.
#[derive(Clone)]
pub struct LocalRelayChannel {
    sender: mpsc::Sender<RelayExchange>,
}

impl LocalRelayChannel {
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<RelayExchange>) {
        let (sender, receiver) = mpsc::channel(buffer);
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl RelayChannel for LocalRelayChannel {
    async fn exchange(&self, request: RelayRequest) -> Result<RelayResponse, TransportError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(RelayExchange { request, reply })
            .await
            .map_err(|_| TransportError::ChannelClosed)?;
        response.await.map_err(|_| TransportError::ChannelClosed)
    }
}
