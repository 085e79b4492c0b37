//! Command channel: every CDP command funnels through here.

use serde_json::Value;
use tracing::debug;

use crate::error::ControlError;

use super::RemoteDebugController;

impl RemoteDebugController {
    /// Send one CDP command to the controlled tab, attaching first if
    /// needed.
    pub async fn send_command(&self, method: &str, params: Value) -> Result<Value, ControlError> {
        self.ensure_not_destroyed()?;
        self.channel_send(method, params).await
    }

    pub(crate) async fn channel_send(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Value, ControlError> {
        self.ensure_attached().await?;
        let Some(tab) = self.inner.session.attached() else {
            return Err(ControlError::NotAttached);
        };
        // Injected page state does not survive navigation. Refreshing it
        // rides alongside the command rather than in front of it; the
        // refresh talks to the transport directly and must never funnel
        // back through this channel.
        self.spawn_overlay_refresh();
        Ok(self.inner.transport.send_command(&tab, method, params).await?)
    }

    fn spawn_overlay_refresh(&self) {
        let controller = self.clone();
        tokio::spawn(async move {
            if let Err(err) = controller.enable_overlay().await {
                debug!("overlay refresh skipped: {err}");
            }
        });
    }
}
