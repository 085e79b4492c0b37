//! Debugger attachment lifecycle.

use std::time::Duration;

use formpilot_protocols::TabId;
use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::error::ControlError;

use super::RemoteDebugController;

/// The debugger needs a beat after attaching before commands land.
const ATTACH_SETTLE: Duration = Duration::from_millis(500);
const DETACH_SETTLE: Duration = Duration::from_millis(200);

/// Pages the browser refuses to debug.
const RESTRICTED_PREFIXES: &[&str] = &[
    "chrome://",
    "chrome-extension://",
    "devtools://",
    "edge://",
    "about:",
];

impl RemoteDebugController {
    /// Attach the debugger to the controlled tab.
    ///
    /// Concurrent callers join the negotiation already in flight instead
    /// of racing their own. The in-flight slot is cleared after every
    /// outcome, success or failure, so a failed attach never wedges the
    /// next attempt.
    pub(crate) async fn ensure_attached(&self) -> Result<(), ControlError> {
        self.ensure_not_destroyed()?;
        let negotiation = {
            let mut in_flight = self.inner.in_flight_attach.lock();
            match in_flight.as_ref() {
                Some(negotiation) => negotiation.clone(),
                None => {
                    let controller = self.clone();
                    let negotiation = async move {
                        let result = controller.negotiate().await;
                        *controller.inner.in_flight_attach.lock() = None;
                        if let Err(err) = &result {
                            error!("debugger attach failed: {err}");
                        }
                        result
                    }
                    .boxed()
                    .shared();
                    *in_flight = Some(negotiation.clone());
                    negotiation
                }
            }
        };
        negotiation.await
    }

    async fn negotiate(&self) -> Result<(), ControlError> {
        let target = self.resolve_target_tab().await?;
        let url = self.inner.transport.tab_url(&target).await?;
        if RESTRICTED_PREFIXES
            .iter()
            .any(|prefix| url.starts_with(prefix))
        {
            return Err(ControlError::RestrictedPage { url });
        }

        if self.inner.session.attached().as_ref() == Some(&target) {
            return Ok(());
        }
        if let Some(previous) = self.inner.session.attached() {
            debug!(tab = %previous, "detaching before switching tabs");
            self.detach_target(&previous).await;
        }

        self.inner.transport.attach(&target).await?;
        tokio::time::sleep(ATTACH_SETTLE).await;
        self.inner.session.record_attached(target.clone());
        info!(tab = %target, %url, "debugger attached");

        // Page decoration only; a page that rejects the scripts is still
        // controllable.
        if let Err(err) = self.enable_overlay().await {
            warn!("page setup scripts failed after attach: {err}");
        }
        Ok(())
    }

    /// Detach from the attached tab, if any. Errors are logged, not
    /// raised; the tab may already be gone.
    pub async fn detach(&self) -> Result<(), ControlError> {
        self.ensure_not_destroyed()?;
        self.detach_inner().await;
        Ok(())
    }

    /// Detach a specific tab, attached or not. The attachment marker is
    /// cleared only when it points at that tab.
    pub async fn detach_tab(&self, tab: &TabId) -> Result<(), ControlError> {
        self.ensure_not_destroyed()?;
        self.detach_target(tab).await;
        Ok(())
    }

    pub(crate) async fn detach_inner(&self) {
        let Some(tab) = self.inner.session.attached() else {
            warn!("no tab to detach");
            return;
        };
        self.detach_target(&tab).await;
    }

    async fn detach_target(&self, tab: &TabId) {
        // Give the overlay teardown animation time to finish before the
        // session goes away.
        self.disable_overlay().await;
        tokio::time::sleep(DETACH_SETTLE).await;
        if let Err(err) = self.inner.transport.detach(tab).await {
            warn!(tab = %tab, "debugger detach failed: {err}");
        }
        self.inner.session.clear_attached_if(tab);
    }

    /// The tab every operation targets: the pinned tab when set, the
    /// browser's focused tab otherwise.
    pub(crate) async fn resolve_target_tab(&self) -> Result<TabId, ControlError> {
        if let Some(pinned) = self.inner.session.pinned() {
            return Ok(pinned);
        }
        Ok(self.inner.transport.active_tab().await?)
    }

    pub(crate) async fn current_url(&self) -> Result<String, ControlError> {
        let tab = self.resolve_target_tab().await?;
        Ok(self.inner.transport.tab_url(&tab).await?)
    }
}
