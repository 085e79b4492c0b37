//! Visual feedback overlay and page setup scripts.
//!
//! Everything here is decoration for someone watching the controlled
//! browser. Overlay traffic therefore bypasses the command channel and
//! talks to the transport directly: the channel triggers overlay
//! refreshes, and a refresh that funneled back through the channel would
//! wait on itself.

use formpilot_protocols::Point;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::ControlError;
use crate::scripts::{HIDE_POINTER_EXPRESSION, LIMIT_NEW_TAB_EXPRESSION, show_pointer_expression};

use super::RemoteDebugController;

impl RemoteDebugController {
    /// Evaluate an expression against the attached tab without touching
    /// the attachment machinery.
    pub(crate) async fn raw_evaluate(&self, expression: &str) -> Result<Value, ControlError> {
        let Some(tab) = self.inner.session.attached() else {
            return Err(ControlError::NotAttached);
        };
        Ok(self
            .inner
            .transport
            .send_command(&tab, "Runtime.evaluate", json!({ "expression": expression }))
            .await?)
    }

    /// (Re)install the page setup scripts on the attached tab: the
    /// same-tab navigation patch, the overlay bundle, and the pointer at
    /// its last recorded position. No-op without an attachment.
    pub(crate) async fn enable_overlay(&self) -> Result<(), ControlError> {
        if self.inner.session.attached().is_none() {
            return Ok(());
        }
        if self.inner.force_same_tab_navigation {
            self.raw_evaluate(LIMIT_NEW_TAB_EXPRESSION).await?;
        }
        if self.inner.overlay {
            let script = self
                .inner
                .scripts
                .overlay_start
                .get_or_fetch(self.inner.transport.as_ref())
                .await?;
            self.raw_evaluate(&script).await?;
            let pointer = *self.inner.pointer.lock();
            self.raw_evaluate(&show_pointer_expression(pointer.x, pointer.y))
                .await?;
        }
        Ok(())
    }

    /// Remove the overlay from the attached tab. Failures are logged,
    /// not raised; the tab may be navigating or gone.
    pub(crate) async fn disable_overlay(&self) {
        if !self.inner.overlay || self.inner.session.attached().is_none() {
            return;
        }
        let script = match self
            .inner
            .scripts
            .overlay_stop
            .get_or_fetch(self.inner.transport.as_ref())
            .await
        {
            Ok(script) => script,
            Err(err) => {
                warn!("overlay stop script unavailable: {err}");
                return;
            }
        };
        if let Err(err) = self.raw_evaluate(&script).await {
            warn!("overlay teardown failed: {err}");
        }
    }

    /// Move the visual pointer to `point`. Best effort: does nothing
    /// when the overlay is off or no tab is attached, and swallows page
    /// errors. Display only; the recorded pointer position is owned by
    /// the input operations.
    pub async fn show_pointer(&self, point: Point) {
        if !self.inner.overlay || self.inner.session.attached().is_none() {
            return;
        }
        if let Err(err) = self
            .raw_evaluate(&show_pointer_expression(point.x, point.y))
            .await
        {
            debug!("pointer overlay update failed: {err}");
        }
    }

    /// Hide the visual pointer. Best effort, like [`Self::show_pointer`].
    pub async fn hide_pointer(&self) {
        if !self.inner.overlay || self.inner.session.attached().is_none() {
            return;
        }
        if let Err(err) = self.raw_evaluate(HIDE_POINTER_EXPRESSION).await {
            debug!("pointer overlay hide failed: {err}");
        }
    }
}
