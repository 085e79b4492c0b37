//! Remote page controller.
//!
//! [`RemoteDebugController`] drives one browser tab over a
//! [`DebuggerTransport`]: it negotiates debugger attachment, dispatches
//! input, extracts page structure and keeps the visual overlay in step.
//! The controller is cheap to clone; clones share one session.

mod attach;
mod channel;
mod input;
mod introspect;
mod overlay;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use formpilot_protocols::{DebuggerTransport, Point, Size, TabId, TabInfo};
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;

use crate::error::ControlError;
use crate::keys::Keyboard;
use crate::scripts::ScriptBundles;

pub use input::{KeyPress, MouseButton};


/// Where the pointer overlay starts before any input has moved it.
const DEFAULT_POINTER: Point = Point { x: 100.0, y: 100.0 };

/// One attach negotiation, shareable between every caller that joins it.
type AttachFuture = Shared<BoxFuture<'static, Result<(), ControlError>>>;

/// Controller construction switches.
#[derive(Debug, Clone, Copy)]
pub struct ControllerOptions {
    /// Rewrite new-tab navigation to stay in the controlled tab.
    pub force_same_tab_navigation: bool,
    /// Inject the visual feedback overlay into controlled pages.
    pub overlay: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            force_same_tab_navigation: true,
            overlay: true,
        }
    }
}

/// Tab bookkeeping: which tab the debugger is attached to, and which tab
/// the caller pinned as the controlled one.
#[derive(Debug, Default)]
pub(crate) struct TabSession {
    attached: Mutex<Option<TabId>>,
    pinned: Mutex<Option<TabId>>,
}

impl TabSession {
    pub(crate) fn attached(&self) -> Option<TabId> {
        self.attached.lock().clone()
    }

    pub(crate) fn record_attached(&self, tab: TabId) {
        *self.attached.lock() = Some(tab);
    }

    /// Clear the attachment only if it still points at `tab`. A negotiation
    /// that re-attached elsewhere in the meantime keeps its record.
    pub(crate) fn clear_attached_if(&self, tab: &TabId) {
        let mut attached = self.attached.lock();
        if attached.as_ref() == Some(tab) {
            *attached = None;
        }
    }

    pub(crate) fn pinned(&self) -> Option<TabId> {
        self.pinned.lock().clone()
    }

    /// Pin the controlled tab. Write-once: re-pinning is an error even for
    /// the same tab.
    pub(crate) fn pin(&self, tab: TabId) -> Result<(), ControlError> {
        let mut pinned = self.pinned.lock();
        if let Some(current) = pinned.as_ref() {
            return Err(ControlError::ActiveTabAlreadyPinned {
                current: current.to_string(),
                requested: tab.to_string(),
            });
        }
        *pinned = Some(tab);
        Ok(())
    }

    pub(crate) fn clear_pinned(&self) {
        *self.pinned.lock() = None;
    }
}

pub(crate) struct ControllerInner {
    pub(crate) transport: Arc<dyn DebuggerTransport>,
    pub(crate) force_same_tab_navigation: bool,
    pub(crate) overlay: bool,
    pub(crate) destroyed: AtomicBool,
    pub(crate) session: TabSession,
    pub(crate) in_flight_attach: Mutex<Option<AttachFuture>>,
    pub(crate) pointer: Mutex<Point>,
    pub(crate) mobile_emulation: Mutex<Option<bool>>,
    pub(crate) viewport: Mutex<Option<Size>>,
    pub(crate) keyboard: Mutex<Keyboard>,
    pub(crate) scripts: ScriptBundles,
}

#[derive(Clone)]
pub struct RemoteDebugController {
    inner: Arc<ControllerInner>,
}

impl RemoteDebugController {
    pub fn new(transport: Arc<dyn DebuggerTransport>) -> Self {
        Self::with_options(transport, ControllerOptions::default())
    }

    pub fn with_options(transport: Arc<dyn DebuggerTransport>, options: ControllerOptions) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                transport,
                force_same_tab_navigation: options.force_same_tab_navigation,
                overlay: options.overlay,
                destroyed: AtomicBool::new(false),
                session: TabSession::default(),
                in_flight_attach: Mutex::new(None),
                pointer: Mutex::new(DEFAULT_POINTER),
                mobile_emulation: Mutex::new(None),
                viewport: Mutex::new(None),
                keyboard: Mutex::new(Keyboard::new()),
                scripts: ScriptBundles::new(),
            }),
        }
    }

    pub fn destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::SeqCst)
    }

    pub(crate) fn ensure_not_destroyed(&self) -> Result<(), ControlError> {
        if self.destroyed() {
            Err(ControlError::ControllerDestroyed)
        } else {
            Ok(())
        }
    }

    /// Tear the controller down: unpin, detach, and refuse all further
    /// operations. Idempotent and infallible.
    pub async fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.session.clear_pinned();
        self.detach_inner().await;
    }

    /// Page tabs in the current window. Tabs still materializing report
    /// a blank id, title or URL; those are dropped.
    pub async fn tab_list(&self) -> Result<Vec<TabInfo>, ControlError> {
        self.ensure_not_destroyed()?;
        let tabs = self.inner.transport.list_tabs().await?;
        Ok(tabs
            .into_iter()
            .filter(|tab| {
                !tab.id.as_str().is_empty() && !tab.title.is_empty() && !tab.url.is_empty()
            })
            .collect())
    }

    /// Id of the tab the browser currently has focused.
    pub async fn focused_tab(&self) -> Result<TabId, ControlError> {
        self.ensure_not_destroyed()?;
        Ok(self.inner.transport.active_tab().await?)
    }

    /// Bring `tab` to the foreground and pin it as the controlled tab.
    /// The pin is write-once for the controller's lifetime.
    pub async fn set_active_tab(&self, tab: TabId) -> Result<(), ControlError> {
        self.ensure_not_destroyed()?;
        self.inner.session.pin(tab.clone())?;
        if let Err(err) = self.inner.transport.activate_tab(&tab).await {
            self.inner.session.clear_pinned();
            return Err(err.into());
        }
        Ok(())
    }

    /// The pinned tab, if one was set.
    pub fn active_tab(&self) -> Option<TabId> {
        self.inner.session.pinned()
    }

    /// The tab the debugger is currently attached to, if any.
    pub fn attached_tab(&self) -> Option<TabId> {
        self.inner.session.attached()
    }

    /// URL of the controlled tab (pinned tab, else the focused one).
    pub async fn url(&self) -> Result<String, ControlError> {
        self.ensure_not_destroyed()?;
        self.current_url().await
    }

    #[cfg(test)]
    pub(crate) fn set_mobile_for_tests(&self, mobile: bool) {
        *self.inner.mobile_emulation.lock() = Some(mobile);
    }

    #[cfg(test)]
    pub(crate) fn set_viewport_for_tests(&self, size: Size) {
        *self.inner.viewport.lock() = Some(size);
    }
}

impl std::fmt::Debug for RemoteDebugController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteDebugController")
            .field("destroyed", &self.destroyed())
            .field("attached", &self.inner.session.attached())
            .field("pinned", &self.inner.session.pinned())
            .finish()
    }
}
