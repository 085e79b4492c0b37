//! Injected script sources and their content caches.
//!
//! The page-side extractor and overlay bundles are loaded through the
//! transport's resource loader and cached per controller after the first
//! successful fetch. Refetching is idempotent, so the caches take no
//! lock across await points; a lost race costs one extra fetch.

use formpilot_protocols::{DebuggerTransport, TransportError};
use parking_lot::RwLock;

pub(crate) const EXTRACTOR_PATH: &str = "pages/extractor.js";
pub(crate) const OVERLAY_START_PATH: &str = "pages/overlay-start.js";
pub(crate) const OVERLAY_STOP_PATH: &str = "pages/overlay-stop.js";

/// Write-once-then-read cache for one fetched script bundle.
pub(crate) struct ScriptCache {
    path: &'static str,
    content: RwLock<Option<String>>,
}

impl ScriptCache {
    pub(crate) const fn new(path: &'static str) -> Self {
        Self {
            path,
            content: RwLock::new(None),
        }
    }

    pub(crate) async fn get_or_fetch(
        &self,
        transport: &dyn DebuggerTransport,
    ) -> Result<String, TransportError> {
        if let Some(content) = self.content.read().clone() {
            return Ok(content);
        }
        let content = transport.fetch_resource(self.path).await?;
        *self.content.write() = Some(content.clone());
        Ok(content)
    }

    #[cfg(test)]
    pub(crate) fn reset(&self) {
        *self.content.write() = None;
    }
}

/// The injectable bundles one controller works with.
pub(crate) struct ScriptBundles {
    pub(crate) extractor: ScriptCache,
    pub(crate) overlay_start: ScriptCache,
    pub(crate) overlay_stop: ScriptCache,
}

impl ScriptBundles {
    pub(crate) const fn new() -> Self {
        Self {
            extractor: ScriptCache::new(EXTRACTOR_PATH),
            overlay_start: ScriptCache::new(OVERLAY_START_PATH),
            overlay_stop: ScriptCache::new(OVERLAY_STOP_PATH),
        }
    }
}

/// Probe expression for readiness polling.
pub(crate) const READY_STATE_EXPRESSION: &str = "document.readyState";

/// One-time probe for touch-first emulated pages.
pub(crate) const MOBILE_PROBE_EXPRESSION: &str = r#"(() => {
  return /Android|iPhone|iPad|iPod|Mobile/i.test(navigator.userAgent);
})()"#;

/// Redirects new-tab navigation into the current tab, so the debugger
/// attachment survives link clicks.
pub(crate) const LIMIT_NEW_TAB_EXPRESSION: &str = r#"(() => {
  if (window.__formpilot_same_tab_patched) {
    return;
  }
  window.__formpilot_same_tab_patched = true;
  window.open = (url) => {
    if (url) {
      window.location.href = url;
    }
    return window;
  };
  document.addEventListener('click', (event) => {
    const target = event.target instanceof Element ? event.target.closest('a[target="_blank"]') : null;
    if (target && target.href) {
      event.preventDefault();
      window.location.href = target.href;
    }
  }, true);
})()"#;

pub(crate) const HIDE_POINTER_EXPRESSION: &str = r#"(() => {
  if (typeof window.__formpilot_overlay !== 'undefined') {
    window.__formpilot_overlay.hideMousePointer();
  }
})()"#;

pub(crate) fn show_pointer_expression(x: f64, y: f64) -> String {
    format!(
        r#"(() => {{
  if (typeof window.__formpilot_overlay !== 'undefined') {{
    window.__formpilot_overlay.enable();
    window.__formpilot_overlay.showMousePointer({x}, {y});
  }}
}})()"#
    )
}

/// Snapshot expression evaluated after the extractor bundle is injected:
/// refreshes the page-side node cache and returns `{tree, size}` by value.
pub(crate) const PAGE_SNAPSHOT_EXPRESSION: &str = r#"(() => {
  window.__formpilot_inspector.refreshNodeCache();
  return {
    tree: window.__formpilot_inspector.extractNodeTree(),
    size: {
      width: document.documentElement.clientWidth,
      height: document.documentElement.clientHeight,
      dpr: window.devicePixelRatio,
    },
  };
})()"#;

pub(crate) fn xpaths_by_id_expression(id: &str) -> Result<String, serde_json::Error> {
    let quoted = serde_json::to_string(id)?;
    Ok(format!("window.__formpilot_inspector.xpathsById({quoted})"))
}

pub(crate) fn element_info_by_xpath_expression(xpath: &str) -> Result<String, serde_json::Error> {
    let quoted = serde_json::to_string(xpath)?;
    Ok(format!(
        "window.__formpilot_inspector.elementInfoByXpath({quoted})"
    ))
}
