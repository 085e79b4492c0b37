//! Page introspection: structure extraction, sizing, screenshots and
//! readiness polling.

use std::time::Duration;

use formpilot_protocols::{ElementInfo, ElementTree, ExtractedPage, Size};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::ControlError;
use crate::poll::Poller;
use crate::scripts::{
    PAGE_SNAPSHOT_EXPRESSION, READY_STATE_EXPRESSION, element_info_by_xpath_expression,
    xpaths_by_id_expression,
};

use super::RemoteDebugController;

const POLL_INTERVAL: Duration = Duration::from_millis(300);
const NETWORK_IDLE_TIMEOUT: Duration = Duration::from_secs(10);
const SCREENSHOT_QUALITY: u32 = 90;

impl RemoteDebugController {
    /// Extract the element tree and viewport of the controlled page.
    ///
    /// Injects the extractor bundle, takes a snapshot by value, and
    /// remembers the reported viewport for later [`Self::size`] calls.
    pub async fn page_content(&self) -> Result<ExtractedPage, ControlError> {
        self.ensure_not_destroyed()?;
        self.inject_extractor().await?;
        let response = self
            .channel_send(
                "Runtime.evaluate",
                json!({
                    "expression": PAGE_SNAPSHOT_EXPRESSION,
                    "returnByValue": true,
                }),
            )
            .await?;
        let Some(value) = evaluation_value(&response) else {
            return Err(ControlError::ExtractionFailed {
                description: exception_description(&response),
            });
        };
        let page: ExtractedPage = serde_json::from_value(value)?;
        *self.inner.viewport.lock() = Some(page.size);
        Ok(page)
    }

    /// The element tree alone, with the pointer overlay hidden so it
    /// never shows up as a page element.
    pub async fn element_tree(&self) -> Result<ElementTree, ControlError> {
        self.ensure_not_destroyed()?;
        self.hide_pointer().await;
        Ok(self.page_content().await?.tree)
    }

    /// Viewport size in CSS pixels. Cached after the first retrieval; a
    /// cache miss runs a full extraction, which records the viewport as
    /// a side effect.
    pub async fn size(&self) -> Result<Size, ControlError> {
        self.ensure_not_destroyed()?;
        if let Some(size) = *self.inner.viewport.lock() {
            return Ok(size);
        }
        Ok(self.page_content().await?.size)
    }

    /// Forget the cached viewport, forcing the next [`Self::size`] call
    /// to measure the page again. Call after anything that may resize
    /// the window or its zoom.
    pub fn invalidate_size_cache(&self) {
        *self.inner.viewport.lock() = None;
    }

    /// JPEG screenshot of the visible viewport as a base64 data URI.
    pub async fn screenshot_base64(&self) -> Result<String, ControlError> {
        self.ensure_not_destroyed()?;
        let response = self
            .channel_send(
                "Page.captureScreenshot",
                json!({
                    "format": "jpeg",
                    "quality": SCREENSHOT_QUALITY,
                }),
            )
            .await?;
        let data = response
            .get("data")
            .and_then(Value::as_str)
            .ok_or_else(|| ControlError::extraction("screenshot response carried no data"))?;
        Ok(format!("data:image/jpeg;base64,{data}"))
    }

    /// Poll `document.readyState` until the page reports `complete`,
    /// then wait one more tick for late resources to settle.
    ///
    /// Probe failures (mid-navigation evaluation contexts come and go)
    /// keep polling rather than aborting the wait.
    pub async fn wait_until_network_idle(&self) -> Result<(), ControlError> {
        self.ensure_not_destroyed()?;
        let poller = Poller::new(POLL_INTERVAL, NETWORK_IDLE_TIMEOUT);
        let mut last_state = String::from("unknown");
        loop {
            match self.ready_state().await {
                Ok(state) => {
                    last_state = state;
                    if last_state == "complete" {
                        poller.wait().await;
                        return Ok(());
                    }
                }
                Err(err) => {
                    debug!("readyState probe failed: {err}");
                    last_state = String::from("unknown");
                }
            }
            if poller.expired() {
                return Err(ControlError::NetworkIdleTimeout { last_state });
            }
            poller.wait().await;
        }
    }

    /// XPaths recorded for an extracted element id. Unknown ids yield an
    /// empty list.
    pub async fn xpaths_by_id(&self, id: &str) -> Result<Vec<String>, ControlError> {
        self.ensure_not_destroyed()?;
        self.inject_extractor().await?;
        let expression = xpaths_by_id_expression(id)?;
        let response = self
            .channel_send(
                "Runtime.evaluate",
                json!({
                    "expression": expression,
                    "returnByValue": true,
                }),
            )
            .await?;
        match evaluation_value(&response) {
            Some(value) => Ok(serde_json::from_value(value)?),
            None if response.get("exceptionDetails").is_some() => {
                Err(ControlError::ExtractionFailed {
                    description: exception_description(&response),
                })
            }
            None => Ok(Vec::new()),
        }
    }

    /// Resolve one element by XPath.
    pub async fn element_info_by_xpath(&self, xpath: &str) -> Result<ElementInfo, ControlError> {
        self.ensure_not_destroyed()?;
        self.inject_extractor().await?;
        let expression = element_info_by_xpath_expression(xpath)?;
        let response = self
            .channel_send(
                "Runtime.evaluate",
                json!({
                    "expression": expression,
                    "returnByValue": true,
                }),
            )
            .await?;
        let Some(value) = evaluation_value(&response) else {
            if response.get("exceptionDetails").is_some() {
                return Err(ControlError::ExtractionFailed {
                    description: exception_description(&response),
                });
            }
            return Err(ControlError::extraction(format!(
                "no element matched xpath {xpath}"
            )));
        };
        Ok(serde_json::from_value(value)?)
    }

    /// Evaluate an arbitrary expression in the page, returning the raw
    /// CDP response (result and exception details included).
    pub async fn evaluate(&self, expression: &str) -> Result<Value, ControlError> {
        self.ensure_not_destroyed()?;
        self.channel_send("Runtime.evaluate", json!({ "expression": expression }))
            .await
    }

    async fn inject_extractor(&self) -> Result<(), ControlError> {
        let script = self
            .inner
            .scripts
            .extractor
            .get_or_fetch(self.inner.transport.as_ref())
            .await?;
        self.channel_send("Runtime.evaluate", json!({ "expression": script }))
            .await?;
        Ok(())
    }

    async fn ready_state(&self) -> Result<String, ControlError> {
        let response = self
            .channel_send(
                "Runtime.evaluate",
                json!({ "expression": READY_STATE_EXPRESSION }),
            )
            .await?;
        Ok(response
            .pointer("/result/value")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

/// The `result.value` of an evaluation, when it produced one.
fn evaluation_value(response: &Value) -> Option<Value> {
    response
        .pointer("/result/value")
        .filter(|value| !value.is_null())
        .cloned()
}

fn exception_description(response: &Value) -> String {
    response
        .pointer("/exceptionDetails/exception/description")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string()
}
