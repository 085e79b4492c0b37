//! Input simulation: mouse, touch, keyboard and scrolling.

use std::time::Duration;

use formpilot_protocols::Point;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::error::ControlError;
use crate::keys;

use super::RemoteDebugController;

/// Hold time between press and release of one click.
const CLICK_GAP: Duration = Duration::from_millis(50);
/// Pause between select-all and the deleting keystroke.
const CLEAR_INPUT_GAP: Duration = Duration::from_millis(100);
/// Large enough to hit the scroll edge of any real page in one wheel tick.
const EDGE_SCROLL_DELTA: f64 = 9_999_999.0;
/// Default scroll step as a fraction of the viewport.
const SCROLL_RATIO: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    None,
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
enum MouseEventType {
    MousePressed,
    MouseReleased,
    MouseMoved,
    MouseWheel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
enum TouchEventType {
    TouchStart,
    TouchEnd,
}

/// One key in a chord, optionally carrying an editing command for the
/// browser to run on the down event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    key: String,
    command: Option<String>,
}

impl KeyPress {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            command: None,
        }
    }

    pub fn with_command(key: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            command: Some(command.into()),
        }
    }
}

impl RemoteDebugController {
    /// Single left-click at `point`.
    pub async fn click(&self, point: Point) -> Result<(), ControlError> {
        self.click_with(point, MouseButton::Left, 1).await
    }

    /// Click at `point` with the given button and click count. The
    /// pointer moves there first. Primary clicks on pages under mobile
    /// emulation become a touch tap instead; some mobile layouts ignore
    /// synthetic mouse buttons entirely.
    pub async fn click_with(
        &self,
        point: Point,
        button: MouseButton,
        count: u32,
    ) -> Result<(), ControlError> {
        self.ensure_not_destroyed()?;
        self.mouse_move(point).await?;
        if button == MouseButton::Left && self.mobile_emulation().await {
            return self.tap(point).await;
        }
        self.channel_send(
            "Input.dispatchMouseEvent",
            json!({
                "type": MouseEventType::MousePressed,
                "x": point.x,
                "y": point.y,
                "button": button,
                "clickCount": count,
            }),
        )
        .await?;
        tokio::time::sleep(CLICK_GAP).await;
        self.channel_send(
            "Input.dispatchMouseEvent",
            json!({
                "type": MouseEventType::MouseReleased,
                "x": point.x,
                "y": point.y,
                "button": button,
                "clickCount": count,
            }),
        )
        .await?;
        Ok(())
    }

    async fn tap(&self, point: Point) -> Result<(), ControlError> {
        self.channel_send(
            "Input.dispatchTouchEvent",
            json!({
                "type": TouchEventType::TouchStart,
                "touchPoints": [{ "x": point.x.round() as i64, "y": point.y.round() as i64 }],
                "modifiers": 0,
            }),
        )
        .await?;
        self.channel_send(
            "Input.dispatchTouchEvent",
            json!({
                "type": TouchEventType::TouchEnd,
                "touchPoints": [],
                "modifiers": 0,
            }),
        )
        .await?;
        Ok(())
    }

    /// Move the mouse to `point` without pressing anything. The visual
    /// pointer follows, and the recorded pointer position updates once
    /// the event is dispatched.
    pub async fn mouse_move(&self, point: Point) -> Result<(), ControlError> {
        self.ensure_not_destroyed()?;
        self.show_pointer(point).await;
        self.channel_send(
            "Input.dispatchMouseEvent",
            json!({
                "type": MouseEventType::MouseMoved,
                "x": point.x,
                "y": point.y,
                "button": MouseButton::None,
            }),
        )
        .await?;
        self.update_pointer(point);
        Ok(())
    }

    /// Dispatch a wheel event. Without an explicit `origin` the wheel
    /// fires at the last recorded pointer position; either way the
    /// pointer ends up at the origin used.
    pub async fn wheel(
        &self,
        delta_x: f64,
        delta_y: f64,
        origin: Option<Point>,
    ) -> Result<(), ControlError> {
        self.ensure_not_destroyed()?;
        let origin = origin.unwrap_or_else(|| *self.inner.pointer.lock());
        self.show_pointer(origin).await;
        self.channel_send(
            "Input.dispatchMouseEvent",
            json!({
                "type": MouseEventType::MouseWheel,
                "x": origin.x,
                "y": origin.y,
                "deltaX": delta_x,
                "deltaY": delta_y,
            }),
        )
        .await?;
        self.update_pointer(origin);
        Ok(())
    }

    /// Move to `from`, press, move to `to`, release.
    pub async fn drag(&self, from: Point, to: Point) -> Result<(), ControlError> {
        self.ensure_not_destroyed()?;
        self.mouse_move(from).await?;
        self.channel_send(
            "Input.dispatchMouseEvent",
            json!({
                "type": MouseEventType::MousePressed,
                "x": from.x,
                "y": from.y,
                "button": MouseButton::Left,
                "clickCount": 1,
            }),
        )
        .await?;
        self.mouse_move(to).await?;
        self.channel_send(
            "Input.dispatchMouseEvent",
            json!({
                "type": MouseEventType::MouseReleased,
                "x": to.x,
                "y": to.y,
                "button": MouseButton::Left,
                "clickCount": 1,
            }),
        )
        .await?;
        Ok(())
    }

    /// Type `text` into the focused element, one character at a time.
    /// Characters outside the key layout go through `Input.insertText`.
    pub async fn type_text(&self, text: &str) -> Result<(), ControlError> {
        self.ensure_not_destroyed()?;
        for ch in text.chars() {
            let key = ch.to_string();
            if keys::definition(&key).is_some() {
                let (down, up) = {
                    let mut keyboard = self.inner.keyboard.lock();
                    (keyboard.down(&key, None)?, keyboard.up(&key)?)
                };
                self.channel_send("Input.dispatchKeyEvent", down).await?;
                self.channel_send("Input.dispatchKeyEvent", up).await?;
            } else {
                self.channel_send("Input.insertText", json!({ "text": key }))
                    .await?;
            }
        }
        Ok(())
    }

    /// Press a chord: every key down in order, then up in reverse, so
    /// modifiers wrap the keys they modify.
    pub async fn press(&self, keys: &[KeyPress]) -> Result<(), ControlError> {
        self.ensure_not_destroyed()?;
        for press in keys {
            if keys::definition(&press.key).is_none() {
                return Err(ControlError::UnknownKey(press.key.clone()));
            }
        }
        let (downs, ups) = {
            let mut keyboard = self.inner.keyboard.lock();
            let mut downs = Vec::with_capacity(keys.len());
            for press in keys {
                downs.push(keyboard.down(&press.key, press.command.as_deref())?);
            }
            let mut ups = Vec::with_capacity(keys.len());
            for press in keys.iter().rev() {
                ups.push(keyboard.up(&press.key)?);
            }
            (downs, ups)
        };
        for params in downs {
            self.channel_send("Input.dispatchKeyEvent", params).await?;
        }
        for params in ups {
            self.channel_send("Input.dispatchKeyEvent", params).await?;
        }
        Ok(())
    }

    /// Press and release a single key.
    pub async fn press_key(&self, key: &str) -> Result<(), ControlError> {
        self.press(&[KeyPress::new(key)]).await
    }

    /// Select everything in the field at `point` and delete it.
    pub async fn clear_input(&self, point: Point) -> Result<(), ControlError> {
        self.ensure_not_destroyed()?;
        self.click(point).await?;
        let (down, up) = {
            let mut keyboard = self.inner.keyboard.lock();
            (keyboard.down("a", Some("selectAll"))?, keyboard.up("a")?)
        };
        self.channel_send("Input.dispatchKeyEvent", down).await?;
        self.channel_send("Input.dispatchKeyEvent", up).await?;
        tokio::time::sleep(CLEAR_INPUT_GAP).await;
        self.press_key("Backspace").await
    }

    pub async fn scroll_until_top(&self, origin: Option<Point>) -> Result<(), ControlError> {
        self.wheel(0.0, -EDGE_SCROLL_DELTA, origin).await
    }

    pub async fn scroll_until_bottom(&self, origin: Option<Point>) -> Result<(), ControlError> {
        self.wheel(0.0, EDGE_SCROLL_DELTA, origin).await
    }

    pub async fn scroll_until_left(&self, origin: Option<Point>) -> Result<(), ControlError> {
        self.wheel(-EDGE_SCROLL_DELTA, 0.0, origin).await
    }

    pub async fn scroll_until_right(&self, origin: Option<Point>) -> Result<(), ControlError> {
        self.wheel(EDGE_SCROLL_DELTA, 0.0, origin).await
    }

    /// Scroll up by `distance` CSS pixels, defaulting to most of one
    /// viewport height.
    pub async fn scroll_up(
        &self,
        distance: Option<f64>,
        origin: Option<Point>,
    ) -> Result<(), ControlError> {
        let distance = match distance {
            Some(distance) => distance,
            None => self.size().await?.height * SCROLL_RATIO,
        };
        self.wheel(0.0, -distance, origin).await
    }

    pub async fn scroll_down(
        &self,
        distance: Option<f64>,
        origin: Option<Point>,
    ) -> Result<(), ControlError> {
        let distance = match distance {
            Some(distance) => distance,
            None => self.size().await?.height * SCROLL_RATIO,
        };
        self.wheel(0.0, distance, origin).await
    }

    pub async fn scroll_left(
        &self,
        distance: Option<f64>,
        origin: Option<Point>,
    ) -> Result<(), ControlError> {
        let distance = match distance {
            Some(distance) => distance,
            None => self.size().await?.width * SCROLL_RATIO,
        };
        self.wheel(-distance, 0.0, origin).await
    }

    pub async fn scroll_right(
        &self,
        distance: Option<f64>,
        origin: Option<Point>,
    ) -> Result<(), ControlError> {
        let distance = match distance {
            Some(distance) => distance,
            None => self.size().await?.width * SCROLL_RATIO,
        };
        self.wheel(distance, 0.0, origin).await
    }

    fn update_pointer(&self, point: Point) {
        *self.inner.pointer.lock() = point;
    }

    /// Whether the page runs under mobile emulation. Probed once per
    /// controller from the page's user agent; probe failures count as
    /// desktop.
    pub(crate) async fn mobile_emulation(&self) -> bool {
        if let Some(mobile) = *self.inner.mobile_emulation.lock() {
            return mobile;
        }
        let mobile = match self.probe_mobile_emulation().await {
            Ok(mobile) => mobile,
            Err(err) => {
                debug!("mobile emulation probe failed: {err}");
                false
            }
        };
        *self.inner.mobile_emulation.lock() = Some(mobile);
        mobile
    }

    async fn probe_mobile_emulation(&self) -> Result<bool, ControlError> {
        let response = self
            .channel_send(
                "Runtime.evaluate",
                json!({
                    "expression": crate::scripts::MOBILE_PROBE_EXPRESSION,
                    "returnByValue": true,
                }),
            )
            .await?;
        Ok(response
            .pointer("/result/value")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false))
    }
}
