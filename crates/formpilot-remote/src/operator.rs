//! Scripted page driver over the controller.
//!
//! [`PageOperator`] is the surface an automation script talks to:
//! coordinates in, effects out, with the tab pinning and readiness
//! waiting a script usually wants already folded in.

use formpilot_protocols::Point;
use rand::Rng;
use serde_json::Value;
use tracing::warn;

use crate::controller::{KeyPress, RemoteDebugController};
use crate::error::ControlError;

pub struct PageOperator {
    controller: RemoteDebugController,
}

impl PageOperator {
    pub fn new(controller: RemoteDebugController) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> &RemoteDebugController {
        &self.controller
    }

    /// Pin the currently focused tab so later steps stay on it even when
    /// the user clicks elsewhere. A tab that is already pinned is fine;
    /// the script keeps driving whichever tab won.
    pub async fn initialize(&self) -> Result<(), ControlError> {
        let tab = self.controller.focused_tab().await?;
        if let Err(err) = self.controller.set_active_tab(tab).await {
            warn!("could not pin the focused tab: {err}");
        }
        Ok(())
    }

    pub async fn click(&self, x: f64, y: f64) -> Result<(), ControlError> {
        self.controller.click(Point::new(x, y)).await
    }

    pub async fn move_pointer(&self, x: f64, y: f64) -> Result<(), ControlError> {
        self.controller.mouse_move(Point::new(x, y)).await
    }

    pub async fn type_text(&self, text: &str) -> Result<(), ControlError> {
        self.controller.type_text(text).await
    }

    pub async fn press_keys(&self, keys: &[KeyPress]) -> Result<(), ControlError> {
        self.controller.press(keys).await
    }

    pub async fn evaluate_script(&self, expression: &str) -> Result<Value, ControlError> {
        self.controller.evaluate(expression).await
    }

    /// Click somewhere unremarkable to dismiss dropdowns and focus rings
    /// before the next step. Stays 50px clear of the viewport edges.
    pub async fn click_on_blank_area(&self) -> Result<(), ControlError> {
        let size = self.controller.size().await?;
        let mut rng = rand::thread_rng();
        let x = (rng.r#gen::<f64>() * (size.width - 100.0)).floor() + 50.0;
        let y = (rng.r#gen::<f64>() * (size.height - 100.0)).floor() + 50.0;
        self.controller.click(Point::new(x, y)).await
    }

    /// Wait for the page to settle. Pages that never finish loading are
    /// reported and skipped rather than failing the script.
    pub async fn wait_until_network_idle(&self) {
        if let Err(err) = self.controller.wait_until_network_idle().await {
            warn!("continuing without network idle: {err}");
        }
    }

    pub async fn destroy(&self) {
        self.controller.destroy().await;
    }
}
