//! Structured page snapshots.
//!
//! The in-page extractor script returns a recursive node tree plus the
//! viewport size. These types mirror that JSON shape; unknown keys from
//! newer extractor builds are ignored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;

/// Viewport size as reported by the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
    /// Device pixel ratio, absent on older extractor builds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpr: Option<f64>,
}

/// A point in CSS pixels, viewport coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned element bounds in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// One interactive or textual element found by the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementInfo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_id: Option<u32>,
    #[serde(default)]
    pub node_type: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub rect: Rect,
    /// Click target, `[x, y]`.
    #[serde(default)]
    pub center: [f64; 2],
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}

fn default_visible() -> bool {
    true
}

impl ElementInfo {
    pub fn center_point(&self) -> Point {
        Point::new(self.center[0], self.center[1])
    }
}

/// Recursive extractor output: an optional element at this node plus its
/// children. Container nodes the extractor skipped carry `node: null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementTree {
    #[serde(default)]
    pub node: Option<ElementInfo>,
    #[serde(default)]
    pub children: Vec<ElementTree>,
}

impl ElementTree {
    /// All elements in the tree, pre-order, skipping empty nodes.
    pub fn flatten(&self) -> Vec<&ElementInfo> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a ElementInfo>) {
        if let Some(node) = &self.node {
            out.push(node);
        }
        for child in &self.children {
            child.collect(out);
        }
    }
}

/// Full page snapshot: element tree plus viewport size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPage {
    pub tree: ElementTree,
    pub size: Size,
}
