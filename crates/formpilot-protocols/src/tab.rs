//! Tab identity types.
//!
//! Tabs are identified by opaque string ids. Direct CDP backends hand out
//! target ids (GUID-like strings), while extension relays hand out numeric
//! tab ids; both deserialize into the same [`TabId`], numbers stringified.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "tab_tests.rs"]
mod tests;

/// Opaque tab identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TabId(String);

impl TabId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TabId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TabId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl<'de> Deserialize<'de> for TabId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TabIdVisitor;

        impl Visitor<'_> for TabIdVisitor {
            type Value = TabId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or integer tab id")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<TabId, E> {
                Ok(TabId(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<TabId, E> {
                Ok(TabId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<TabId, E> {
                Ok(TabId(v.to_string()))
            }
        }

        deserializer.deserialize_any(TabIdVisitor)
    }
}

/// One entry of a browser tab listing.
///
/// Relayed backends report the focused tab as `active`; the serialized
/// form uses `currentActiveTab` to match the public listing shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub id: TabId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, alias = "active", rename = "currentActiveTab")]
    pub current_active_tab: bool,
}

impl TabInfo {
    pub fn new(id: impl Into<TabId>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            current_active_tab: false,
        }
    }

    pub fn active(mut self) -> Self {
        self.current_active_tab = true;
        self
    }
}
