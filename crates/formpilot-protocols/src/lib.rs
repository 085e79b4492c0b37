//! # Formpilot Protocols
//!
//! Core protocol definitions for Formpilot's remote page control layer.
//! Contains the transport trait, the relay wire envelope, and the data
//! types shared between the controller and its transports - no
//! controller logic lives here.
//!
//! ## Core Pieces
//!
//! - [`DebuggerTransport`] - Trait every debugger backend implements
//! - [`RelayRequest`] / [`RelayResponse`] - Message envelope for relayed backends
//! - [`TabId`] / [`TabInfo`] - Tab identity and listing types
//! - [`ExtractedPage`] / [`ElementTree`] - Structured page snapshots
//! - [`TransportError`] - Errors raised below the controller

pub mod envelope;
pub mod error;
pub mod tab;
pub mod transport;
pub mod tree;

pub use envelope::{RelayRequest, RelayResponse};
pub use error::TransportError;
pub use tab::{TabId, TabInfo};
pub use transport::DebuggerTransport;
pub use tree::{ElementInfo, ElementTree, ExtractedPage, Point, Rect, Size};
