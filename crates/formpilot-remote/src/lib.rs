//! Remote browser page control over the Chrome DevTools Protocol.
//!
//! The crate centers on [`RemoteDebugController`], which drives one tab
//! through a pluggable [`transport`] backend: a direct debugging socket
//! ([`CdpSocketTransport`]) or a relayed broker ([`RelayTransport`]).
//! [`PageOperator`] wraps the controller with the conveniences an
//! automation script wants.

pub mod controller;
pub mod error;
pub mod operator;
pub mod transport;

mod keys;
mod poll;
mod scripts;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::{ControllerOptions, KeyPress, MouseButton, RemoteDebugController};
pub use error::ControlError;
pub use operator::PageOperator;
pub use transport::{
    CdpSocketTransport, LocalRelayChannel, RelayChannel, RelayExchange, RelayTransport,
};
