//! Transport backends.
//!
//! [`CdpSocketTransport`] owns a CDP WebSocket to a browser started with
//! `--remote-debugging-port`. [`RelayTransport`] forwards the same
//! operations through a broker that holds the debugger on our behalf.

mod direct;
mod relay;

pub use direct::CdpSocketTransport;
pub use relay::{LocalRelayChannel, RelayChannel, RelayExchange, RelayTransport};
