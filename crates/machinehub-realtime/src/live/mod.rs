//! Live channel adapter: long-lived WebSocket with automatic reconnect.

mod backoff;
pub(crate) mod client;

pub use backoff::ReconnectPolicy;
pub use client::LiveClient;
