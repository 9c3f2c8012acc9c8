//! # machinehub-realtime
//!
//! Transport adapters for the MachineHub agent. Wraps the two event
//! sources — the live WebSocket channel and the platform push channel —
//! and the relay bus that carries worker-to-foreground messages. Both
//! adapters emit only canonical event shapes downstream.

pub mod live;
pub mod push;
pub mod relay;

pub use live::LiveClient;
pub use push::{ChannelPushSource, PushMessage, PushSource, WebSocketPushSource};
pub use relay::{RelayBus, RelayEnvelope, RelayMessage};
