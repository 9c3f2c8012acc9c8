//! Worker-to-foreground relay.
//!
//! The background worker and the foreground dashboard share no memory;
//! the relay bus is the only channel by which push events reach
//! already-running foreground state.

mod bus;
mod message;

pub use bus::RelayBus;
pub use message::{RelayEnvelope, RelayMessage};
