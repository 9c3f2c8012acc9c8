//! # machinehub-api
//!
//! REST adapter for the MachineHub backend. Wraps the event history,
//! machine directory, coin value, and push subscription endpoints behind
//! a typed client. Event responses are normalized before they leave this
//! crate; callers never see raw wire shapes.

pub mod client;
pub mod types;

pub use client::ApiClient;
pub use types::{EventPage, EventQuery, MachineCoins, PowerLogEntry, PushSubscription};
