//! # machinehub-worker
//!
//! The background worker context of the MachineHub agent. Receives push
//! deliveries, reconstructs events the sender omitted, renders system
//! notifications, and relays normalized payloads to the foreground.
//!
//! The worker shares no memory with the foreground: it never reads
//! dashboard state or device storage, and communicates exclusively over
//! the relay bus.

pub mod notifier;
pub mod render;
pub mod runner;
pub mod sink;

pub use notifier::{LatestEventSource, PushNotifier, PushOutcome, SuppressReason};
pub use render::RenderedNotification;
pub use runner::run_push_worker;
pub use sink::{LogNotificationSink, NotificationSink};
