//! # machinehub-store
//!
//! Foreground state for the MachineHub agent: the file-backed device
//! storage (auth token, unread cursor, preferences), the notification
//! store with scope enforcement, dedup, and pagination, and the coin
//! value store.
//!
//! Everything here belongs to the foreground context; the background
//! worker never touches device storage directly.

pub mod coin_values;
pub mod dedup;
pub mod device;
pub mod keys;
pub mod notifications;

pub use coin_values::CoinValueStore;
pub use dedup::DedupIndex;
pub use device::DeviceStorage;
pub use notifications::{AddOutcome, NotificationStore, Toast};
