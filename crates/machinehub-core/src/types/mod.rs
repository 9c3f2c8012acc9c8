//! Canonical domain types shared by all MachineHub crates.

pub mod event;
pub mod id;
pub mod machine;
pub mod notification;
pub mod pagination;
pub mod role;

pub use event::EventKind;
pub use id::MachineId;
pub use machine::{Machine, MachineStatus};
pub use notification::{NotificationInput, NotificationRecord};
pub use pagination::{PageRequest, PageResponse};
pub use role::UserRole;
