//! # machinehub-core
//!
//! Core crate for the MachineHub agent. Contains configuration schemas,
//! domain types, the access scope filter, the event normalizer, timestamp
//! helpers, and the unified error system.
//!
//! This crate has **no** internal dependencies on other MachineHub crates.

pub mod access;
pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod time;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
