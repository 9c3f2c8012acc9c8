//! # machinehub-dashboard
//!
//! The foreground context of the MachineHub agent. Composes the
//! notification store, the access scope filter, and both transport
//! adapters into live dashboard state: machine directory, coin tallies,
//! the notification feed, toasts, and sound cues.

pub mod orchestrator;
pub mod state;
pub mod ui;
pub mod usage;

pub use orchestrator::{Dashboard, DashboardHandles};
pub use state::DashboardState;
pub use ui::{LogUiSink, SoundCue, UiSink};
pub use usage::{MachineUsage, derive_usage};
