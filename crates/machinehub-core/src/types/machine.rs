//! Machine directory types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::MachineId;

/// Operational status of a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MachineStatus {
    /// Powered on and reporting.
    Active,
    /// Powered off or silent.
    #[default]
    Inactive,
    /// Flagged for maintenance.
    Maintenance,
}

/// A machine in the fleet directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    /// Fleet identifier.
    pub id: MachineId,
    /// Display name.
    pub name: String,
    /// Physical location label.
    #[serde(default)]
    pub location: Option<String>,
    /// Current operational status.
    #[serde(default)]
    pub status: MachineStatus,
    /// Whether the machine is in test mode. Test-mode coin events are
    /// shown in the feed but excluded from revenue tallies.
    #[serde(default)]
    pub test_mode: bool,
    /// Last observed power-on instant.
    #[serde(default)]
    pub last_on: Option<DateTime<Utc>>,
    /// Last observed power-off instant.
    #[serde(default)]
    pub last_off: Option<DateTime<Utc>>,
}

impl Machine {
    /// Display label, falling back to the id.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }
}
