//! Event kind enumeration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kind of a fleet event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A machine powered on.
    MachineOn,
    /// A machine powered off. Operationally significant — rendered at
    /// high priority.
    MachineOff,
    /// A coin was inserted.
    CoinInserted,
    /// Unknown or generic event. Stored in the feed but never rendered
    /// as a system notification.
    Other,
}

impl EventKind {
    /// Wire name of the kind (`coin_inserted`, `machine_on`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MachineOn => "machine_on",
            Self::MachineOff => "machine_off",
            Self::CoinInserted => "coin_inserted",
            Self::Other => "event",
        }
    }

    /// Whether a system notification for this kind demands explicit
    /// dismissal and a long vibration pattern.
    pub fn is_high_priority(&self) -> bool {
        matches!(self, Self::MachineOff)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "machine_on" => Self::MachineOn,
            "machine_off" => Self::MachineOff,
            "coin_inserted" => Self::CoinInserted,
            _ => Self::Other,
        })
    }
}
