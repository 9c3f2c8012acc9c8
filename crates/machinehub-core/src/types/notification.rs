//! Canonical notification record.
//!
//! The single event shape all consumers operate on. Transport adapters and
//! the REST client normalize their wire shapes into this type before
//! handing events to the worker, the store, or the dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::event::EventKind;
use super::id::MachineId;

/// A normalized fleet event, immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Unique within a session. Server-assigned when sourced from history,
    /// locally-generated monotonic counter otherwise.
    pub id: u64,
    /// Event kind.
    pub kind: EventKind,
    /// Machine the event belongs to.
    pub machine_id: MachineId,
    /// Display name; defaults to `Máquina {id}` when the directory has no
    /// better label.
    pub machine_name: String,
    /// Physical location label, when known.
    pub location: Option<String>,
    /// Event instant. Unparseable wire timestamps normalize to "now" at
    /// ingestion.
    pub timestamp: DateTime<Utc>,
    /// Coin count; present only for `CoinInserted`.
    pub amount: Option<u32>,
    /// Free-text reason (e.g. a power-off cause).
    pub detail: Option<String>,
}

impl NotificationRecord {
    /// Fallback display name for a machine with no directory entry.
    pub fn default_name(machine_id: &MachineId) -> String {
        format!("Máquina {machine_id}")
    }

    /// Produce a copy with display labels filled in from a directory
    /// lookup. Existing labels win; records are never mutated in place.
    pub fn with_labels(&self, name: Option<&str>, location: Option<&str>) -> Self {
        let mut next = self.clone();
        if next.machine_name == Self::default_name(&next.machine_id) {
            if let Some(name) = name {
                next.machine_name = name.to_string();
            }
        }
        if next.location.is_none() {
            next.location = location.map(str::to_string);
        }
        next
    }
}

/// Input for appending a record to the notification store.
///
/// Identical to [`NotificationRecord`] minus the id (assigned by the
/// store) with every display field optional.
#[derive(Debug, Clone, Default)]
pub struct NotificationInput {
    /// Event kind.
    pub kind: Option<EventKind>,
    /// Machine id; inputs without one are invalid and dropped.
    pub machine_id: Option<MachineId>,
    /// Display name override.
    pub machine_name: Option<String>,
    /// Location override.
    pub location: Option<String>,
    /// Event instant; `None` means "now".
    pub timestamp: Option<DateTime<Utc>>,
    /// Coin count for `CoinInserted` events.
    pub amount: Option<u32>,
    /// Free-text reason.
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> NotificationRecord {
        let machine_id = MachineId::parse("5").unwrap();
        NotificationRecord {
            id: 1,
            kind: EventKind::CoinInserted,
            machine_name: NotificationRecord::default_name(&machine_id),
            machine_id,
            location: None,
            timestamp: Utc::now(),
            amount: Some(1),
            detail: None,
        }
    }

    #[test]
    fn test_with_labels_fills_defaults_only() {
        let enriched = record().with_labels(Some("Boxeo A"), Some("Pasillo 2"));
        assert_eq!(enriched.machine_name, "Boxeo A");
        assert_eq!(enriched.location.as_deref(), Some("Pasillo 2"));

        // An explicit name is not overwritten.
        let named = enriched.with_labels(Some("Otro"), None);
        assert_eq!(named.machine_name, "Boxeo A");
    }
}
