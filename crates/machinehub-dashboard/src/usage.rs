//! Active-minutes and first-on derivation from power logs.

use chrono::{DateTime, Utc};

use machinehub_api::{PowerLogEntry, types::PowerLogKind};
use machinehub_core::time;

/// Usage summary of one machine for the current local day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineUsage {
    /// First power-on today, if any.
    pub first_on_today: Option<DateTime<Utc>>,
    /// Minutes powered today, including an open interval since the last
    /// unmatched power-on.
    pub active_minutes_today: u64,
}

/// Derive today's usage from a machine's power log.
///
/// Logs arrive oldest first. `Apagado` rows carry the duration of the
/// closed interval; a trailing `Encendido` without a matching `Apagado`
/// counts as running until `now`.
pub fn derive_usage(logs: &[PowerLogEntry], now: DateTime<Utc>) -> MachineUsage {
    let today = time::local_date(&now);
    let mut usage = MachineUsage::default();
    let mut open_since: Option<DateTime<Utc>> = None;

    for entry in logs {
        let entry_is_today = time::local_date(&entry.ts) == today;
        match entry.event {
            PowerLogKind::Encendido => {
                if entry_is_today && usage.first_on_today.is_none() {
                    usage.first_on_today = Some(entry.ts);
                }
                open_since = Some(entry.ts);
            }
            PowerLogKind::Apagado => {
                if entry_is_today {
                    if let Some(dur) = entry.dur {
                        usage.active_minutes_today += dur;
                    }
                }
                open_since = None;
            }
        }
    }

    if let Some(since) = open_since {
        let running = now.signed_duration_since(since.max(time::start_of_local_day(&now)));
        usage.active_minutes_today += running.num_minutes().max(0) as u64;
    }

    usage
}
