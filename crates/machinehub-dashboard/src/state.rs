//! In-memory dashboard state.
//!
//! The machine directory and coin tallies, updated both event-driven and
//! by the periodic refresh. Refresh data is idempotent, so overlapping
//! refreshes are last-write-wins by design.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use machinehub_api::MachineCoins;
use machinehub_core::types::{Machine, MachineId, MachineStatus};

/// Live dashboard state for the visible fleet.
#[derive(Debug, Default)]
pub struct DashboardState {
    /// Visible machines by id.
    machines: HashMap<MachineId, Machine>,
    /// Lifetime coin count per machine.
    coins_by_machine: HashMap<MachineId, u64>,
    /// Coin count for the current local day per machine.
    daily_coins_by_machine: HashMap<MachineId, u64>,
    /// Fleet-wide coin total.
    total_coins: u64,
}

impl DashboardState {
    /// Replace the machine directory.
    pub fn set_machines(&mut self, machines: Vec<Machine>) {
        self.machines = machines.into_iter().map(|m| (m.id.clone(), m)).collect();
    }

    /// Look up a machine.
    pub fn machine(&self, id: &MachineId) -> Option<&Machine> {
        self.machines.get(id)
    }

    /// Number of visible machines.
    pub fn machine_count(&self) -> usize {
        self.machines.len()
    }

    /// Apply a power event.
    ///
    /// Returns `false` when the machine is unknown; the caller triggers
    /// a full refresh to pick up directory changes.
    pub fn apply_power_event(
        &mut self,
        id: &MachineId,
        powered_on: bool,
        timestamp: DateTime<Utc>,
    ) -> bool {
        let Some(machine) = self.machines.get_mut(id) else {
            return false;
        };
        if powered_on {
            machine.status = MachineStatus::Active;
            machine.last_on = Some(timestamp);
        } else {
            machine.status = MachineStatus::Inactive;
            machine.last_off = Some(timestamp);
        }
        true
    }

    /// Add live coins to the tallies. Test-mode machines are excluded
    /// from revenue; events from a previous local day skip the daily
    /// tally.
    pub fn add_coins(&mut self, id: &MachineId, amount: u32, event_is_today: bool) {
        if self.machines.get(id).is_some_and(|m| m.test_mode) {
            return;
        }
        *self.coins_by_machine.entry(id.clone()).or_insert(0) += u64::from(amount);
        self.total_coins += u64::from(amount);
        if event_is_today {
            *self.daily_coins_by_machine.entry(id.clone()).or_insert(0) += u64::from(amount);
        }
    }

    /// Replace coin tallies from a refresh.
    pub fn set_coin_totals(&mut self, rows: Vec<MachineCoins>, total: u64) {
        self.coins_by_machine = rows
            .into_iter()
            .filter_map(|row| MachineId::parse(&row.machine_id).map(|id| (id, row.total_coins)))
            .collect();
        self.total_coins = total;
    }

    /// Lifetime coins for a machine.
    pub fn coins_for(&self, id: &MachineId) -> u64 {
        self.coins_by_machine.get(id).copied().unwrap_or(0)
    }

    /// Today's coins for a machine.
    pub fn daily_coins_for(&self, id: &MachineId) -> u64 {
        self.daily_coins_by_machine.get(id).copied().unwrap_or(0)
    }

    /// Fleet-wide coin total.
    pub fn total_coins(&self) -> u64 {
        self.total_coins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mid(s: &str) -> MachineId {
        MachineId::parse(s).unwrap()
    }

    fn machine(id: &str, test_mode: bool) -> Machine {
        Machine {
            id: mid(id),
            name: format!("Máquina {id}"),
            location: None,
            status: MachineStatus::Inactive,
            test_mode,
            last_on: None,
            last_off: None,
        }
    }

    #[test]
    fn test_power_event_updates_status() {
        let mut state = DashboardState::default();
        state.set_machines(vec![machine("7", false)]);

        let ts = Utc::now();
        assert!(state.apply_power_event(&mid("7"), true, ts));
        let m = state.machine(&mid("7")).unwrap();
        assert_eq!(m.status, MachineStatus::Active);
        assert_eq!(m.last_on, Some(ts));

        assert!(state.apply_power_event(&mid("7"), false, ts));
        assert_eq!(state.machine(&mid("7")).unwrap().status, MachineStatus::Inactive);

        // Unknown machine signals a refresh.
        assert!(!state.apply_power_event(&mid("99"), true, ts));
    }

    #[test]
    fn test_test_mode_machines_are_excluded_from_revenue() {
        let mut state = DashboardState::default();
        state.set_machines(vec![machine("1", false), machine("2", true)]);

        state.add_coins(&mid("1"), 2, true);
        state.add_coins(&mid("2"), 5, true);

        assert_eq!(state.coins_for(&mid("1")), 2);
        assert_eq!(state.coins_for(&mid("2")), 0);
        assert_eq!(state.total_coins(), 2);
    }

    #[test]
    fn test_stale_events_skip_daily_tally() {
        let mut state = DashboardState::default();
        state.set_machines(vec![machine("1", false)]);

        state.add_coins(&mid("1"), 1, false);
        assert_eq!(state.coins_for(&mid("1")), 1);
        assert_eq!(state.daily_coins_for(&mid("1")), 0);
    }
}
