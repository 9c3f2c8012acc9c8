//! Role/assignment-based visibility scoping over machine ids.
//!
//! Pure functions, no I/O. Every ingestion path — worker relay handling,
//! live-socket handling, and server-list loading — must route visibility
//! decisions through [`can_access_machine`] so the three call sites cannot
//! drift apart.

use crate::types::{Machine, MachineId, UserRole};

/// The access scope of the current session: role plus assignment list.
#[derive(Debug, Clone)]
pub struct AccessScope {
    /// Role of the signed-in user.
    pub role: UserRole,
    /// Machines assigned to the user. Ignored for admins.
    pub assigned_machine_ids: Vec<MachineId>,
}

impl AccessScope {
    /// Create a scope.
    pub fn new(role: UserRole, assigned_machine_ids: Vec<MachineId>) -> Self {
        Self {
            role,
            assigned_machine_ids,
        }
    }

    /// Scope with full fleet visibility.
    pub fn admin() -> Self {
        Self::new(UserRole::Admin, Vec::new())
    }

    /// Whether the given machine is visible under this scope.
    pub fn can_access(&self, machine_id: &MachineId) -> bool {
        can_access_machine(&self.role, &self.assigned_machine_ids, machine_id)
    }
}

/// Visibility decision for a single machine.
///
/// Admins see everything. Any other role sees a machine iff it is in the
/// assignment list; an empty list yields zero visible machines.
pub fn can_access_machine(
    role: &UserRole,
    assigned_machine_ids: &[MachineId],
    machine_id: &MachineId,
) -> bool {
    if machine_id.as_str().is_empty() {
        return false;
    }
    if role.is_admin() {
        return true;
    }
    if assigned_machine_ids.is_empty() {
        return false;
    }
    assigned_machine_ids.contains(machine_id)
}

/// Apply the same rule to a machine directory listing.
pub fn filter_machines_for_role(machines: Vec<Machine>, scope: &AccessScope) -> Vec<Machine> {
    if scope.role.is_admin() {
        return machines;
    }
    machines
        .into_iter()
        .filter(|m| can_access_machine(&scope.role, &scope.assigned_machine_ids, &m.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MachineStatus;

    fn mid(s: &str) -> MachineId {
        MachineId::parse(s).unwrap()
    }

    fn machine(id: &str) -> Machine {
        Machine {
            id: mid(id),
            name: format!("Máquina {id}"),
            location: None,
            status: MachineStatus::Inactive,
            test_mode: false,
            last_on: None,
            last_off: None,
        }
    }

    #[test]
    fn test_empty_assignment_hides_everything_for_non_admins() {
        for role in [
            UserRole::Supervisor,
            UserRole::Employee,
            UserRole::Other("janitor".into()),
        ] {
            assert!(!can_access_machine(&role, &[], &mid("1")));
            assert!(!can_access_machine(&role, &[], &mid("99")));
        }
    }

    #[test]
    fn test_membership_grants_access_for_non_admins() {
        let assigned = vec![mid("3"), mid("7")];
        for role in [UserRole::Supervisor, UserRole::Employee] {
            assert!(can_access_machine(&role, &assigned, &mid("7")));
            assert!(!can_access_machine(&role, &assigned, &mid("8")));
        }
    }

    #[test]
    fn test_admin_sees_every_machine_regardless_of_assignment() {
        for assigned in [vec![], vec![mid("1")], vec![mid("2"), mid("3")]] {
            for target in ["1", "2", "42"] {
                assert!(can_access_machine(&UserRole::Admin, &assigned, &mid(target)));
            }
        }
    }

    #[test]
    fn test_filter_machines_for_role() {
        let fleet = vec![machine("1"), machine("2"), machine("3")];

        let admin = AccessScope::admin();
        assert_eq!(filter_machines_for_role(fleet.clone(), &admin).len(), 3);

        let employee = AccessScope::new(UserRole::Employee, vec![mid("2")]);
        let visible = filter_machines_for_role(fleet.clone(), &employee);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, mid("2"));

        let unassigned = AccessScope::new(UserRole::Employee, vec![]);
        assert!(filter_machines_for_role(fleet, &unassigned).is_empty());
    }
}
