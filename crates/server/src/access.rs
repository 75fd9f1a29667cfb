//! Role wiring for host operations.

use std::collections::{BTreeSet, HashMap};

use multiverse_core::{Address, Authorizer, Operation};
use tracing::debug;

/// Maps each operation to the callers allowed to perform it.
#[derive(Debug, Clone, Default)]
pub struct RoleTable {
    roles: HashMap<Operation, BTreeSet<Address>>,
}

impl RoleTable {
    /// Empty table; every caller is rejected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with `admin` granted every operation.
    pub fn with_admin(admin: Address) -> Self {
        let mut table = Self::new();
        table.grant_all(admin);
        table
    }

    /// Allow `caller` to perform `operation`. Returns false if already granted.
    pub fn grant(&mut self, operation: Operation, caller: Address) -> bool {
        let granted = self.roles.entry(operation).or_default().insert(caller);
        if granted {
            debug!(%caller, %operation, "role granted");
        }
        granted
    }

    /// Grant every operation to `caller`.
    pub fn grant_all(&mut self, caller: Address) {
        for operation in Operation::ALL {
            self.grant(operation, caller);
        }
    }

    /// Withdraw `operation` from `caller`. Returns false if it was not granted.
    pub fn revoke(&mut self, operation: Operation, caller: Address) -> bool {
        let revoked = self
            .roles
            .get_mut(&operation)
            .is_some_and(|holders| holders.remove(&caller));
        if revoked {
            debug!(%caller, %operation, "role revoked");
        }
        revoked
    }

    /// Callers holding `operation`, ascending.
    pub fn holders(&self, operation: Operation) -> impl Iterator<Item = Address> + '_ {
        self.roles
            .get(&operation)
            .into_iter()
            .flat_map(|holders| holders.iter().copied())
    }
}

impl Authorizer for RoleTable {
    fn authorize(&self, caller: Address, operation: Operation) -> bool {
        self.roles
            .get(&operation)
            .is_some_and(|holders| holders.contains(&caller))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grants_are_per_operation() {
        let mut table = RoleTable::new();
        let mover = Address(5);
        assert!(table.grant(Operation::MoveEntity, mover));
        assert!(!table.grant(Operation::MoveEntity, mover));
        assert!(table.authorize(mover, Operation::MoveEntity));
        assert!(!table.authorize(mover, Operation::ManagePortals));
        assert!(table.revoke(Operation::MoveEntity, mover));
        assert!(!table.authorize(mover, Operation::MoveEntity));
        assert!(!table.revoke(Operation::MoveEntity, mover));
    }

    #[test]
    fn admin_holds_everything() {
        let admin = Address(1);
        let table = RoleTable::with_admin(admin);
        assert!(Operation::ALL
            .iter()
            .all(|operation| table.authorize(admin, *operation)));
        assert_eq!(
            table.holders(Operation::RegisterCommand).collect::<Vec<_>>(),
            vec![admin]
        );
    }
}
