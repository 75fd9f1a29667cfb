//! In-memory ownership proofs.

use std::collections::HashMap;

use multiverse_core::{
    Address, EntityKey, EntityRef, MultiverseError, MultiverseResult, OwnershipOracle,
};
use tracing::debug;

/// Issues entities per contract and tracks who holds each one.
#[derive(Debug, Clone, Default)]
pub struct OwnershipLedger {
    owners: HashMap<EntityKey, Address>,
    next_ids: HashMap<Address, u64>,
}

impl OwnershipLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next entity of `contract` to `owner`. Ids start at 1.
    ///
    /// The zero contract is the wildcard entity type and is refused.
    pub fn mint(&mut self, contract: Address, owner: Address) -> MultiverseResult<EntityRef> {
        if contract.is_zero() {
            return Err(MultiverseError::ReservedContract { contract });
        }
        let next = self.next_ids.entry(contract).or_insert(1);
        let entity = EntityRef::new(contract, *next);
        *next += 1;
        self.owners.insert(entity.key(), owner);
        debug!(%entity, %owner, "entity minted");
        Ok(entity)
    }

    /// Hand `entity` from `caller` to `to`.
    pub fn transfer(
        &mut self,
        caller: Address,
        entity: EntityRef,
        to: Address,
    ) -> MultiverseResult<()> {
        match self.owners.get_mut(&entity.key()) {
            Some(owner) if *owner == caller => {
                *owner = to;
                debug!(%entity, from = %caller, %to, "entity ownership transferred");
                Ok(())
            }
            _ => Err(MultiverseError::NotOwner { caller, entity }),
        }
    }

    /// Number of issued entities.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// True when nothing has been minted.
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

impl OwnershipOracle for OwnershipLedger {
    fn owner_of(&self, entity: EntityRef) -> Option<Address> {
        self.owners.get(&entity.key()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_numbers_per_contract() {
        let mut ledger = OwnershipLedger::new();
        let a = ledger.mint(Address(0xa), Address(1)).unwrap();
        let b = ledger.mint(Address(0xa), Address(2)).unwrap();
        let c = ledger.mint(Address(0xb), Address(1)).unwrap();
        assert_eq!((a.id, b.id, c.id), (1, 2, 1));
        assert_eq!(ledger.owner_of(b), Some(Address(2)));
        assert_eq!(ledger.owner_of(EntityRef::new(Address(0xa), 9)), None);
    }

    #[test]
    fn only_the_holder_can_transfer() {
        let mut ledger = OwnershipLedger::new();
        let entity = ledger.mint(Address(0xa), Address(1)).unwrap();
        assert_eq!(
            ledger.transfer(Address(2), entity, Address(2)),
            Err(MultiverseError::NotOwner {
                caller: Address(2),
                entity,
            })
        );
        ledger.transfer(Address(1), entity, Address(2)).unwrap();
        assert_eq!(ledger.owner_of(entity), Some(Address(2)));
    }

    #[test]
    fn wildcard_contract_cannot_mint() {
        let mut ledger = OwnershipLedger::new();
        assert_eq!(
            ledger.mint(Address::ZERO, Address(1)),
            Err(MultiverseError::ReservedContract {
                contract: Address::ZERO,
            })
        );
        assert!(ledger.is_empty());
        assert_eq!(ledger.owner_of(EntityRef::new(Address::ZERO, 1)), None);
    }
}
