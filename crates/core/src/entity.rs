//! Entity references and their identity keys.

use crate::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A game actor: the contract that issued it plus its numeric id.
///
/// The contract doubles as the entity's *type* for command permissions, so real
/// entities never carry [`Address::ZERO`]: that value is the permission
/// wildcard. Issuers reject it (see `MultiverseError::ReservedContract`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EntityRef {
    /// Issuing contract (ownership-proof identity).
    pub contract: Address,
    /// Id within the contract.
    pub id: u64,
}

impl EntityRef {
    /// The empty entity. A command aimed at it is a world command.
    pub const NONE: Self = Self {
        contract: Address::ZERO,
        id: 0,
    };

    /// Construct a reference.
    pub const fn new(contract: Address, id: u64) -> Self {
        Self { contract, id }
    }

    /// True for [`EntityRef::NONE`].
    pub const fn is_none(self) -> bool {
        self.contract.is_zero() && self.id == 0
    }

    /// Type used by the command permission matrix.
    pub const fn entity_type(self) -> Address {
        self.contract
    }

    /// Stable identity key.
    pub const fn key(self) -> EntityKey {
        EntityKey {
            contract: self.contract,
            id: self.id,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.contract, self.id)
    }
}

/// Identity key of an entity, ordered `(contract, id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    contract: Address,
    id: u64,
}

impl EntityKey {
    /// Content hash of the key for external indexes and logs.
    ///
    /// Fields are hashed in tuple order as little-endian words, so the digest is
    /// stable across platforms and runs.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.contract.0.to_le_bytes());
        hasher.update(&self.id.to_le_bytes());
        *hasher.finalize().as_bytes()
    }

    /// [`EntityKey::digest`] as lowercase hex, the form written to logs.
    pub fn digest_hex(&self) -> String {
        blake3::Hash::from(self.digest()).to_hex().to_string()
    }

    /// The entity this key was derived from.
    pub const fn entity(&self) -> EntityRef {
        EntityRef {
            contract: self.contract,
            id: self.id,
        }
    }
}

impl From<EntityRef> for EntityKey {
    fn from(entity: EntityRef) -> Self {
        entity.key()
    }
}
