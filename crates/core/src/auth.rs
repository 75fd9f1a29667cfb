//! Capabilities the core consults but never populates.
//!
//! Role wiring (who may register worlds, create portals, define commands) and
//! ownership proofs (who holds an entity) live outside the core. The core only
//! asks yes/no questions through these traits.

use crate::{Address, EntityRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operations subject to a caller check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Add a world to the registry.
    RegisterWorld,
    /// Remove a world from the registry.
    UnregisterWorld,
    /// Add or remove spawn-point whitelist entries.
    ManageSpawnWorlds,
    /// Record that an entity spawned into a world.
    SpawnEntity,
    /// Record that an entity left its world.
    MoveEntityBetweenWorlds,
    /// Move an entity between tiles of one world.
    MoveEntity,
    /// Send an entity through a portal, or place one that arrived.
    TransferEntity,
    /// Create or remove portals.
    ManagePortals,
    /// Register command definitions.
    RegisterCommand,
    /// Edit the command permission matrix.
    ManageCommandPermissions,
}

impl Operation {
    /// Every operation, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::RegisterWorld,
        Self::UnregisterWorld,
        Self::ManageSpawnWorlds,
        Self::SpawnEntity,
        Self::MoveEntityBetweenWorlds,
        Self::MoveEntity,
        Self::TransferEntity,
        Self::ManagePortals,
        Self::RegisterCommand,
        Self::ManageCommandPermissions,
    ];

    /// Human-readable verb phrase.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RegisterWorld => "register world",
            Self::UnregisterWorld => "unregister world",
            Self::ManageSpawnWorlds => "manage spawn worlds",
            Self::SpawnEntity => "spawn entity",
            Self::MoveEntityBetweenWorlds => "move entity between worlds",
            Self::MoveEntity => "move entity",
            Self::TransferEntity => "transfer entity",
            Self::ManagePortals => "manage portals",
            Self::RegisterCommand => "register command",
            Self::ManageCommandPermissions => "manage command permissions",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answers whether a caller may perform an operation.
pub trait Authorizer {
    /// True when `caller` holds the role for `operation`.
    fn authorize(&self, caller: Address, operation: Operation) -> bool;
}

/// Authorizer that lets everyone through. Useful for tests and local tools.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn authorize(&self, _caller: Address, _operation: Operation) -> bool {
        true
    }
}

/// Ownership-proof layer: who holds an entity.
pub trait OwnershipOracle {
    /// Current holder of `entity`, if it exists.
    fn owner_of(&self, entity: EntityRef) -> Option<Address>;
}
