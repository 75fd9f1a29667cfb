#![warn(missing_docs)]
//! Core primitives shared across the workspace: identities, keys, tile
//! coordinates, the error taxonomy and the notification bus.

pub mod address;
pub mod auth;
pub mod entity;
pub mod error;
pub mod events;
pub mod ids;
pub mod set;
pub mod tile;
pub mod world_id;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use address::Address;
pub use auth::{AllowAll, Authorizer, Operation, OwnershipOracle};
pub use entity::{EntityKey, EntityRef};
pub use error::{MultiverseError, MultiverseResult};
pub use events::{EventBus, EventListener, MultiverseEvent, StampedEvent};
pub use ids::{CommandId, PortalId};
pub use set::OrderedSet;
pub use tile::{pack_coordinate, unpack_coordinate, PackedTile, TileCoord};
pub use world_id::WorldId;

/// Logical clock value. Every cooldown and duration lock is compared against it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SimTick(pub u64);

impl SimTick {
    /// First tick in any deterministic timeline.
    pub const ZERO: Self = Self(0);

    /// Advance by `delta` ticks, saturating at the end of the timeline.
    pub fn advance(self, delta: u64) -> Self {
        Self(self.0.saturating_add(delta))
    }
}

impl fmt::Display for SimTick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}
