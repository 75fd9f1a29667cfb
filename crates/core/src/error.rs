//! Rejection taxonomy.
//!
//! Every variant is a terminal rejection of the requested operation. Nothing is
//! retried by the core, and no state is modified when one is returned.

use crate::{Address, CommandId, EntityRef, Operation, PortalId, SimTick, TileCoord, WorldId};
use thiserror::Error;

/// Result alias used throughout the workspace.
pub type MultiverseResult<T> = Result<T, MultiverseError>;

/// Why an operation was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MultiverseError {
    /// Caller does not hold the ownership proof for the entity.
    #[error("{caller} does not own {entity}")]
    NotOwner {
        /// Invoking identity.
        caller: Address,
        /// Entity whose ownership was required.
        entity: EntityRef,
    },
    /// The zero address is the wildcard entity type and cannot issue entities.
    #[error("{contract} is reserved and cannot issue entities")]
    ReservedContract {
        /// Rejected contract.
        contract: Address,
    },
    /// Caller identity may not perform the operation.
    #[error("{caller} is not authorized to {operation}")]
    Unauthorized {
        /// Invoking identity.
        caller: Address,
        /// Operation that was attempted.
        operation: Operation,
    },

    /// World handle is already registered.
    #[error("world handle {handle} is already registered as {world}")]
    AlreadyRegistered {
        /// Handle passed to registration.
        handle: Address,
        /// Id it already holds.
        world: WorldId,
    },
    /// World handle is not registered.
    #[error("world handle {handle} is not registered")]
    NotRegistered {
        /// Handle that was looked up.
        handle: Address,
    },
    /// Supplied world id does not belong to the world instance addressed.
    #[error("{supplied} does not match this world ({actual})")]
    InvalidWorldId {
        /// Id supplied by the caller.
        supplied: WorldId,
        /// Id the instance is registered under.
        actual: WorldId,
    },
    /// Target world is not registered or not a valid spawn point.
    #[error("{world} is not a valid target")]
    InvalidWorld {
        /// Rejected target.
        world: WorldId,
    },
    /// No world instance is hosted for the id or handle.
    #[error("no world instance is hosted for {world}")]
    UnknownWorld {
        /// Requested world.
        world: WorldId,
    },

    /// Entity is already located somewhere.
    #[error("{entity} is already in {world}")]
    EntityAlreadyInWorld {
        /// Entity being placed.
        entity: EntityRef,
        /// Where it currently is.
        world: WorldId,
    },
    /// Entity is not (or not actively) in the world addressed.
    #[error("{entity} is not in the world")]
    EntityNotInWorld {
        /// Entity being addressed.
        entity: EntityRef,
    },
    /// Source and target of an entity command are in different worlds.
    #[error("{source_entity} and {target_entity} are not in the same world")]
    EntitiesNotInSameWorld {
        /// Acting entity.
        source_entity: EntityRef,
        /// Targeted entity.
        target_entity: EntityRef,
    },
    /// Source and target of an entity command are on different tiles.
    #[error("{source_entity} and {target_entity} are not on the same tile")]
    EntitiesNotInSameTile {
        /// Acting entity.
        source_entity: EntityRef,
        /// Targeted entity.
        target_entity: EntityRef,
    },

    /// Tile is not a legal coordinate of the world.
    #[error("{tile} is not a valid tile")]
    InvalidTileCoordinate {
        /// Rejected tile.
        tile: TileCoord,
    },
    /// Entity is not on the tile the caller claimed.
    #[error("{entity} is not on tile {tile}")]
    EntityNotInTile {
        /// Entity being addressed.
        entity: EntityRef,
        /// Tile the caller expected.
        tile: TileCoord,
    },
    /// Tile lies outside a square world.
    #[error("{tile} is outside a world of size {size}")]
    WorldSizeExceeded {
        /// Rejected tile.
        tile: TileCoord,
        /// Edge length of the world.
        size: u64,
    },
    /// A portal already occupies the source tile.
    #[error("{portal} already occupies tile {tile}")]
    PortalAlreadyExists {
        /// Occupied tile.
        tile: TileCoord,
        /// Existing portal.
        portal: PortalId,
    },
    /// Portal id is unknown to the world.
    #[error("{portal} not found")]
    PortalNotFound {
        /// Requested portal.
        portal: PortalId,
    },

    /// Command id was never registered.
    #[error("{command} is not registered")]
    CommandNotFound {
        /// Requested command.
        command: CommandId,
    },
    /// Command is still cooling down for the entity.
    #[error("{command} is on cooldown for {entity} until {ready_at}")]
    CommandOnCooldown {
        /// Acting entity.
        entity: EntityRef,
        /// Command attempted.
        command: CommandId,
        /// First tick at which it is ready again.
        ready_at: SimTick,
    },
    /// Entity is busy with a duration command.
    #[error("{entity} is locked by a running command until {until}")]
    EntityDurationLocked {
        /// Acting entity.
        entity: EntityRef,
        /// First tick at which the entity is unlocked.
        until: SimTick,
    },
    /// Permission matrix has no entry for the source/target type pair.
    #[error("{command} is not usable from {source_type} against {target_type}")]
    CommandNotUsableByEntity {
        /// Command attempted.
        command: CommandId,
        /// Source entity type.
        source_type: Address,
        /// Target entity type.
        target_type: Address,
    },
}
