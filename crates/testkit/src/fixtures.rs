//! Ready-made collaborators for host and command tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use multiverse_commands::{CommandHandler, CommandShape};
use multiverse_core::{
    Address, CommandId, EntityRef, MultiverseResult, Operation, OwnershipOracle, WorldId,
};
use multiverse_server::{Multiverse, OwnershipLedger, RoleTable, WorldKind, WorldSpec};

/// Holds every role.
pub const ADMIN: Address = Address(0xad00);
/// Game server: spawns, moves and transfers entities.
pub const GAME: Address = Address(0x6a00);
/// A player account.
pub const PLAYER: Address = Address(0x1001);
/// A second player account.
pub const RIVAL: Address = Address(0x1002);
/// Handle of the spawnable world.
pub const W1_HANDLE: Address = Address(0x5100);
/// Handle of the second world.
pub const W2_HANDLE: Address = Address(0x5200);

/// Ownership oracle answering from a fixed table.
#[derive(Debug, Clone, Default)]
pub struct StaticOwnership {
    owners: HashMap<EntityRef, Address>,
}

impl StaticOwnership {
    /// Record `owner` as the holder of `entity`.
    pub fn with(mut self, entity: EntityRef, owner: Address) -> Self {
        self.owners.insert(entity, owner);
        self
    }
}

impl OwnershipOracle for StaticOwnership {
    fn owner_of(&self, entity: EntityRef) -> Option<Address> {
        self.owners.get(&entity).copied()
    }
}

/// One call received by a [`RecordingHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerCall {
    /// Command dispatched.
    pub command: CommandId,
    /// Entry point used.
    pub shape: CommandShape,
    /// Acting entity.
    pub source: EntityRef,
    /// Target entity ([`EntityRef::NONE`] for world commands).
    pub target: EntityRef,
    /// World passed to world commands, otherwise none.
    pub world: WorldId,
    /// Payload.
    pub data: Vec<u8>,
}

/// Handler that accepts every shape and records the call.
///
/// Clones share the same call log.
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    calls: Arc<Mutex<Vec<HandlerCall>>>,
    failure: Option<String>,
}

impl RecordingHandler {
    /// Handler that succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler that fails every call with `reason`, recording nothing.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Calls received so far.
    pub fn calls(&self) -> Vec<HandlerCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: HandlerCall) -> anyhow::Result<()> {
        if let Some(reason) = &self.failure {
            anyhow::bail!("{reason}");
        }
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
        Ok(())
    }
}

impl CommandHandler for RecordingHandler {
    fn execute_self(
        &self,
        command: CommandId,
        entity: EntityRef,
        data: &[u8],
    ) -> anyhow::Result<()> {
        self.record(HandlerCall {
            command,
            shape: CommandShape::SelfTarget,
            source: entity,
            target: entity,
            world: WorldId::NONE,
            data: data.to_vec(),
        })
    }

    fn execute_on_entity(
        &self,
        command: CommandId,
        entity: EntityRef,
        target: EntityRef,
        data: &[u8],
    ) -> anyhow::Result<()> {
        self.record(HandlerCall {
            command,
            shape: CommandShape::Entity,
            source: entity,
            target,
            world: WorldId::NONE,
            data: data.to_vec(),
        })
    }

    fn execute_on_world(
        &self,
        command: CommandId,
        entity: EntityRef,
        world: WorldId,
        data: &[u8],
    ) -> anyhow::Result<()> {
        self.record(HandlerCall {
            command,
            shape: CommandShape::World,
            source: entity,
            target: EntityRef::NONE,
            world,
            data: data.to_vec(),
        })
    }
}

/// Roles used by the fixtures: [`ADMIN`] holds everything, [`GAME`] may
/// spawn, move, transfer and despawn.
pub fn fixture_roles() -> RoleTable {
    let mut roles = RoleTable::with_admin(ADMIN);
    for operation in [
        Operation::SpawnEntity,
        Operation::MoveEntity,
        Operation::TransferEntity,
        Operation::MoveEntityBetweenWorlds,
    ] {
        roles.grant(operation, GAME);
    }
    roles
}

/// A host with two square worlds.
#[derive(Debug)]
pub struct TwoWorlds {
    /// The host.
    pub host: Multiverse,
    /// Spawnable world under [`W1_HANDLE`].
    pub w1: WorldId,
    /// World under [`W2_HANDLE`], not spawnable.
    pub w2: WorldId,
}

impl TwoWorlds {
    /// Mint an entity of `contract` for `owner`.
    pub fn mint(&mut self, contract: Address, owner: Address) -> MultiverseResult<EntityRef> {
        self.host.ownership_mut().mint(contract, owner)
    }
}

/// Bootstrap [`TwoWorlds`] with worlds of edge `size`.
pub fn two_world_multiverse(size: u64) -> MultiverseResult<TwoWorlds> {
    let mut host = Multiverse::new(fixture_roles(), OwnershipLedger::new());
    let ids = host.bootstrap(
        ADMIN,
        &[
            WorldSpec {
                kind: WorldKind::Square,
                handle: W1_HANDLE,
                spawnable: true,
                size: Some(size),
            },
            WorldSpec {
                kind: WorldKind::Square,
                handle: W2_HANDLE,
                spawnable: false,
                size: Some(size),
            },
        ],
        size,
    )?;
    Ok(TwoWorlds {
        host,
        w1: ids[0],
        w2: ids[1],
    })
}
