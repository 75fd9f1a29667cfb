//! The authoritative host: one sequential ledger over every world.
//!
//! Every public call takes `&mut self` and runs to completion, so operations
//! never interleave. Each call first checks the caller's role through the
//! [`Authorizer`], then hands off to the world model or the command engine,
//! which validate before they mutate.

use std::collections::BTreeMap;

use multiverse_commands::{
    CommandDefinition, CommandEnvironment, CommandError, CommandExecutor, CommandInvocation,
    CommandReceipt,
};
use multiverse_core::{
    Address, Authorizer, CommandId, EntityRef, EventBus, MultiverseError, MultiverseEvent,
    MultiverseResult, Operation, OwnershipOracle, PortalId, SimTick, StampedEvent, TileCoord,
    WorldId,
};
use multiverse_world::{EntityState, EntityWorldReducer, GameWorld, Portal};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{OwnershipLedger, RoleTable};

/// Layout of a bootstrapped world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldKind {
    /// `size` x `size` grid.
    Square,
    /// Only the origin tile.
    SingleTile,
}

/// A world to create at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSpec {
    /// Layout.
    pub kind: WorldKind,
    /// Handle the world registers under.
    pub handle: Address,
    /// Whether new entities may spawn into it.
    #[serde(default)]
    pub spawnable: bool,
    /// Edge length for square worlds; the configured default when absent.
    #[serde(default)]
    pub size: Option<u64>,
}

/// Host state. See the module docs.
#[derive(Debug)]
pub struct Multiverse<A = RoleTable, O = OwnershipLedger> {
    authorizer: A,
    ownership: O,
    reducer: EntityWorldReducer,
    worlds: BTreeMap<WorldId, GameWorld>,
    commands: CommandExecutor,
    now: SimTick,
}

impl<A: Authorizer, O: OwnershipOracle> Multiverse<A, O> {
    /// Empty host with an unbounded event journal.
    pub fn new(authorizer: A, ownership: O) -> Self {
        Self::with_events(authorizer, ownership, EventBus::new())
    }

    /// Empty host publishing through `events`.
    pub fn with_events(authorizer: A, ownership: O, events: EventBus) -> Self {
        Self {
            authorizer,
            ownership,
            reducer: EntityWorldReducer::with_events(events),
            worlds: BTreeMap::new(),
            commands: CommandExecutor::new(),
            now: SimTick::ZERO,
        }
    }

    fn authorize(&self, caller: Address, operation: Operation) -> MultiverseResult<()> {
        if self.authorizer.authorize(caller, operation) {
            Ok(())
        } else {
            debug!(%caller, %operation, "operation rejected");
            Err(MultiverseError::Unauthorized { caller, operation })
        }
    }

    fn located(&self, entity: EntityRef) -> MultiverseResult<WorldId> {
        let world = self.reducer.live_world_of(entity);
        if world.is_none() {
            return Err(MultiverseError::EntityNotInWorld { entity });
        }
        Ok(world)
    }

    /// Register `handle` and host a square world of edge `size` under it.
    pub fn create_square_world(
        &mut self,
        caller: Address,
        handle: Address,
        size: u64,
    ) -> MultiverseResult<WorldId> {
        self.create_world(caller, GameWorld::square(handle, size))
    }

    /// Register `handle` and host a single-tile world under it.
    pub fn create_single_tile_world(
        &mut self,
        caller: Address,
        handle: Address,
    ) -> MultiverseResult<WorldId> {
        self.create_world(caller, GameWorld::single_tile(handle))
    }

    fn create_world(&mut self, caller: Address, world: GameWorld) -> MultiverseResult<WorldId> {
        self.authorize(caller, Operation::RegisterWorld)?;
        let id = self.reducer.register_world(world.handle())?;
        info!(world = id.0, shape = ?world.shape(), "world hosted");
        self.worlds.insert(id, world);
        Ok(id)
    }

    /// Unregister `handle` and drop its world instance.
    ///
    /// Entities stored as located there keep the dangling id, which every
    /// later call reads as [`WorldId::NONE`]: they are out of play and may be
    /// spawned again. The world also leaves the spawn whitelist.
    pub fn retire_world(&mut self, caller: Address, handle: Address) -> MultiverseResult<WorldId> {
        self.authorize(caller, Operation::UnregisterWorld)?;
        let id = self.reducer.unregister_world(handle)?;
        self.reducer.remove_valid_spawn_world(id);
        if let Some(world) = self.worlds.remove(&id) {
            info!(
                world = id.0,
                stranded = world.active_entities().count(),
                "world retired"
            );
        }
        Ok(id)
    }

    /// Whitelist `world` as a spawn point. Returns false if already listed.
    pub fn add_spawn_world(&mut self, caller: Address, world: WorldId) -> MultiverseResult<bool> {
        self.authorize(caller, Operation::ManageSpawnWorlds)?;
        Ok(self.reducer.add_valid_spawn_world(world))
    }

    /// Remove `world` from the spawn whitelist. Returns false if absent.
    pub fn remove_spawn_world(
        &mut self,
        caller: Address,
        world: WorldId,
    ) -> MultiverseResult<bool> {
        self.authorize(caller, Operation::ManageSpawnWorlds)?;
        Ok(self.reducer.remove_valid_spawn_world(world))
    }

    /// Spawn `entity` onto `tile` of `world`.
    pub fn spawn(
        &mut self,
        caller: Address,
        world: WorldId,
        entity: EntityRef,
        tile: TileCoord,
    ) -> MultiverseResult<()> {
        self.authorize(caller, Operation::SpawnEntity)?;
        hosted(&mut self.worlds, world)?.spawn_entity(&mut self.reducer, entity, tile)
    }

    /// Move `entity` between tiles of the world it is in.
    pub fn move_within_world(
        &mut self,
        caller: Address,
        entity: EntityRef,
        from: TileCoord,
        to: TileCoord,
    ) -> MultiverseResult<()> {
        self.authorize(caller, Operation::MoveEntity)?;
        let world = self.located(entity)?;
        hosted(&mut self.worlds, world)?.move_entity(&mut self.reducer, entity, from, to)
    }

    /// Send `entity` through `portal` of the world it is in. The entity is not
    /// placed at the destination; see [`Multiverse::arrive_from_portal`].
    pub fn enter_portal(
        &mut self,
        caller: Address,
        entity: EntityRef,
        portal: PortalId,
    ) -> MultiverseResult<()> {
        self.authorize(caller, Operation::TransferEntity)?;
        let world = self.located(entity)?;
        hosted(&mut self.worlds, world)?.transfer_entity_through_portal(
            &mut self.reducer,
            entity,
            portal,
        )
    }

    /// Place an entity that came through a portal onto `tile` of the world
    /// that now owns it.
    pub fn arrive_from_portal(
        &mut self,
        caller: Address,
        entity: EntityRef,
        tile: TileCoord,
    ) -> MultiverseResult<()> {
        self.authorize(caller, Operation::TransferEntity)?;
        let world = self.located(entity)?;
        hosted(&mut self.worlds, world)?.receive_entity(&mut self.reducer, entity, tile)
    }

    /// Take `entity` out of play.
    pub fn despawn(&mut self, caller: Address, entity: EntityRef) -> MultiverseResult<()> {
        self.authorize(caller, Operation::MoveEntityBetweenWorlds)?;
        let world = self.located(entity)?;
        hosted(&mut self.worlds, world)?.despawn_entity(&mut self.reducer, entity)
    }

    /// Open a portal from `source_tile` of `world` to `target_tile` of
    /// `target_world`.
    pub fn create_portal(
        &mut self,
        caller: Address,
        world: WorldId,
        source_tile: TileCoord,
        target_tile: TileCoord,
        target_world: WorldId,
    ) -> MultiverseResult<PortalId> {
        self.authorize(caller, Operation::ManagePortals)?;
        hosted(&mut self.worlds, world)?.create_portal(
            &mut self.reducer,
            world,
            source_tile,
            target_tile,
            target_world,
        )
    }

    /// Close `portal` of `world`.
    pub fn remove_portal(
        &mut self,
        caller: Address,
        world: WorldId,
        portal: PortalId,
    ) -> MultiverseResult<Portal> {
        self.authorize(caller, Operation::ManagePortals)?;
        hosted(&mut self.worlds, world)?.remove_portal(&mut self.reducer, portal, world)
    }

    /// Register or replace a command definition.
    pub fn register_command(
        &mut self,
        caller: Address,
        definition: CommandDefinition,
    ) -> MultiverseResult<()> {
        self.authorize(caller, Operation::RegisterCommand)?;
        self.reducer
            .events_mut()
            .publish(MultiverseEvent::CommandRegistered {
                command: definition.id,
                cooldown: definition.cooldown,
                duration: definition.duration,
            });
        self.commands.registry_mut().register_command(definition);
        Ok(())
    }

    /// Permit `command` from `source_type` to `target_type`.
    pub fn allow_command(
        &mut self,
        caller: Address,
        source_type: Address,
        target_type: Address,
        command: CommandId,
    ) -> MultiverseResult<bool> {
        self.authorize(caller, Operation::ManageCommandPermissions)?;
        let changed = self
            .commands
            .registry_mut()
            .allow_command(source_type, target_type, command);
        self.permission_changed(changed, source_type, target_type, command, true);
        Ok(changed)
    }

    /// Revoke an exact permission entry.
    pub fn disallow_command(
        &mut self,
        caller: Address,
        source_type: Address,
        target_type: Address,
        command: CommandId,
    ) -> MultiverseResult<bool> {
        self.authorize(caller, Operation::ManageCommandPermissions)?;
        let changed = self
            .commands
            .registry_mut()
            .disallow_command(source_type, target_type, command);
        self.permission_changed(changed, source_type, target_type, command, false);
        Ok(changed)
    }

    fn permission_changed(
        &mut self,
        changed: bool,
        source_type: Address,
        target_type: Address,
        command: CommandId,
        allowed: bool,
    ) {
        if changed {
            self.reducer
                .events_mut()
                .publish(MultiverseEvent::CommandPermissionChanged {
                    command,
                    source_type,
                    target_type,
                    allowed,
                });
        }
    }

    /// Execute a command at the current tick on behalf of `caller`.
    pub fn execute_command(
        &mut self,
        caller: Address,
        invocation: &CommandInvocation,
    ) -> Result<CommandReceipt, CommandError> {
        let env = HostView {
            ownership: &self.ownership,
            reducer: &self.reducer,
            worlds: &self.worlds,
        };
        let receipt = self
            .commands
            .execute_command(&env, caller, self.now, invocation)?;
        self.reducer
            .events_mut()
            .publish(MultiverseEvent::CommandExecuted {
                command: receipt.command,
                source: receipt.source,
                target: receipt.target,
            });
        Ok(receipt)
    }

    /// Advance the logical clock by `ticks` and return the new time.
    pub fn advance(&mut self, ticks: u64) -> SimTick {
        self.now = self.now.advance(ticks);
        self.reducer.events_mut().set_tick(self.now);
        self.now
    }

    /// Current logical time.
    pub fn now(&self) -> SimTick {
        self.now
    }

    /// Create the listed worlds, whitelisting the spawnable ones.
    pub fn bootstrap(
        &mut self,
        caller: Address,
        specs: &[WorldSpec],
        default_size: u64,
    ) -> MultiverseResult<Vec<WorldId>> {
        let mut created = Vec::with_capacity(specs.len());
        for spec in specs {
            let id = match spec.kind {
                WorldKind::Square => self.create_square_world(
                    caller,
                    spec.handle,
                    spec.size.unwrap_or(default_size),
                )?,
                WorldKind::SingleTile => self.create_single_tile_world(caller, spec.handle)?,
            };
            if spec.spawnable {
                self.add_spawn_world(caller, id)?;
            }
            created.push(id);
        }
        Ok(created)
    }

    /// Hosted world by id.
    pub fn world(&self, world: WorldId) -> Option<&GameWorld> {
        self.worlds.get(&world)
    }

    /// Hosted world ids, ascending.
    pub fn world_ids(&self) -> impl Iterator<Item = WorldId> + '_ {
        self.worlds.keys().copied()
    }

    /// Stored world of `entity`, possibly dangling.
    pub fn world_of(&self, entity: EntityRef) -> WorldId {
        self.reducer.world_of(entity)
    }

    /// Stored world of `entity`, with retired worlds read as none.
    pub fn live_world_of(&self, entity: EntityRef) -> WorldId {
        self.reducer.live_world_of(entity)
    }

    /// State of `entity` as seen by the world it is stored in.
    pub fn entity_state(&self, entity: EntityRef) -> Option<EntityState> {
        self.worlds
            .get(&self.reducer.world_of(entity))
            .map(|world| world.entity_state(&self.reducer, entity))
    }

    /// Paginated portals of `world`.
    pub fn portals_in_world(
        &self,
        world: WorldId,
        start: usize,
        count: usize,
    ) -> MultiverseResult<Vec<Portal>> {
        self.worlds
            .get(&world)
            .ok_or(MultiverseError::UnknownWorld { world })?
            .portals_in_world(&self.reducer, world, start, count)
    }

    /// Paginated entities on `tile` of `world`.
    pub fn entities_in_tile(
        &self,
        world: WorldId,
        tile: TileCoord,
        start: usize,
        count: usize,
    ) -> Vec<EntityRef> {
        self.worlds
            .get(&world)
            .map(|hosted| hosted.entities_in_tile(tile, start, count))
            .unwrap_or_default()
    }

    /// Ownership protocol state.
    pub fn reducer(&self) -> &EntityWorldReducer {
        &self.reducer
    }

    /// Command registry and timers.
    pub fn commands(&self) -> &CommandExecutor {
        &self.commands
    }

    /// Role source.
    pub fn authorizer(&self) -> &A {
        &self.authorizer
    }

    /// Mutable role source.
    pub fn authorizer_mut(&mut self) -> &mut A {
        &mut self.authorizer
    }

    /// Ownership source.
    pub fn ownership(&self) -> &O {
        &self.ownership
    }

    /// Mutable ownership source, e.g. for minting.
    pub fn ownership_mut(&mut self) -> &mut O {
        &mut self.ownership
    }

    /// Event bus, for subscribing listeners.
    pub fn events_mut(&mut self) -> &mut EventBus {
        self.reducer.events_mut()
    }

    /// Take every retained event.
    pub fn drain_events(&mut self) -> Vec<StampedEvent> {
        self.reducer.events_mut().drain()
    }
}

impl Default for Multiverse<RoleTable, OwnershipLedger> {
    fn default() -> Self {
        Self::new(RoleTable::default(), OwnershipLedger::default())
    }
}

fn hosted(
    worlds: &mut BTreeMap<WorldId, GameWorld>,
    world: WorldId,
) -> MultiverseResult<&mut GameWorld> {
    worlds
        .get_mut(&world)
        .ok_or(MultiverseError::UnknownWorld { world })
}

struct HostView<'a, O> {
    ownership: &'a O,
    reducer: &'a EntityWorldReducer,
    worlds: &'a BTreeMap<WorldId, GameWorld>,
}

impl<O: OwnershipOracle> CommandEnvironment for HostView<'_, O> {
    fn owner_of(&self, entity: EntityRef) -> Option<Address> {
        self.ownership.owner_of(entity)
    }

    fn world_of(&self, entity: EntityRef) -> WorldId {
        self.reducer.live_world_of(entity)
    }

    fn share_tile(&self, world: WorldId, a: EntityRef, b: EntityRef) -> bool {
        self.worlds
            .get(&world)
            .is_some_and(|hosted| hosted.are_entities_in_same_tile(a, b))
    }
}
