//! The single mediator of every entity location change.
//!
//! There is no lock anywhere in this module. Safety against two worlds racing
//! for the same entity comes from the authorization chain: only the world whose
//! id is currently stored for an entity may relinquish it, and only a world may
//! spawn an entity into itself. Whoever commits first changes the stored id, so
//! the loser necessarily fails its own check.

use multiverse_core::{
    Address, EntityRef, EventBus, MultiverseError, MultiverseEvent, MultiverseResult, Operation,
    WorldId,
};
use tracing::{debug, info};

use crate::{EntityWorldDatastore, SpawnRegistry, WorldRegistry};

/// Owns the registry, the spawn whitelist, the location store and the event bus.
#[derive(Debug, Default)]
pub struct EntityWorldReducer {
    registry: WorldRegistry,
    spawns: SpawnRegistry,
    locations: EntityWorldDatastore,
    events: EventBus,
}

impl EntityWorldReducer {
    /// Fresh reducer with an unbounded event journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh reducer publishing through `events`.
    pub fn with_events(events: EventBus) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    /// Register a world handle.
    pub fn register_world(&mut self, handle: Address) -> MultiverseResult<WorldId> {
        let world = self.registry.register_world(handle)?;
        info!(%handle, world = world.0, "world registered");
        self.events.publish(MultiverseEvent::WorldRegistered { handle, world });
        Ok(world)
    }

    /// Unregister a world handle.
    ///
    /// Entities whose stored location is this world keep it, but every later
    /// call reads it as [`WorldId::NONE`]; see
    /// [`EntityWorldReducer::live_world_of`]. A stranded entity can therefore
    /// be spawned again.
    pub fn unregister_world(&mut self, handle: Address) -> MultiverseResult<WorldId> {
        let world = self.registry.unregister_world(handle)?;
        info!(%handle, world = world.0, "world unregistered");
        self.events.publish(MultiverseEvent::WorldUnregistered { handle, world });
        Ok(world)
    }

    /// Whitelist `world` as a spawn point.
    pub fn add_valid_spawn_world(&mut self, world: WorldId) -> bool {
        let added = self.spawns.add_valid_spawn_world(world);
        if added {
            debug!(world = world.0, "spawn world added");
            self.events.publish(MultiverseEvent::SpawnWorldAdded { world });
        }
        added
    }

    /// Remove `world` from the spawn whitelist.
    pub fn remove_valid_spawn_world(&mut self, world: WorldId) -> bool {
        let removed = self.spawns.remove_valid_spawn_world(world);
        if removed {
            debug!(world = world.0, "spawn world removed");
            self.events.publish(MultiverseEvent::SpawnWorldRemoved { world });
        }
        removed
    }

    /// Record that `caller` (a world) spawned `entity` into itself.
    pub fn spawn_entity(
        &mut self,
        caller: Address,
        entity: EntityRef,
        target: WorldId,
    ) -> MultiverseResult<()> {
        if !self.spawns.is_valid_spawn_world(target) {
            return Err(MultiverseError::InvalidWorld { world: target });
        }
        let current = self.live_world_of(entity);
        if !current.is_none() {
            return Err(MultiverseError::EntityAlreadyInWorld {
                entity,
                world: current,
            });
        }
        if target.is_none() || self.registry.world_id(caller) != target {
            return Err(MultiverseError::Unauthorized {
                caller,
                operation: Operation::SpawnEntity,
            });
        }
        self.commit(entity, target);
        Ok(())
    }

    /// Record that the world currently owning `entity` hands it to `target`.
    ///
    /// `target == WorldId::NONE` despawns.
    pub fn move_entity_between_worlds(
        &mut self,
        caller: Address,
        entity: EntityRef,
        target: WorldId,
    ) -> MultiverseResult<()> {
        if !target.is_none() && !self.registry.is_registered(target) {
            return Err(MultiverseError::InvalidWorld { world: target });
        }
        let current = self.live_world_of(entity);
        if current.is_none() {
            return Err(MultiverseError::EntityNotInWorld { entity });
        }
        if self.registry.world_id(caller) != current {
            return Err(MultiverseError::Unauthorized {
                caller,
                operation: Operation::MoveEntityBetweenWorlds,
            });
        }
        self.commit(entity, target);
        Ok(())
    }

    fn commit(&mut self, entity: EntityRef, to: WorldId) {
        let from = self.locations.set(entity, to);
        debug!(
            %entity,
            key = %entity.key().digest_hex(),
            from = from.0,
            to = to.0,
            "entity world changed"
        );
        self.events.publish(MultiverseEvent::EntityWorldChanged { entity, from, to });
    }

    /// Raw stored world of `entity`, possibly dangling.
    pub fn world_of(&self, entity: EntityRef) -> WorldId {
        self.locations.world_of(entity)
    }

    /// Stored world of `entity`, reading a world that has since been
    /// unregistered as [`WorldId::NONE`].
    pub fn live_world_of(&self, entity: EntityRef) -> WorldId {
        let world = self.locations.world_of(entity);
        if self.registry.is_registered(world) {
            world
        } else {
            WorldId::NONE
        }
    }

    /// Id registered for `handle`, or [`WorldId::NONE`].
    pub fn world_id(&self, handle: Address) -> WorldId {
        self.registry.world_id(handle)
    }

    /// Handle registered for `world`.
    pub fn world_handle(&self, world: WorldId) -> Option<Address> {
        self.registry.world_handle(world)
    }

    /// True when `world` is registered.
    pub fn is_registered(&self, world: WorldId) -> bool {
        self.registry.is_registered(world)
    }

    /// True when `world` is a spawn point.
    pub fn is_valid_spawn_world(&self, world: WorldId) -> bool {
        self.spawns.is_valid_spawn_world(world)
    }

    /// World registry.
    pub fn registry(&self) -> &WorldRegistry {
        &self.registry
    }

    /// Spawn whitelist.
    pub fn spawn_points(&self) -> &SpawnRegistry {
        &self.spawns
    }

    /// Location store.
    pub fn datastore(&self) -> &EntityWorldDatastore {
        &self.locations
    }

    /// Event bus.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Event bus, for components that commit alongside the reducer.
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }
}
