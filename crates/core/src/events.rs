//! Change notifications for external observers (indexers, UIs).
//!
//! Events are published synchronously at the point a state change commits.
//! Listeners observe; they can neither veto nor alter the change, and nothing
//! in the core depends on whether anyone is subscribed.

use crate::{Address, CommandId, EntityRef, PortalId, SimTick, TileCoord, WorldId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Every notification the backend emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MultiverseEvent {
    /// A world handle received an id.
    WorldRegistered {
        /// Registered handle.
        handle: Address,
        /// Assigned id.
        world: WorldId,
    },
    /// A world handle and its id were forgotten.
    WorldUnregistered {
        /// Removed handle.
        handle: Address,
        /// Freed id.
        world: WorldId,
    },
    /// A world joined the spawn whitelist.
    SpawnWorldAdded {
        /// Whitelisted world.
        world: WorldId,
    },
    /// A world left the spawn whitelist.
    SpawnWorldRemoved {
        /// Removed world.
        world: WorldId,
    },
    /// Stored location of an entity changed.
    EntityWorldChanged {
        /// Entity moved.
        entity: EntityRef,
        /// Previous location (0 when spawning).
        from: WorldId,
        /// New location (0 when despawning).
        to: WorldId,
    },
    /// Entity was spawned onto a tile.
    EntitySpawned {
        /// Entity placed.
        entity: EntityRef,
        /// Hosting world.
        world: WorldId,
        /// Tile it was placed on.
        tile: TileCoord,
    },
    /// Entity left play entirely.
    EntityDespawned {
        /// Entity removed.
        entity: EntityRef,
        /// World it left.
        world: WorldId,
    },
    /// Entity moved between tiles of one world.
    EntityMoved {
        /// Entity moved.
        entity: EntityRef,
        /// World it moved in.
        world: WorldId,
        /// Previous tile.
        from: TileCoord,
        /// New tile.
        to: TileCoord,
    },
    /// Entity went through a portal.
    EntityTransferred {
        /// Entity transferred.
        entity: EntityRef,
        /// Portal used.
        portal: PortalId,
        /// World it left.
        from: WorldId,
        /// World now owning it.
        to: WorldId,
    },
    /// Entity owned by a world after a transfer was placed on one of its tiles.
    EntityArrived {
        /// Entity placed.
        entity: EntityRef,
        /// Receiving world.
        world: WorldId,
        /// Tile it was placed on.
        tile: TileCoord,
    },
    /// Portal was created.
    PortalCreated {
        /// World holding the source tile.
        world: WorldId,
        /// New portal.
        portal: PortalId,
        /// Source tile.
        source_tile: TileCoord,
        /// Destination tile.
        target_tile: TileCoord,
        /// Destination world.
        target_world: WorldId,
    },
    /// Portal was removed.
    PortalRemoved {
        /// World holding the source tile.
        world: WorldId,
        /// Removed portal.
        portal: PortalId,
    },
    /// Command definition was registered or replaced.
    CommandRegistered {
        /// Command registered.
        command: CommandId,
        /// Cooldown in ticks.
        cooldown: u64,
        /// Duration lock in ticks.
        duration: u64,
    },
    /// Permission matrix entry was toggled.
    CommandPermissionChanged {
        /// Command affected.
        command: CommandId,
        /// Source entity type (zero means any).
        source_type: Address,
        /// Target entity type (zero means any).
        target_type: Address,
        /// New state of the entry.
        allowed: bool,
    },
    /// Command ran successfully.
    CommandExecuted {
        /// Command executed.
        command: CommandId,
        /// Acting entity.
        source: EntityRef,
        /// Target entity (empty for world commands).
        target: EntityRef,
    },
}

impl MultiverseEvent {
    /// Stable snake_case kind label, matching the serialized tag.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::WorldRegistered { .. } => "world_registered",
            Self::WorldUnregistered { .. } => "world_unregistered",
            Self::SpawnWorldAdded { .. } => "spawn_world_added",
            Self::SpawnWorldRemoved { .. } => "spawn_world_removed",
            Self::EntityWorldChanged { .. } => "entity_world_changed",
            Self::EntitySpawned { .. } => "entity_spawned",
            Self::EntityDespawned { .. } => "entity_despawned",
            Self::EntityMoved { .. } => "entity_moved",
            Self::EntityTransferred { .. } => "entity_transferred",
            Self::EntityArrived { .. } => "entity_arrived",
            Self::PortalCreated { .. } => "portal_created",
            Self::PortalRemoved { .. } => "portal_removed",
            Self::CommandRegistered { .. } => "command_registered",
            Self::CommandPermissionChanged { .. } => "command_permission_changed",
            Self::CommandExecuted { .. } => "command_executed",
        }
    }
}

/// An event together with the logical tick at which it committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampedEvent {
    /// Commit tick.
    pub tick: SimTick,
    /// Payload.
    pub event: MultiverseEvent,
}

/// Observer of committed events.
pub trait EventListener {
    /// Called once per event, in commit order.
    fn on_event(&mut self, event: &StampedEvent);
}

impl<F> EventListener for F
where
    F: FnMut(&StampedEvent),
{
    fn on_event(&mut self, event: &StampedEvent) {
        self(event)
    }
}

/// Synchronous broadcast with a retained journal.
#[derive(Default)]
pub struct EventBus {
    tick: SimTick,
    listeners: Vec<Box<dyn EventListener>>,
    journal: VecDeque<StampedEvent>,
    capacity: Option<usize>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("tick", &self.tick)
            .field("listeners", &self.listeners.len())
            .field("journal", &self.journal.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl EventBus {
    /// Bus with an unbounded journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bus that keeps at most `capacity` undrained events, dropping the oldest.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Tick stamped onto subsequently published events.
    pub fn set_tick(&mut self, tick: SimTick) {
        self.tick = tick;
    }

    /// Current stamp.
    pub fn tick(&self) -> SimTick {
        self.tick
    }

    /// Attach a listener. Listeners only see events published after subscribing.
    pub fn subscribe(&mut self, listener: impl EventListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Broadcast `event` and retain it in the journal.
    pub fn publish(&mut self, event: MultiverseEvent) {
        let stamped = StampedEvent {
            tick: self.tick,
            event,
        };
        tracing::trace!(tick = stamped.tick.0, kind = stamped.event.kind(), "event");
        for listener in &mut self.listeners {
            listener.on_event(&stamped);
        }
        if self.capacity == Some(0) {
            return;
        }
        self.journal.push_back(stamped);
        if let Some(capacity) = self.capacity {
            while self.journal.len() > capacity {
                self.journal.pop_front();
            }
        }
    }

    /// Events not yet drained, oldest first.
    pub fn journal(&self) -> impl Iterator<Item = &StampedEvent> {
        self.journal.iter()
    }

    /// Take all retained events.
    pub fn drain(&mut self) -> Vec<StampedEvent> {
        self.journal.drain(..).collect()
    }
}
