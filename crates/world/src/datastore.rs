use std::collections::BTreeMap;

use multiverse_core::{EntityKey, EntityRef, WorldId};

/// Authoritative current world id per entity.
///
/// Only the current value is kept; history is published as events by the
/// reducer. Unspawned entities are simply absent, which reads as
/// [`WorldId::NONE`]. Uses BTreeMap so snapshots iterate deterministically.
#[derive(Debug, Clone, Default)]
pub struct EntityWorldDatastore {
    locations: BTreeMap<EntityKey, WorldId>,
}

impl EntityWorldDatastore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored world of `entity`. Does not check that the world still exists.
    pub fn world_of(&self, entity: EntityRef) -> WorldId {
        self.locations
            .get(&entity.key())
            .copied()
            .unwrap_or(WorldId::NONE)
    }

    /// Overwrite the stored world. Writing [`WorldId::NONE`] drops the entry.
    pub(crate) fn set(&mut self, entity: EntityRef, world: WorldId) -> WorldId {
        let previous = if world.is_none() {
            self.locations.remove(&entity.key())
        } else {
            self.locations.insert(entity.key(), world)
        };
        previous.unwrap_or(WorldId::NONE)
    }

    /// Entities currently stored as located in `world`, in key order.
    pub fn entities_in(&self, world: WorldId) -> impl Iterator<Item = EntityRef> + '_ {
        self.locations
            .iter()
            .filter(move |(_, stored)| **stored == world)
            .map(|(key, _)| key.entity())
    }

    /// Number of located entities.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// True when no entity is located anywhere.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
