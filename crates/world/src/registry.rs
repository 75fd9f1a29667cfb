//! World registry: the handle ↔ id bijection.
//!
//! The registry is the source of truth for "does this world exist". Ids are
//! handed out sequentially from [`WorldId::FIRST`] and never reused, so a stale
//! id held elsewhere can never alias a newer world.

use std::collections::{BTreeMap, HashMap};

use multiverse_core::{Address, MultiverseError, MultiverseResult, WorldId};

/// Bidirectional mapping between world handles and ids.
#[derive(Debug, Clone)]
pub struct WorldRegistry {
    ids: HashMap<Address, WorldId>,
    handles: BTreeMap<WorldId, Address>,
    next_id: WorldId,
}

impl Default for WorldRegistry {
    fn default() -> Self {
        Self {
            ids: HashMap::new(),
            handles: BTreeMap::new(),
            next_id: WorldId::FIRST,
        }
    }
}

impl WorldRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the next id to `handle`.
    pub fn register_world(&mut self, handle: Address) -> MultiverseResult<WorldId> {
        if let Some(&world) = self.ids.get(&handle) {
            return Err(MultiverseError::AlreadyRegistered { handle, world });
        }
        let world = self.next_id;
        self.next_id = world.next();
        self.ids.insert(handle, world);
        self.handles.insert(world, handle);
        Ok(world)
    }

    /// Forget `handle` and free its id.
    pub fn unregister_world(&mut self, handle: Address) -> MultiverseResult<WorldId> {
        let world = self
            .ids
            .remove(&handle)
            .ok_or(MultiverseError::NotRegistered { handle })?;
        self.handles.remove(&world);
        Ok(world)
    }

    /// Id of `handle`, or [`WorldId::NONE`] when unregistered.
    pub fn world_id(&self, handle: Address) -> WorldId {
        self.ids.get(&handle).copied().unwrap_or(WorldId::NONE)
    }

    /// Handle registered under `world`.
    pub fn world_handle(&self, world: WorldId) -> Option<Address> {
        self.handles.get(&world).copied()
    }

    /// True when `world` is currently registered.
    pub fn is_registered(&self, world: WorldId) -> bool {
        self.handles.contains_key(&world)
    }

    /// Registered worlds in id order.
    pub fn worlds(&self) -> impl Iterator<Item = (WorldId, Address)> + '_ {
        self.handles.iter().map(|(id, handle)| (*id, *handle))
    }

    /// Number of registered worlds.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
