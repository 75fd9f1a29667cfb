//! Spawn-point whitelist.

use multiverse_core::{OrderedSet, WorldId};

/// World ids that may receive newly spawned entities.
#[derive(Debug, Clone, Default)]
pub struct SpawnRegistry {
    worlds: OrderedSet<WorldId>,
}

impl SpawnRegistry {
    /// Empty whitelist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whitelist `world`. Returns false if it already was.
    pub fn add_valid_spawn_world(&mut self, world: WorldId) -> bool {
        self.worlds.insert(world)
    }

    /// Remove `world` from the whitelist. Returns false if it was absent.
    pub fn remove_valid_spawn_world(&mut self, world: WorldId) -> bool {
        self.worlds.remove(&world)
    }

    /// Membership test.
    pub fn is_valid_spawn_world(&self, world: WorldId) -> bool {
        self.worlds.contains(&world)
    }

    /// Paginated listing.
    pub fn spawn_worlds(&self, start: usize, count: usize) -> Vec<WorldId> {
        self.worlds.page(start, count)
    }

    /// Number of whitelisted worlds.
    pub fn len(&self) -> usize {
        self.worlds.len()
    }

    /// True when nothing is whitelisted.
    pub fn is_empty(&self) -> bool {
        self.worlds.is_empty()
    }
}
