use std::collections::HashMap;

use multiverse_core::{OrderedSet, PackedTile, PortalId, TileCoord, WorldId};
use serde::{Deserialize, Serialize};

/// Directed link from a tile of one world to a tile of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portal {
    /// Id within the owning world.
    pub id: PortalId,
    /// World holding the source tile.
    pub world: WorldId,
    /// Tile an entity must stand on to use the portal.
    pub source_tile: TileCoord,
    /// Tile the entity is meant to arrive on.
    pub target_tile: TileCoord,
    /// World that takes ownership of transferred entities.
    pub target_world: WorldId,
}

/// Per-world portal storage, indexed by id and by source tile.
#[derive(Debug, Clone)]
pub(crate) struct PortalBook {
    portals: HashMap<PortalId, Portal>,
    order: OrderedSet<PortalId>,
    by_tile: HashMap<PackedTile, OrderedSet<PortalId>>,
    next_id: u64,
}

impl Default for PortalBook {
    fn default() -> Self {
        Self {
            portals: HashMap::new(),
            order: OrderedSet::new(),
            by_tile: HashMap::new(),
            next_id: 1,
        }
    }
}

impl PortalBook {
    pub(crate) fn insert(
        &mut self,
        world: WorldId,
        source_tile: TileCoord,
        target_tile: TileCoord,
        target_world: WorldId,
    ) -> Portal {
        let id = PortalId(self.next_id);
        self.next_id += 1;
        let portal = Portal {
            id,
            world,
            source_tile,
            target_tile,
            target_world,
        };
        self.portals.insert(id, portal);
        self.order.insert(id);
        self.by_tile
            .entry(source_tile.pack())
            .or_default()
            .insert(id);
        portal
    }

    pub(crate) fn remove(&mut self, id: PortalId) -> Option<Portal> {
        let portal = self.portals.remove(&id)?;
        self.order.remove(&id);
        let key = portal.source_tile.pack();
        if let Some(at_tile) = self.by_tile.get_mut(&key) {
            at_tile.remove(&id);
            if at_tile.is_empty() {
                self.by_tile.remove(&key);
            }
        }
        Some(portal)
    }

    pub(crate) fn get(&self, id: PortalId) -> Option<&Portal> {
        self.portals.get(&id)
    }

    /// First portal whose source is `tile`, or [`PortalId::NONE`].
    pub(crate) fn at_tile(&self, tile: TileCoord) -> PortalId {
        self.by_tile
            .get(&tile.pack())
            .and_then(|ids| ids.get(0))
            .unwrap_or(PortalId::NONE)
    }

    pub(crate) fn count_at_tile(&self, tile: TileCoord) -> usize {
        self.by_tile.get(&tile.pack()).map_or(0, OrderedSet::len)
    }

    pub(crate) fn page(&self, start: usize, count: usize) -> Vec<Portal> {
        self.order
            .page(start, count)
            .into_iter()
            .filter_map(|id| self.portals.get(&id).copied())
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }
}
