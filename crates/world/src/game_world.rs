//! Per-world spatial index: entity ↔ tile membership, portals, neighbours.
//!
//! A [`GameWorld`] is addressed by its handle. Its numeric id is whatever the
//! registry currently holds for that handle, so an unregistered instance has id
//! [`WorldId::NONE`] and refuses every id-checked operation.
//!
//! Mutating operations validate everything locally, then commit through the
//! [`EntityWorldReducer`] (which may still reject), and only then touch the
//! local index. A rejection at any step leaves both sides untouched.

use std::collections::HashMap;

use multiverse_core::{
    Address, EntityKey, EntityRef, MultiverseError, MultiverseEvent, MultiverseResult,
    OrderedSet, PackedTile, PortalId, TileCoord, WorldId,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::portal::PortalBook;
use crate::{EntityWorldReducer, Portal};

/// Edge length of a square world unless configured otherwise.
pub const DEFAULT_WORLD_SIZE: u64 = 100;

/// Spatial layout of a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorldShape {
    /// `size × size` grid on layer 0.
    Square {
        /// Edge length in tiles.
        size: u64,
    },
    /// Exactly one tile, the origin. Portals may stack on it.
    SingleTile,
}

impl WorldShape {
    /// Validate that `tile` exists in this layout.
    ///
    /// Square bounds compare the coordinates reinterpreted as unsigned, so
    /// negative values wrap to huge numbers and fall outside.
    pub fn check_tile(self, tile: TileCoord) -> MultiverseResult<()> {
        match self {
            Self::Square { size } => {
                if tile.z != 0 {
                    return Err(MultiverseError::InvalidTileCoordinate { tile });
                }
                if tile.x as u64 >= size || tile.y as u64 >= size {
                    return Err(MultiverseError::WorldSizeExceeded { tile, size });
                }
                Ok(())
            }
            Self::SingleTile => {
                if tile != TileCoord::ORIGIN {
                    return Err(MultiverseError::InvalidTileCoordinate { tile });
                }
                Ok(())
            }
        }
    }

    /// Whether a source tile may hold at most one portal.
    pub fn unique_portal_tiles(self) -> bool {
        matches!(self, Self::Square { .. })
    }

    /// Axis-aligned neighbours of `tile` that exist in this layout.
    pub fn neighbors(self, tile: TileCoord) -> Vec<TileCoord> {
        match self {
            Self::SingleTile => Vec::new(),
            Self::Square { .. } => [(-1i64, 0i64), (1, 0), (0, -1), (0, 1)]
                .into_iter()
                .filter_map(|(dx, dy)| {
                    let x = tile.x.checked_add(dx)?;
                    let y = tile.y.checked_add(dy)?;
                    let candidate = TileCoord::with_layer(x, y, tile.z);
                    self.check_tile(candidate).ok().map(|_| candidate)
                })
                .collect(),
        }
    }
}

/// What a world knows about one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityState {
    /// Last tile recorded here (origin if never placed).
    pub tile: TileCoord,
    /// Stored location from the datastore.
    pub world: WorldId,
    /// Whether this world currently hosts the entity.
    pub active: bool,
}

#[derive(Debug, Clone, Copy)]
struct Placement {
    tile: TileCoord,
    active: bool,
}

/// One hosted world.
#[derive(Debug, Clone)]
pub struct GameWorld {
    handle: Address,
    shape: WorldShape,
    placements: HashMap<EntityKey, Placement>,
    tiles: HashMap<PackedTile, OrderedSet<EntityRef>>,
    portals: PortalBook,
}

impl GameWorld {
    /// World with the given layout.
    pub fn new(handle: Address, shape: WorldShape) -> Self {
        Self {
            handle,
            shape,
            placements: HashMap::new(),
            tiles: HashMap::new(),
            portals: PortalBook::default(),
        }
    }

    /// Square world of `size × size` tiles.
    pub fn square(handle: Address, size: u64) -> Self {
        Self::new(handle, WorldShape::Square { size })
    }

    /// Degenerate world with only the origin tile.
    pub fn single_tile(handle: Address) -> Self {
        Self::new(handle, WorldShape::SingleTile)
    }

    /// Caller identity of this world.
    pub fn handle(&self) -> Address {
        self.handle
    }

    /// Layout.
    pub fn shape(&self) -> WorldShape {
        self.shape
    }

    /// Id currently registered for this world's handle.
    pub fn world_id(&self, reducer: &EntityWorldReducer) -> WorldId {
        reducer.world_id(self.handle)
    }

    fn is_active(&self, entity: EntityRef) -> bool {
        self.placements
            .get(&entity.key())
            .is_some_and(|placement| placement.active)
    }

    /// Id and tile of an entity this world actively hosts, agreeing with the
    /// datastore.
    fn resident(
        &self,
        reducer: &EntityWorldReducer,
        entity: EntityRef,
    ) -> MultiverseResult<(WorldId, TileCoord)> {
        let world = self.world_id(reducer);
        match self.placements.get(&entity.key()) {
            Some(placement)
                if placement.active && !world.is_none() && reducer.world_of(entity) == world =>
            {
                Ok((world, placement.tile))
            }
            _ => Err(MultiverseError::EntityNotInWorld { entity }),
        }
    }

    fn index(&mut self, entity: EntityRef, tile: TileCoord) {
        self.placements.insert(
            entity.key(),
            Placement {
                tile,
                active: true,
            },
        );
        self.tiles.entry(tile.pack()).or_default().insert(entity);
    }

    fn unindex(&mut self, entity: EntityRef, tile: TileCoord) {
        let key = tile.pack();
        if let Some(at_tile) = self.tiles.get_mut(&key) {
            at_tile.remove(&entity);
            if at_tile.is_empty() {
                self.tiles.remove(&key);
            }
        }
    }

    /// Spawn a fresh entity onto `tile` of this world.
    pub fn spawn_entity(
        &mut self,
        reducer: &mut EntityWorldReducer,
        entity: EntityRef,
        tile: TileCoord,
    ) -> MultiverseResult<()> {
        self.shape.check_tile(tile)?;
        let world = self.world_id(reducer);
        if self.is_active(entity) {
            return Err(MultiverseError::EntityAlreadyInWorld { entity, world });
        }
        reducer.spawn_entity(self.handle, entity, world)?;
        self.index(entity, tile);
        debug!(%entity, world = world.0, %tile, "entity spawned");
        reducer
            .events_mut()
            .publish(MultiverseEvent::EntitySpawned {
                entity,
                world,
                tile,
            });
        Ok(())
    }

    /// Move a hosted entity from `from` to `to`.
    pub fn move_entity(
        &mut self,
        reducer: &mut EntityWorldReducer,
        entity: EntityRef,
        from: TileCoord,
        to: TileCoord,
    ) -> MultiverseResult<()> {
        let (world, current) = self.resident(reducer, entity)?;
        if current != from {
            return Err(MultiverseError::EntityNotInTile { entity, tile: from });
        }
        self.shape.check_tile(to)?;
        self.unindex(entity, from);
        self.index(entity, to);
        debug!(%entity, world = world.0, %from, %to, "entity moved");
        reducer
            .events_mut()
            .publish(MultiverseEvent::EntityMoved {
                entity,
                world,
                from,
                to,
            });
        Ok(())
    }

    /// Take a hosted entity out of play entirely.
    pub fn despawn_entity(
        &mut self,
        reducer: &mut EntityWorldReducer,
        entity: EntityRef,
    ) -> MultiverseResult<()> {
        let (world, tile) = self.resident(reducer, entity)?;
        reducer.move_entity_between_worlds(self.handle, entity, WorldId::NONE)?;
        self.unindex(entity, tile);
        self.placements.remove(&entity.key());
        debug!(%entity, world = world.0, "entity despawned");
        reducer
            .events_mut()
            .publish(MultiverseEvent::EntityDespawned { entity, world });
        Ok(())
    }

    /// Send a hosted entity through `portal`.
    ///
    /// Ownership moves to the portal's target world, but the entity is not
    /// placed there: the destination must call
    /// [`GameWorld::receive_entity`] separately.
    pub fn transfer_entity_through_portal(
        &mut self,
        reducer: &mut EntityWorldReducer,
        entity: EntityRef,
        portal: PortalId,
    ) -> MultiverseResult<()> {
        let (world, tile) = self.resident(reducer, entity)?;
        let portal = *self
            .portals
            .get(portal)
            .ok_or(MultiverseError::PortalNotFound { portal })?;
        if tile != portal.source_tile {
            return Err(MultiverseError::EntityNotInTile {
                entity,
                tile: portal.source_tile,
            });
        }
        reducer.move_entity_between_worlds(self.handle, entity, portal.target_world)?;
        self.unindex(entity, tile);
        if let Some(placement) = self.placements.get_mut(&entity.key()) {
            placement.active = false;
        }
        debug!(
            %entity,
            portal = portal.id.0,
            from = world.0,
            to = portal.target_world.0,
            "entity transferred through portal"
        );
        reducer
            .events_mut()
            .publish(MultiverseEvent::EntityTransferred {
                entity,
                portal: portal.id,
                from: world,
                to: portal.target_world,
            });
        Ok(())
    }

    /// Place an entity that this world already owns (after a portal transfer)
    /// onto `tile`.
    pub fn receive_entity(
        &mut self,
        reducer: &mut EntityWorldReducer,
        entity: EntityRef,
        tile: TileCoord,
    ) -> MultiverseResult<()> {
        self.shape.check_tile(tile)?;
        let world = self.world_id(reducer);
        if world.is_none() || reducer.world_of(entity) != world {
            return Err(MultiverseError::EntityNotInWorld { entity });
        }
        if self.is_active(entity) {
            return Err(MultiverseError::EntityAlreadyInWorld { entity, world });
        }
        self.index(entity, tile);
        debug!(%entity, world = world.0, %tile, "entity arrived");
        reducer
            .events_mut()
            .publish(MultiverseEvent::EntityArrived {
                entity,
                world,
                tile,
            });
        Ok(())
    }

    fn check_world_id(
        &self,
        reducer: &EntityWorldReducer,
        supplied: WorldId,
    ) -> MultiverseResult<WorldId> {
        let actual = self.world_id(reducer);
        if actual.is_none() || supplied != actual {
            return Err(MultiverseError::InvalidWorldId { supplied, actual });
        }
        Ok(actual)
    }

    /// Create a portal from `source_tile` of this world.
    pub fn create_portal(
        &mut self,
        reducer: &mut EntityWorldReducer,
        world: WorldId,
        source_tile: TileCoord,
        target_tile: TileCoord,
        target_world: WorldId,
    ) -> MultiverseResult<PortalId> {
        let world = self.check_world_id(reducer, world)?;
        if self.shape.unique_portal_tiles() {
            let existing = self.portals.at_tile(source_tile);
            if !existing.is_none() {
                return Err(MultiverseError::PortalAlreadyExists {
                    tile: source_tile,
                    portal: existing,
                });
            }
        }
        self.shape.check_tile(source_tile)?;
        let portal = self
            .portals
            .insert(world, source_tile, target_tile, target_world);
        debug!(
            world = world.0,
            portal = portal.id.0,
            %source_tile,
            %target_tile,
            target_world = target_world.0,
            "portal created"
        );
        reducer
            .events_mut()
            .publish(MultiverseEvent::PortalCreated {
                world,
                portal: portal.id,
                source_tile,
                target_tile,
                target_world,
            });
        Ok(portal.id)
    }

    /// Remove `portal` from this world.
    pub fn remove_portal(
        &mut self,
        reducer: &mut EntityWorldReducer,
        portal: PortalId,
        world: WorldId,
    ) -> MultiverseResult<Portal> {
        let world = self.check_world_id(reducer, world)?;
        let removed = self
            .portals
            .remove(portal)
            .ok_or(MultiverseError::PortalNotFound { portal })?;
        debug!(world = world.0, portal = portal.0, "portal removed");
        reducer
            .events_mut()
            .publish(MultiverseEvent::PortalRemoved { world, portal });
        Ok(removed)
    }

    /// Tile, stored world and active flag of `entity`.
    pub fn entity_state(&self, reducer: &EntityWorldReducer, entity: EntityRef) -> EntityState {
        let (tile, active) = self
            .placements
            .get(&entity.key())
            .map_or((TileCoord::ORIGIN, false), |p| (p.tile, p.active));
        EntityState {
            tile,
            world: reducer.world_of(entity),
            active,
        }
    }

    /// Portal by id.
    pub fn portal(&self, portal: PortalId) -> Option<&Portal> {
        self.portals.get(portal)
    }

    /// Paginated portals of this world.
    pub fn portals_in_world(
        &self,
        reducer: &EntityWorldReducer,
        world: WorldId,
        start: usize,
        count: usize,
    ) -> MultiverseResult<Vec<Portal>> {
        self.check_world_id(reducer, world)?;
        Ok(self.portals.page(start, count))
    }

    /// Number of portals in this world.
    pub fn portal_count(&self) -> usize {
        self.portals.len()
    }

    /// First portal whose source is `tile`, or [`PortalId::NONE`].
    pub fn portal_at_tile(&self, tile: TileCoord) -> PortalId {
        self.portals.at_tile(tile)
    }

    /// True when at least one portal starts at `tile`.
    pub fn is_portal_at_tile(&self, tile: TileCoord) -> bool {
        self.portals.count_at_tile(tile) > 0
    }

    /// Paginated entities standing on `tile`.
    pub fn entities_in_tile(&self, tile: TileCoord, start: usize, count: usize) -> Vec<EntityRef> {
        self.tiles
            .get(&tile.pack())
            .map(|at_tile| at_tile.page(start, count))
            .unwrap_or_default()
    }

    /// Number of entities standing on `tile`.
    pub fn entity_count_in_tile(&self, tile: TileCoord) -> usize {
        self.tiles.get(&tile.pack()).map_or(0, OrderedSet::len)
    }

    /// True when `entity` is actively hosted on `tile`.
    pub fn is_entity_in_tile(&self, entity: EntityRef, tile: TileCoord) -> bool {
        self.tiles
            .get(&tile.pack())
            .is_some_and(|at_tile| at_tile.contains(&entity))
    }

    /// True when both entities are actively hosted on the same tile.
    pub fn are_entities_in_same_tile(&self, a: EntityRef, b: EntityRef) -> bool {
        match (self.placements.get(&a.key()), self.placements.get(&b.key())) {
            (Some(pa), Some(pb)) => pa.active && pb.active && pa.tile == pb.tile,
            _ => false,
        }
    }

    /// Axis-aligned neighbours of `tile`.
    pub fn neighboring_tiles(&self, tile: TileCoord) -> Vec<TileCoord> {
        self.shape.neighbors(tile)
    }

    /// Entities this world actively hosts.
    pub fn active_entities(&self) -> impl Iterator<Item = EntityRef> + '_ {
        self.placements
            .iter()
            .filter(|(_, placement)| placement.active)
            .map(|(key, _)| key.entity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W1: Address = Address(0xa1);
    const W2: Address = Address(0xa2);
    const HERO: EntityRef = EntityRef::new(Address(0xe0), 1);
    const SIDEKICK: EntityRef = EntityRef::new(Address(0xe0), 2);

    fn setup() -> (EntityWorldReducer, GameWorld, GameWorld) {
        let mut reducer = EntityWorldReducer::new();
        for handle in [W1, W2] {
            let id = reducer.register_world(handle).unwrap();
            reducer.add_valid_spawn_world(id);
        }
        (
            reducer,
            GameWorld::square(W1, DEFAULT_WORLD_SIZE),
            GameWorld::single_tile(W2),
        )
    }

    #[test]
    fn square_bounds_use_unsigned_interpretation() {
        let shape = WorldShape::Square { size: 100 };
        assert!(shape.check_tile(TileCoord::new(0, 0)).is_ok());
        assert!(shape.check_tile(TileCoord::new(99, 99)).is_ok());
        assert!(matches!(
            shape.check_tile(TileCoord::new(100, 0)),
            Err(MultiverseError::WorldSizeExceeded { .. })
        ));
        assert!(matches!(
            shape.check_tile(TileCoord::new(-1, 5)),
            Err(MultiverseError::WorldSizeExceeded { .. })
        ));
        assert!(matches!(
            shape.check_tile(TileCoord::with_layer(1, 1, 1)),
            Err(MultiverseError::InvalidTileCoordinate { .. })
        ));
    }

    #[test]
    fn single_tile_accepts_only_origin() {
        let shape = WorldShape::SingleTile;
        assert!(shape.check_tile(TileCoord::ORIGIN).is_ok());
        assert_eq!(
            shape.check_tile(TileCoord::new(0, 1)),
            Err(MultiverseError::InvalidTileCoordinate {
                tile: TileCoord::new(0, 1)
            })
        );
        assert!(shape.neighbors(TileCoord::ORIGIN).is_empty());
    }

    #[test]
    fn neighbours_are_clipped_to_bounds() {
        let shape = WorldShape::Square { size: 100 };
        assert_eq!(
            shape.neighbors(TileCoord::new(0, 0)),
            vec![TileCoord::new(1, 0), TileCoord::new(0, 1)]
        );
        assert_eq!(shape.neighbors(TileCoord::new(50, 50)).len(), 4);
        assert_eq!(
            shape.neighbors(TileCoord::new(99, 99)),
            vec![TileCoord::new(98, 99), TileCoord::new(99, 98)]
        );
        assert_eq!(shape.neighbors(TileCoord::new(i64::MAX, 0)).len(), 0);
    }

    #[test]
    fn spawn_indexes_entity_on_tile() {
        let (mut reducer, mut w1, _) = setup();
        let tile = TileCoord::new(50, 50);
        w1.spawn_entity(&mut reducer, HERO, tile).unwrap();
        assert_eq!(
            w1.entity_state(&reducer, HERO),
            EntityState {
                tile,
                world: WorldId(1),
                active: true
            }
        );
        assert!(w1.is_entity_in_tile(HERO, tile));
        assert_eq!(w1.entities_in_tile(tile, 0, 10), vec![HERO]);
    }

    #[test]
    fn spawn_twice_is_rejected_without_side_effects() {
        let (mut reducer, mut w1, _) = setup();
        w1.spawn_entity(&mut reducer, HERO, TileCoord::new(1, 1))
            .unwrap();
        assert_eq!(
            w1.spawn_entity(&mut reducer, HERO, TileCoord::new(2, 2)),
            Err(MultiverseError::EntityAlreadyInWorld {
                entity: HERO,
                world: WorldId(1)
            })
        );
        assert!(w1.entities_in_tile(TileCoord::new(2, 2), 0, 10).is_empty());
    }

    #[test]
    fn spawn_out_of_bounds_is_rejected() {
        let (mut reducer, mut w1, mut w2) = setup();
        assert!(matches!(
            w1.spawn_entity(&mut reducer, HERO, TileCoord::new(100, 3)),
            Err(MultiverseError::WorldSizeExceeded { .. })
        ));
        assert!(matches!(
            w2.spawn_entity(&mut reducer, HERO, TileCoord::new(1, 0)),
            Err(MultiverseError::InvalidTileCoordinate { .. })
        ));
        assert_eq!(reducer.world_of(HERO), WorldId::NONE);
    }

    #[test]
    fn failed_reducer_spawn_leaves_index_untouched() {
        let (mut reducer, mut w1, _) = setup();
        reducer.remove_valid_spawn_world(WorldId(1));
        assert_eq!(
            w1.spawn_entity(&mut reducer, HERO, TileCoord::new(1, 1)),
            Err(MultiverseError::InvalidWorld { world: WorldId(1) })
        );
        assert!(!w1.entity_state(&reducer, HERO).active);
        assert_eq!(w1.entity_count_in_tile(TileCoord::new(1, 1)), 0);
    }

    #[test]
    fn move_checks_residency_tile_and_bounds() {
        let (mut reducer, mut w1, _) = setup();
        let start = TileCoord::new(5, 5);
        assert_eq!(
            w1.move_entity(&mut reducer, HERO, start, TileCoord::new(6, 5)),
            Err(MultiverseError::EntityNotInWorld { entity: HERO })
        );
        w1.spawn_entity(&mut reducer, HERO, start).unwrap();
        assert_eq!(
            w1.move_entity(&mut reducer, HERO, TileCoord::new(4, 4), TileCoord::new(6, 5)),
            Err(MultiverseError::EntityNotInTile {
                entity: HERO,
                tile: TileCoord::new(4, 4)
            })
        );
        assert!(matches!(
            w1.move_entity(&mut reducer, HERO, start, TileCoord::new(5, 100)),
            Err(MultiverseError::WorldSizeExceeded { .. })
        ));
        w1.move_entity(&mut reducer, HERO, start, TileCoord::new(6, 5))
            .unwrap();
        assert!(!w1.is_entity_in_tile(HERO, start));
        assert!(w1.is_entity_in_tile(HERO, TileCoord::new(6, 5)));
    }

    #[test]
    fn same_tile_requires_both_active_on_one_tile() {
        let (mut reducer, mut w1, _) = setup();
        let tile = TileCoord::new(2, 2);
        w1.spawn_entity(&mut reducer, HERO, tile).unwrap();
        assert!(!w1.are_entities_in_same_tile(HERO, SIDEKICK));
        w1.spawn_entity(&mut reducer, SIDEKICK, tile).unwrap();
        assert!(w1.are_entities_in_same_tile(HERO, SIDEKICK));
        w1.move_entity(&mut reducer, SIDEKICK, tile, TileCoord::new(2, 3))
            .unwrap();
        assert!(!w1.are_entities_in_same_tile(HERO, SIDEKICK));
    }

    #[test]
    fn square_world_allows_one_portal_per_tile() {
        let (mut reducer, mut w1, _) = setup();
        let tile = TileCoord::new(51, 50);
        let first = w1
            .create_portal(&mut reducer, WorldId(1), tile, TileCoord::ORIGIN, WorldId(2))
            .unwrap();
        assert_eq!(first, PortalId(1));
        assert_eq!(
            w1.create_portal(&mut reducer, WorldId(1), tile, TileCoord::ORIGIN, WorldId(2)),
            Err(MultiverseError::PortalAlreadyExists {
                tile,
                portal: first
            })
        );
        assert!(w1.is_portal_at_tile(tile));
        assert_eq!(w1.portal_at_tile(TileCoord::new(0, 0)), PortalId::NONE);
    }

    #[test]
    fn single_tile_world_stacks_portals() {
        let (mut reducer, _, mut w2) = setup();
        let a = w2
            .create_portal(
                &mut reducer,
                WorldId(2),
                TileCoord::ORIGIN,
                TileCoord::new(1, 1),
                WorldId(1),
            )
            .unwrap();
        let b = w2
            .create_portal(
                &mut reducer,
                WorldId(2),
                TileCoord::ORIGIN,
                TileCoord::new(2, 2),
                WorldId(1),
            )
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(w2.portal_count(), 2);
        assert!(matches!(
            w2.create_portal(
                &mut reducer,
                WorldId(2),
                TileCoord::new(0, 1),
                TileCoord::ORIGIN,
                WorldId(1),
            ),
            Err(MultiverseError::InvalidTileCoordinate { .. })
        ));
    }

    #[test]
    fn portal_admin_checks_world_id() {
        let (mut reducer, mut w1, _) = setup();
        assert_eq!(
            w1.create_portal(
                &mut reducer,
                WorldId(2),
                TileCoord::ORIGIN,
                TileCoord::ORIGIN,
                WorldId(2),
            ),
            Err(MultiverseError::InvalidWorldId {
                supplied: WorldId(2),
                actual: WorldId(1)
            })
        );
        assert!(matches!(
            w1.create_portal(
                &mut reducer,
                WorldId(1),
                TileCoord::new(200, 0),
                TileCoord::ORIGIN,
                WorldId(2),
            ),
            Err(MultiverseError::WorldSizeExceeded { .. })
        ));
        let portal = w1
            .create_portal(
                &mut reducer,
                WorldId(1),
                TileCoord::ORIGIN,
                TileCoord::ORIGIN,
                WorldId(2),
            )
            .unwrap();
        assert!(matches!(
            w1.remove_portal(&mut reducer, portal, WorldId(2)),
            Err(MultiverseError::InvalidWorldId { .. })
        ));
        assert_eq!(
            w1.remove_portal(&mut reducer, PortalId(42), WorldId(1)),
            Err(MultiverseError::PortalNotFound {
                portal: PortalId(42)
            })
        );
        let removed = w1.remove_portal(&mut reducer, portal, WorldId(1)).unwrap();
        assert_eq!(removed.id, portal);
        assert!(w1.portal(portal).is_none());
    }

    #[test]
    fn portals_paginate() {
        let (mut reducer, mut w1, _) = setup();
        for x in 0..3 {
            w1.create_portal(
                &mut reducer,
                WorldId(1),
                TileCoord::new(x, 0),
                TileCoord::ORIGIN,
                WorldId(2),
            )
            .unwrap();
        }
        let page = w1.portals_in_world(&reducer, WorldId(1), 1, 1).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, PortalId(2));
        assert!(w1
            .portals_in_world(&reducer, WorldId(1), 3, 1)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn transfer_hands_ownership_without_placing() {
        let (mut reducer, mut w1, w2) = setup();
        let tile = TileCoord::new(51, 50);
        w1.spawn_entity(&mut reducer, HERO, tile).unwrap();
        let portal = w1
            .create_portal(&mut reducer, WorldId(1), tile, TileCoord::ORIGIN, WorldId(2))
            .unwrap();
        w1.transfer_entity_through_portal(&mut reducer, HERO, portal)
            .unwrap();

        let state = w1.entity_state(&reducer, HERO);
        assert!(!state.active);
        assert_eq!(state.world, WorldId(2));
        assert_eq!(w1.entity_count_in_tile(tile), 0);
        assert!(!w2.entity_state(&reducer, HERO).active);
        assert_eq!(w2.active_entities().count(), 0);
    }

    #[test]
    fn transfer_requires_standing_on_source_tile() {
        let (mut reducer, mut w1, _) = setup();
        w1.spawn_entity(&mut reducer, HERO, TileCoord::new(1, 1))
            .unwrap();
        let portal = w1
            .create_portal(
                &mut reducer,
                WorldId(1),
                TileCoord::new(2, 2),
                TileCoord::ORIGIN,
                WorldId(2),
            )
            .unwrap();
        assert_eq!(
            w1.transfer_entity_through_portal(&mut reducer, HERO, portal),
            Err(MultiverseError::EntityNotInTile {
                entity: HERO,
                tile: TileCoord::new(2, 2)
            })
        );
        assert_eq!(
            w1.transfer_entity_through_portal(&mut reducer, HERO, PortalId(9)),
            Err(MultiverseError::PortalNotFound {
                portal: PortalId(9)
            })
        );
        assert_eq!(reducer.world_of(HERO), WorldId(1));
    }

    #[test]
    fn transfer_to_unregistered_world_is_rejected_atomically() {
        let (mut reducer, mut w1, _) = setup();
        let tile = TileCoord::new(3, 3);
        w1.spawn_entity(&mut reducer, HERO, tile).unwrap();
        let portal = w1
            .create_portal(&mut reducer, WorldId(1), tile, TileCoord::ORIGIN, WorldId(77))
            .unwrap();
        assert_eq!(
            w1.transfer_entity_through_portal(&mut reducer, HERO, portal),
            Err(MultiverseError::InvalidWorld { world: WorldId(77) })
        );
        assert!(w1.is_entity_in_tile(HERO, tile));
    }

    #[test]
    fn destination_receives_transferred_entity_explicitly() {
        let (mut reducer, mut w1, mut w2) = setup();
        let tile = TileCoord::new(7, 7);
        w1.spawn_entity(&mut reducer, HERO, tile).unwrap();
        let portal = w1
            .create_portal(&mut reducer, WorldId(1), tile, TileCoord::ORIGIN, WorldId(2))
            .unwrap();
        w1.transfer_entity_through_portal(&mut reducer, HERO, portal)
            .unwrap();

        assert!(matches!(
            w2.spawn_entity(&mut reducer, HERO, TileCoord::ORIGIN),
            Err(MultiverseError::EntityAlreadyInWorld { .. })
        ));
        assert_eq!(
            w1.receive_entity(&mut reducer, HERO, tile),
            Err(MultiverseError::EntityNotInWorld { entity: HERO })
        );
        w2.receive_entity(&mut reducer, HERO, TileCoord::ORIGIN)
            .unwrap();
        assert!(w2.entity_state(&reducer, HERO).active);
        assert!(matches!(
            w2.receive_entity(&mut reducer, HERO, TileCoord::ORIGIN),
            Err(MultiverseError::EntityAlreadyInWorld { .. })
        ));
    }

    #[test]
    fn despawn_releases_entity_everywhere() {
        let (mut reducer, mut w1, mut w2) = setup();
        let tile = TileCoord::new(9, 9);
        w1.spawn_entity(&mut reducer, HERO, tile).unwrap();
        w1.despawn_entity(&mut reducer, HERO).unwrap();
        assert_eq!(reducer.world_of(HERO), WorldId::NONE);
        assert_eq!(w1.entity_count_in_tile(tile), 0);
        assert_eq!(
            w1.despawn_entity(&mut reducer, HERO),
            Err(MultiverseError::EntityNotInWorld { entity: HERO })
        );
        w2.spawn_entity(&mut reducer, HERO, TileCoord::ORIGIN)
            .unwrap();
    }

    #[test]
    fn unregistered_world_refuses_id_checked_operations() {
        let (mut reducer, mut w1, _) = setup();
        let tile = TileCoord::new(4, 4);
        w1.spawn_entity(&mut reducer, HERO, tile).unwrap();
        reducer.unregister_world(W1).unwrap();
        assert_eq!(
            w1.move_entity(&mut reducer, HERO, tile, TileCoord::new(4, 5)),
            Err(MultiverseError::EntityNotInWorld { entity: HERO })
        );
        assert!(matches!(
            w1.create_portal(&mut reducer, WorldId(1), tile, tile, WorldId(2)),
            Err(MultiverseError::InvalidWorldId { .. })
        ));
    }
}
