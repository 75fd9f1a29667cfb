//! End-to-end journey of one entity: spawn, walk, portal out, arrive.

use multiverse_core::{Address, EntityRef, MultiverseEvent, PortalId, TileCoord, WorldId};
use multiverse_world::{EntityState, EntityWorldReducer, GameWorld, DEFAULT_WORLD_SIZE};

const W1: Address = Address(0x51);
const W2: Address = Address(0x52);

fn hero() -> EntityRef {
    EntityRef::new(Address(0xfeed), 7)
}

#[test]
fn spawn_walk_and_leave_through_portal() {
    let mut reducer = EntityWorldReducer::new();
    let w1_id = reducer.register_world(W1).unwrap();
    let w2_id = reducer.register_world(W2).unwrap();
    reducer.add_valid_spawn_world(w1_id);

    let mut w1 = GameWorld::square(W1, DEFAULT_WORLD_SIZE);
    let mut w2 = GameWorld::square(W2, DEFAULT_WORLD_SIZE);

    let start = TileCoord::new(50, 50);
    w1.spawn_entity(&mut reducer, hero(), start).unwrap();
    assert_eq!(
        w1.entity_state(&reducer, hero()),
        EntityState {
            tile: start,
            world: w1_id,
            active: true,
        }
    );

    let step = TileCoord::new(51, 50);
    w1.move_entity(&mut reducer, hero(), start, step).unwrap();
    let state = w1.entity_state(&reducer, hero());
    assert_eq!(state.tile, step);
    assert_eq!(state.world, w1_id);

    let portal = w1
        .create_portal(&mut reducer, w1_id, step, TileCoord::new(0, 0), w2_id)
        .unwrap();
    assert_eq!(portal, PortalId(1));
    w1.transfer_entity_through_portal(&mut reducer, hero(), portal)
        .unwrap();

    assert!(!w1.entity_state(&reducer, hero()).active);
    assert_eq!(reducer.world_of(hero()), w2_id);
    assert!(!w2.entity_state(&reducer, hero()).active);

    let target = w1.portal(portal).unwrap().target_tile;
    w2.receive_entity(&mut reducer, hero(), target).unwrap();
    assert!(w2.is_entity_in_tile(hero(), target));

    let kinds: Vec<&str> = reducer
        .events_mut()
        .drain()
        .iter()
        .map(|stamped| stamped.event.kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            "world_registered",
            "world_registered",
            "spawn_world_added",
            "entity_world_changed",
            "entity_spawned",
            "entity_moved",
            "portal_created",
            "entity_world_changed",
            "entity_transferred",
            "entity_arrived",
        ]
    );
}

#[test]
fn transfer_event_records_both_worlds() {
    let mut reducer = EntityWorldReducer::new();
    let w1_id = reducer.register_world(W1).unwrap();
    let w2_id = reducer.register_world(W2).unwrap();
    reducer.add_valid_spawn_world(w1_id);
    let mut w1 = GameWorld::square(W1, 10);
    let tile = TileCoord::new(1, 1);
    w1.spawn_entity(&mut reducer, hero(), tile).unwrap();
    let portal = w1
        .create_portal(&mut reducer, w1_id, tile, TileCoord::ORIGIN, w2_id)
        .unwrap();
    reducer.events_mut().drain();

    w1.transfer_entity_through_portal(&mut reducer, hero(), portal)
        .unwrap();
    let events: Vec<_> = reducer
        .events_mut()
        .drain()
        .into_iter()
        .map(|stamped| stamped.event)
        .collect();
    assert_eq!(
        events,
        vec![
            MultiverseEvent::EntityWorldChanged {
                entity: hero(),
                from: w1_id,
                to: w2_id,
            },
            MultiverseEvent::EntityTransferred {
                entity: hero(),
                portal,
                from: w1_id,
                to: w2_id,
            },
        ]
    );
}

#[test]
fn tile_pagination_follows_set_order() {
    let mut reducer = EntityWorldReducer::new();
    let id = reducer.register_world(W1).unwrap();
    reducer.add_valid_spawn_world(id);
    let mut world = GameWorld::square(W1, DEFAULT_WORLD_SIZE);
    let tile = TileCoord::new(3, 3);
    let crowd: Vec<EntityRef> = (1..=3).map(|i| EntityRef::new(Address(0xc0), i)).collect();
    for entity in &crowd {
        world.spawn_entity(&mut reducer, *entity, tile).unwrap();
    }

    assert!(world.entities_in_tile(tile, 10, 5).is_empty());
    assert_eq!(world.entities_in_tile(tile, 0, 2), crowd[..2].to_vec());
    assert_eq!(world.entities_in_tile(tile, 1, 1), vec![crowd[1]]);
    assert!(world.entities_in_tile(TileCoord::new(9, 9), 0, 5).is_empty());

    // Moving the first entity away swaps the last one into its slot.
    world
        .move_entity(&mut reducer, crowd[0], tile, TileCoord::new(3, 4))
        .unwrap();
    assert_eq!(world.entities_in_tile(tile, 0, 5), vec![crowd[2], crowd[1]]);
    assert_eq!(world.world_id(&reducer), WorldId(1));
}
