//! Cooldown, duration lock and dispatch behaviour of the executor.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use multiverse_commands::{
    CommandDefinition, CommandError, CommandExecutor, CommandEnvironment, CommandHandler,
    CommandInvocation, CommandShape, WILDCARD,
};
use multiverse_core::{Address, CommandId, EntityRef, MultiverseError, SimTick, TileCoord, WorldId};
use proptest::prelude::*;

const PLAYER: Address = Address(0x100);
const STRANGER: Address = Address(0x200);
const TYPE_A: Address = Address(0xa);
const TYPE_B: Address = Address(0xb);
const STRIKE: CommandId = CommandId(7);

#[derive(Default)]
struct Env {
    owners: HashMap<EntityRef, Address>,
    places: HashMap<EntityRef, (WorldId, TileCoord)>,
}

impl Env {
    fn place(&mut self, entity: EntityRef, world: u64, tile: TileCoord) {
        self.owners.insert(entity, PLAYER);
        self.places.insert(entity, (WorldId(world), tile));
    }
}

impl CommandEnvironment for Env {
    fn owner_of(&self, entity: EntityRef) -> Option<Address> {
        self.owners.get(&entity).copied()
    }

    fn world_of(&self, entity: EntityRef) -> WorldId {
        self.places
            .get(&entity)
            .map(|(world, _)| *world)
            .unwrap_or(WorldId::NONE)
    }

    fn share_tile(&self, world: WorldId, a: EntityRef, b: EntityRef) -> bool {
        match (self.places.get(&a), self.places.get(&b)) {
            (Some(pa), Some(pb)) => pa.0 == world && pa == pb,
            _ => false,
        }
    }
}

#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<(CommandShape, EntityRef, EntityRef, WorldId, Vec<u8>)>>,
    fail: bool,
}

impl Recorder {
    fn record(
        &self,
        shape: CommandShape,
        source: EntityRef,
        target: EntityRef,
        world: WorldId,
        data: &[u8],
    ) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("target resisted");
        }
        self.calls
            .lock()
            .unwrap()
            .push((shape, source, target, world, data.to_vec()));
        Ok(())
    }
}

impl CommandHandler for Recorder {
    fn execute_self(&self, _: CommandId, entity: EntityRef, data: &[u8]) -> anyhow::Result<()> {
        self.record(CommandShape::SelfTarget, entity, entity, WorldId::NONE, data)
    }

    fn execute_on_entity(
        &self,
        _: CommandId,
        entity: EntityRef,
        target: EntityRef,
        data: &[u8],
    ) -> anyhow::Result<()> {
        self.record(CommandShape::Entity, entity, target, WorldId::NONE, data)
    }

    fn execute_on_world(
        &self,
        _: CommandId,
        entity: EntityRef,
        world: WorldId,
        data: &[u8],
    ) -> anyhow::Result<()> {
        self.record(CommandShape::World, entity, EntityRef::NONE, world, data)
    }
}

fn a() -> EntityRef {
    EntityRef::new(TYPE_A, 1)
}

fn b() -> EntityRef {
    EntityRef::new(TYPE_B, 1)
}

fn setup(cooldown: u64, duration: u64, handler: Arc<Recorder>) -> (CommandExecutor, Env) {
    let mut executor = CommandExecutor::new();
    executor
        .registry_mut()
        .register_command(CommandDefinition::new(STRIKE, cooldown, duration, handler));
    executor.registry_mut().allow_command(TYPE_A, TYPE_B, STRIKE);
    let mut env = Env::default();
    let tile = TileCoord::new(4, 4);
    env.place(a(), 1, tile);
    env.place(b(), 1, tile);
    (executor, env)
}

fn rejection(result: Result<impl std::fmt::Debug, CommandError>) -> MultiverseError {
    match result {
        Err(CommandError::Rejected(err)) => err,
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[test]
fn cooldown_scenario() {
    let recorder = Arc::new(Recorder::default());
    let (mut executor, env) = setup(10, 0, recorder.clone());
    let strike = CommandInvocation::new(STRIKE, a(), b());

    let receipt = executor
        .execute_command(&env, PLAYER, SimTick(0), &strike)
        .unwrap();
    assert_eq!(receipt.shape, CommandShape::Entity);
    assert_eq!(receipt.locked_until, None);

    assert_eq!(
        rejection(executor.execute_command(&env, PLAYER, SimTick(0), &strike)),
        MultiverseError::CommandOnCooldown {
            entity: a(),
            command: STRIKE,
            ready_at: SimTick(10),
        }
    );
    assert!(executor
        .execute_command(&env, PLAYER, SimTick(9), &strike)
        .is_err());
    executor
        .execute_command(&env, PLAYER, SimTick(10), &strike)
        .unwrap();
    assert_eq!(executor.last_executed(a(), STRIKE), Some(SimTick(10)));
    assert_eq!(recorder.calls.lock().unwrap().len(), 2);
}

#[test]
fn duration_lock_blocks_every_command_until_expiry() {
    let recorder = Arc::new(Recorder::default());
    let (mut executor, env) = setup(0, 5, recorder.clone());
    executor.registry_mut().register_command(CommandDefinition::new(
        CommandId(8),
        0,
        0,
        recorder.clone(),
    ));
    executor
        .registry_mut()
        .allow_command(TYPE_A, TYPE_A, CommandId(8));

    executor
        .execute_command(&env, PLAYER, SimTick(3), &CommandInvocation::new(STRIKE, a(), b()))
        .unwrap();
    assert_eq!(executor.duration_lock_until(a()), Some(SimTick(8)));

    let other = CommandInvocation::new(CommandId(8), a(), a());
    assert_eq!(
        rejection(executor.execute_command(&env, PLAYER, SimTick(7), &other)),
        MultiverseError::EntityDurationLocked {
            entity: a(),
            until: SimTick(8),
        }
    );
    executor
        .execute_command(&env, PLAYER, SimTick(8), &other)
        .unwrap();
    // A zero-duration command clears the expired lock.
    assert_eq!(executor.duration_lock_until(a()), None);
}

#[test]
fn zero_duration_never_locks() {
    let recorder = Arc::new(Recorder::default());
    let (mut executor, env) = setup(0, 0, recorder);
    let strike = CommandInvocation::new(STRIKE, a(), b());
    for tick in 0..3 {
        executor
            .execute_command(&env, PLAYER, SimTick(tick), &strike)
            .unwrap();
        assert_eq!(executor.duration_lock_until(a()), None);
    }
}

#[test]
fn ownership_and_existence_are_checked_first() {
    let recorder = Arc::new(Recorder::default());
    let (mut executor, env) = setup(0, 0, recorder);
    assert_eq!(
        rejection(executor.execute_command(
            &env,
            STRANGER,
            SimTick(0),
            &CommandInvocation::new(STRIKE, a(), b())
        )),
        MultiverseError::NotOwner {
            caller: STRANGER,
            entity: a(),
        }
    );
    assert_eq!(
        rejection(executor.execute_command(
            &env,
            PLAYER,
            SimTick(0),
            &CommandInvocation::new(CommandId(99), a(), b())
        )),
        MultiverseError::CommandNotFound {
            command: CommandId(99)
        }
    );
}

#[test]
fn permission_matrix_gates_type_pairs() {
    let recorder = Arc::new(Recorder::default());
    let (mut executor, env) = setup(0, 0, recorder);
    assert_eq!(
        rejection(executor.execute_command(
            &env,
            PLAYER,
            SimTick(0),
            &CommandInvocation::new(STRIKE, b(), a())
        )),
        MultiverseError::CommandNotUsableByEntity {
            command: STRIKE,
            source_type: TYPE_B,
            target_type: TYPE_A,
        }
    );

    executor.registry_mut().allow_command(WILDCARD, TYPE_A, STRIKE);
    executor
        .execute_command(&env, PLAYER, SimTick(0), &CommandInvocation::new(STRIKE, b(), a()))
        .unwrap();
}

#[test]
fn world_command_uses_wildcard_target_entry() {
    let recorder = Arc::new(Recorder::default());
    let (mut executor, env) = setup(0, 0, recorder.clone());
    let shout = CommandInvocation::on_world(STRIKE, a()).with_data(*b"loud");
    assert!(executor
        .execute_command(&env, PLAYER, SimTick(0), &shout)
        .is_err());

    executor.registry_mut().allow_command(TYPE_A, WILDCARD, STRIKE);
    let receipt = executor
        .execute_command(&env, PLAYER, SimTick(0), &shout)
        .unwrap();
    assert_eq!(receipt.shape, CommandShape::World);
    assert_eq!(
        recorder.calls.lock().unwrap()[0],
        (
            CommandShape::World,
            a(),
            EntityRef::NONE,
            WorldId(1),
            b"loud".to_vec()
        )
    );
}

#[test]
fn entity_commands_need_a_shared_world_and_tile() {
    let recorder = Arc::new(Recorder::default());
    let (mut executor, mut env) = setup(0, 0, recorder);
    let strike = CommandInvocation::new(STRIKE, a(), b());

    env.place(b(), 1, TileCoord::new(5, 4));
    assert_eq!(
        rejection(executor.execute_command(&env, PLAYER, SimTick(0), &strike)),
        MultiverseError::EntitiesNotInSameTile {
            source_entity: a(),
            target_entity: b(),
        }
    );

    env.place(b(), 2, TileCoord::new(4, 4));
    assert_eq!(
        rejection(executor.execute_command(&env, PLAYER, SimTick(0), &strike)),
        MultiverseError::EntitiesNotInSameWorld {
            source_entity: a(),
            target_entity: b(),
        }
    );
    assert_eq!(executor.last_executed(a(), STRIKE), None);
}

#[test]
fn handler_failure_restores_timers() {
    let recorder = Arc::new(Recorder {
        fail: true,
        ..Recorder::default()
    });
    let (mut executor, env) = setup(10, 4, recorder);
    let err = executor
        .execute_command(&env, PLAYER, SimTick(2), &CommandInvocation::new(STRIKE, a(), b()))
        .unwrap_err();
    assert!(matches!(err, CommandError::HandlerFailed { command, .. } if command == STRIKE));
    assert!(err.to_string().contains("target resisted"));
    assert_eq!(executor.last_executed(a(), STRIKE), None);
    assert_eq!(executor.duration_lock_until(a()), None);
}

proptest! {
    #[test]
    fn cooldown_boundary_is_exact(t0 in 0u64..1_000_000, cooldown in 1u64..10_000) {
        let recorder = Arc::new(Recorder::default());
        let (mut executor, env) = setup(cooldown, 0, recorder);
        let strike = CommandInvocation::new(STRIKE, a(), b());
        executor.execute_command(&env, PLAYER, SimTick(t0), &strike).unwrap();
        let early = executor.execute_command(&env, PLAYER, SimTick(t0 + cooldown - 1), &strike);
        let is_cooldown = matches!(
            early,
            Err(CommandError::Rejected(MultiverseError::CommandOnCooldown { .. }))
        );
        prop_assert!(is_cooldown);
        prop_assert!(executor
            .execute_command(&env, PLAYER, SimTick(t0 + cooldown), &strike)
            .is_ok());
    }
}
