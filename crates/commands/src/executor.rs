//! Command execution: ownership, timers, permissions and dispatch.

use std::collections::HashMap;

use multiverse_core::{
    Address, CommandId, EntityKey, EntityRef, MultiverseError, SimTick, WorldId,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{CommandError, CommandHandler, CommandRegistry, CommandShape};

/// World and ownership facts the executor needs from its host.
pub trait CommandEnvironment {
    /// Holder of the ownership proof for `entity`.
    fn owner_of(&self, entity: EntityRef) -> Option<Address>;

    /// World the entity is recorded in, or [`WorldId::NONE`].
    fn world_of(&self, entity: EntityRef) -> WorldId;

    /// Whether both entities are active on the same tile of `world`.
    fn share_tile(&self, world: WorldId, a: EntityRef, b: EntityRef) -> bool;
}

/// Identity key of one per-entity command timer, ordered `(entity, command)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommandKey {
    /// Acting entity.
    pub entity: EntityKey,
    /// Command.
    pub command: CommandId,
}

impl CommandKey {
    /// Construct a key.
    pub const fn new(entity: EntityRef, command: CommandId) -> Self {
        Self {
            entity: entity.key(),
            command,
        }
    }

    /// Content hash for external indexes and logs.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.entity.digest());
        hasher.update(&self.command.0.to_le_bytes());
        *hasher.finalize().as_bytes()
    }

    /// [`CommandKey::digest`] as lowercase hex.
    pub fn digest_hex(&self) -> String {
        blake3::Hash::from(self.digest()).to_hex().to_string()
    }
}

/// One requested execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInvocation {
    /// Command to run.
    pub command: CommandId,
    /// Acting entity.
    pub source: EntityRef,
    /// Target entity; [`EntityRef::NONE`] addresses the source's world.
    #[serde(default)]
    pub target: EntityRef,
    /// Opaque payload forwarded to the handler.
    #[serde(default)]
    pub data: Vec<u8>,
}

impl CommandInvocation {
    /// `source` acts on `target`.
    pub fn new(command: CommandId, source: EntityRef, target: EntityRef) -> Self {
        Self {
            command,
            source,
            target,
            data: Vec::new(),
        }
    }

    /// `source` acts on its own world.
    pub fn on_world(command: CommandId, source: EntityRef) -> Self {
        Self::new(command, source, EntityRef::NONE)
    }

    /// Attach a payload.
    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = data.into();
        self
    }
}

/// What a successful execution committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandReceipt {
    /// Command executed.
    pub command: CommandId,
    /// Acting entity.
    pub source: EntityRef,
    /// Target entity.
    pub target: EntityRef,
    /// Handler entry point used.
    pub shape: CommandShape,
    /// Execution tick.
    pub executed_at: SimTick,
    /// First tick the same entity may run the command again.
    pub ready_at: SimTick,
    /// Duration lock placed on the source, if any.
    pub locked_until: Option<SimTick>,
}

/// Registry plus the per-entity timers.
#[derive(Debug, Default)]
pub struct CommandExecutor {
    registry: CommandRegistry,
    last_action: HashMap<CommandKey, SimTick>,
    duration_locks: HashMap<EntityKey, SimTick>,
}

impl CommandExecutor {
    /// Executor with an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor around an existing registry.
    pub fn with_registry(registry: CommandRegistry) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    /// Command definitions and permissions.
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Mutable access for registration and permission edits.
    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    /// Run `invocation` at `now` on behalf of `caller`.
    ///
    /// Checks run in a fixed order and the first failure is returned:
    /// ownership, duration lock, existence, permission, cooldown, then the
    /// world and tile checks of entity commands. Timers are committed before
    /// the handler runs and restored if it fails.
    pub fn execute_command(
        &mut self,
        env: &impl CommandEnvironment,
        caller: Address,
        now: SimTick,
        invocation: &CommandInvocation,
    ) -> Result<CommandReceipt, CommandError> {
        let CommandInvocation {
            command,
            source,
            target,
            ref data,
        } = *invocation;

        if env.owner_of(source) != Some(caller) {
            return Err(MultiverseError::NotOwner {
                caller,
                entity: source,
            }
            .into());
        }

        if let Some(until) = self.duration_lock_until(source) {
            if now < until {
                return Err(MultiverseError::EntityDurationLocked {
                    entity: source,
                    until,
                }
                .into());
            }
        }

        let definition = self
            .registry
            .command(command)
            .ok_or(MultiverseError::CommandNotFound { command })?;
        let (cooldown, duration) = (definition.cooldown, definition.duration);
        let handler = definition.handler.clone();

        if !self
            .registry
            .is_command_allowed(source.entity_type(), target.entity_type(), command)
        {
            return Err(MultiverseError::CommandNotUsableByEntity {
                command,
                source_type: source.entity_type(),
                target_type: target.entity_type(),
            }
            .into());
        }

        let key = CommandKey::new(source, command);
        if let Some(last) = self.last_action.get(&key) {
            let ready_at = last.advance(cooldown);
            if now < ready_at {
                return Err(MultiverseError::CommandOnCooldown {
                    entity: source,
                    command,
                    ready_at,
                }
                .into());
            }
        }

        let shape = CommandShape::classify(source, target);
        let world = env.world_of(source);
        if shape == CommandShape::Entity {
            if env.world_of(target) != world {
                return Err(MultiverseError::EntitiesNotInSameWorld {
                    source_entity: source,
                    target_entity: target,
                }
                .into());
            }
            if !env.share_tile(world, source, target) {
                return Err(MultiverseError::EntitiesNotInSameTile {
                    source_entity: source,
                    target_entity: target,
                }
                .into());
            }
        }

        let previous_last = self.last_action.insert(key, now);
        let locked_until = (duration > 0).then(|| now.advance(duration));
        let previous_lock = match locked_until {
            Some(until) => self.duration_locks.insert(source.key(), until),
            None => self.duration_locks.remove(&source.key()),
        };

        if let Err(reason) = dispatch(handler.as_ref(), shape, command, source, target, world, data)
        {
            warn!(command = command.0, %source, error = %reason, "command handler failed");
            match previous_last {
                Some(last) => self.last_action.insert(key, last),
                None => self.last_action.remove(&key),
            };
            match previous_lock {
                Some(until) => self.duration_locks.insert(source.key(), until),
                None => self.duration_locks.remove(&source.key()),
            };
            return Err(CommandError::HandlerFailed { command, reason });
        }

        debug!(
            command = command.0,
            key = %key.digest_hex(),
            %source,
            %target,
            %shape,
            tick = now.0,
            "command executed"
        );
        Ok(CommandReceipt {
            command,
            source,
            target,
            shape,
            executed_at: now,
            ready_at: now.advance(cooldown),
            locked_until,
        })
    }

    /// Tick of the entity's last successful run of `command`.
    pub fn last_executed(&self, entity: EntityRef, command: CommandId) -> Option<SimTick> {
        self.last_action
            .get(&CommandKey::new(entity, command))
            .copied()
    }

    /// End of the entity's duration lock, expired or not.
    pub fn duration_lock_until(&self, entity: EntityRef) -> Option<SimTick> {
        self.duration_locks.get(&entity.key()).copied()
    }

    /// Ticks until `entity` may run `command` again. Zero when ready or unknown.
    pub fn cooldown_remaining(&self, entity: EntityRef, command: CommandId, now: SimTick) -> u64 {
        let Some(definition) = self.registry.command(command) else {
            return 0;
        };
        self.last_executed(entity, command)
            .map(|last| last.advance(definition.cooldown).0.saturating_sub(now.0))
            .unwrap_or(0)
    }
}

fn dispatch(
    handler: &dyn CommandHandler,
    shape: CommandShape,
    command: CommandId,
    source: EntityRef,
    target: EntityRef,
    world: WorldId,
    data: &[u8],
) -> anyhow::Result<()> {
    match shape {
        CommandShape::SelfTarget => handler.execute_self(command, source, data),
        CommandShape::Entity => handler.execute_on_entity(command, source, target, data),
        CommandShape::World => handler.execute_on_world(command, source, world, data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CommandDefinition;
    use std::sync::Arc;

    const PLAYER: Address = Address(0x1);
    const HERO_TYPE: Address = Address(0xa);

    struct Env;

    impl CommandEnvironment for Env {
        fn owner_of(&self, _entity: EntityRef) -> Option<Address> {
            Some(PLAYER)
        }

        fn world_of(&self, _entity: EntityRef) -> WorldId {
            WorldId(1)
        }

        fn share_tile(&self, _world: WorldId, _a: EntityRef, _b: EntityRef) -> bool {
            true
        }
    }

    struct Noop;
    impl CommandHandler for Noop {
        fn execute_self(&self, _: CommandId, _: EntityRef, _: &[u8]) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn executor(cooldown: u64, duration: u64) -> CommandExecutor {
        let mut executor = CommandExecutor::new();
        let registry = executor.registry_mut();
        registry.register_command(CommandDefinition::new(
            CommandId(1),
            cooldown,
            duration,
            Arc::new(Noop),
        ));
        registry.allow_command(HERO_TYPE, HERO_TYPE, CommandId(1));
        executor
    }

    #[test]
    fn receipt_reports_timers() {
        let mut executor = executor(5, 2);
        let hero = EntityRef::new(HERO_TYPE, 1);
        let receipt = executor
            .execute_command(
                &Env,
                PLAYER,
                SimTick(10),
                &CommandInvocation::new(CommandId(1), hero, hero),
            )
            .unwrap();
        assert_eq!(receipt.shape, CommandShape::SelfTarget);
        assert_eq!(receipt.ready_at, SimTick(15));
        assert_eq!(receipt.locked_until, Some(SimTick(12)));
        assert_eq!(executor.cooldown_remaining(hero, CommandId(1), SimTick(11)), 4);
        assert_eq!(executor.cooldown_remaining(hero, CommandId(1), SimTick(20)), 0);
    }

    #[test]
    fn command_key_digest_separates_commands() {
        let hero = EntityRef::new(HERO_TYPE, 1);
        assert_ne!(
            CommandKey::new(hero, CommandId(1)).digest(),
            CommandKey::new(hero, CommandId(2)).digest()
        );
        assert_eq!(
            CommandKey::new(hero, CommandId(1)).digest(),
            CommandKey::new(hero, CommandId(1)).digest()
        );
        assert_eq!(CommandKey::new(hero, CommandId(1)).digest_hex().len(), 64);
    }

    #[test]
    fn with_registry_starts_with_fresh_timers() {
        let mut registry = CommandRegistry::new();
        registry.register_command(CommandDefinition::new(CommandId(3), 4, 0, Arc::new(Noop)));
        registry.allow_command(HERO_TYPE, HERO_TYPE, CommandId(3));
        let mut executor = CommandExecutor::with_registry(registry);
        assert_eq!(executor.registry().command_ids(), vec![CommandId(3)]);

        let hero = EntityRef::new(HERO_TYPE, 1);
        assert_eq!(executor.last_executed(hero, CommandId(3)), None);
        let run = CommandInvocation::new(CommandId(3), hero, hero);
        executor.execute_command(&Env, PLAYER, SimTick(0), &run).unwrap();
        assert_eq!(executor.cooldown_remaining(hero, CommandId(3), SimTick(1)), 3);
    }
}
