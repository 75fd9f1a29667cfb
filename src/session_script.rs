use anyhow::{Context, Result};
use multiverse_commands::{
    CommandDefinition, CommandHandler, CommandInvocation, CommandMetadata,
};
use multiverse_core::{
    Address, CommandId, EntityRef, PortalId, SimTick, TileCoord, WorldId,
};
use multiverse_server::Multiverse;
use serde::Deserialize;
use std::{collections::VecDeque, fs, path::Path, sync::Arc};
use tracing::info;

#[derive(Debug, Deserialize)]
struct SessionScriptFile {
    #[serde(default)]
    name: Option<String>,
    steps: Vec<SessionStep>,
}

/// One scheduled host call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionStep {
    pub tick: u64,
    pub caller: Address,
    #[serde(flatten)]
    pub op: SessionOp,
}

/// Host operations a script can schedule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SessionOp {
    CreateSquareWorld {
        handle: Address,
        #[serde(default)]
        size: Option<u64>,
    },
    CreateSingleTileWorld {
        handle: Address,
    },
    RetireWorld {
        handle: Address,
    },
    AddSpawnWorld {
        world: WorldId,
    },
    RemoveSpawnWorld {
        world: WorldId,
    },
    /// Issue the next entity of `contract` to `owner`.
    Mint {
        contract: Address,
        owner: Address,
    },
    Spawn {
        world: WorldId,
        entity: EntityRef,
        tile: TileCoord,
    },
    Move {
        entity: EntityRef,
        from: TileCoord,
        to: TileCoord,
    },
    EnterPortal {
        entity: EntityRef,
        portal: PortalId,
    },
    Arrive {
        entity: EntityRef,
        tile: TileCoord,
    },
    Despawn {
        entity: EntityRef,
    },
    CreatePortal {
        world: WorldId,
        source: TileCoord,
        target: TileCoord,
        target_world: WorldId,
    },
    RemovePortal {
        world: WorldId,
        portal: PortalId,
    },
    /// Register a command backed by [`LoggedHandler`].
    RegisterCommand {
        command: CommandId,
        #[serde(default)]
        cooldown: u64,
        #[serde(default)]
        duration: u64,
        #[serde(default)]
        metadata: CommandMetadata,
    },
    AllowCommand {
        source_type: Address,
        target_type: Address,
        command: CommandId,
    },
    DisallowCommand {
        source_type: Address,
        target_type: Address,
        command: CommandId,
    },
    Execute(CommandInvocation),
}

/// Deterministic session script.
///
/// Steps are `{tick, caller, op, ...}` objects sorted by tick and executed in
/// file order once the host clock reaches their tick.
#[derive(Debug)]
pub struct SessionScript {
    name: String,
    pending: VecDeque<SessionStep>,
    last_tick: SimTick,
}

impl SessionScript {
    /// Load a script from a JSON file on disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read session script {}", path.display()))?;
        Self::from_json(&contents)
    }

    /// Load a script from an in-memory JSON string.
    pub fn from_json(contents: &str) -> Result<Self> {
        let file: SessionScriptFile = serde_json::from_str(contents)?;
        if file.steps.is_empty() {
            anyhow::bail!("session script contains no steps");
        }
        if file.steps.windows(2).any(|pair| pair[1].tick < pair[0].tick) {
            anyhow::bail!("session script steps must be sorted by tick");
        }
        let last_tick = SimTick(file.steps.last().map_or(0, |step| step.tick));
        Ok(Self {
            name: file.name.unwrap_or_else(|| "session".to_string()),
            pending: file.steps.into(),
            last_tick,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tick of the final step.
    pub fn last_tick(&self) -> SimTick {
        self.last_tick
    }

    /// Drain and return all steps scheduled for ticks `<= tick`.
    pub fn drain_ready_steps(&mut self, tick: SimTick) -> Vec<SessionStep> {
        let ready = self
            .pending
            .iter()
            .take_while(|step| SimTick(step.tick) <= tick)
            .count();
        self.pending.drain(..ready).collect()
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Handler for script-registered commands: accepts every shape and logs it.
#[derive(Debug, Default)]
pub struct LoggedHandler;

impl CommandHandler for LoggedHandler {
    fn execute_self(&self, command: CommandId, entity: EntityRef, data: &[u8]) -> Result<()> {
        info!(%command, %entity, bytes = data.len(), "self command");
        Ok(())
    }

    fn execute_on_entity(
        &self,
        command: CommandId,
        entity: EntityRef,
        target: EntityRef,
        data: &[u8],
    ) -> Result<()> {
        info!(%command, %entity, %target, bytes = data.len(), "entity command");
        Ok(())
    }

    fn execute_on_world(
        &self,
        command: CommandId,
        entity: EntityRef,
        world: WorldId,
        data: &[u8],
    ) -> Result<()> {
        info!(%command, %entity, %world, bytes = data.len(), "world command");
        Ok(())
    }
}

/// Apply one step to the host. Rejections come back as errors.
pub fn apply_step(host: &mut Multiverse, step: &SessionStep, default_size: u64) -> Result<()> {
    let caller = step.caller;
    match &step.op {
        SessionOp::CreateSquareWorld { handle, size } => {
            host.create_square_world(caller, *handle, size.unwrap_or(default_size))?;
        }
        SessionOp::CreateSingleTileWorld { handle } => {
            host.create_single_tile_world(caller, *handle)?;
        }
        SessionOp::RetireWorld { handle } => {
            host.retire_world(caller, *handle)?;
        }
        SessionOp::AddSpawnWorld { world } => {
            host.add_spawn_world(caller, *world)?;
        }
        SessionOp::RemoveSpawnWorld { world } => {
            host.remove_spawn_world(caller, *world)?;
        }
        SessionOp::Mint { contract, owner } => {
            let entity = host.ownership_mut().mint(*contract, *owner)?;
            info!(%entity, %owner, "minted");
        }
        SessionOp::Spawn {
            world,
            entity,
            tile,
        } => host.spawn(caller, *world, *entity, *tile)?,
        SessionOp::Move { entity, from, to } => {
            host.move_within_world(caller, *entity, *from, *to)?
        }
        SessionOp::EnterPortal { entity, portal } => host.enter_portal(caller, *entity, *portal)?,
        SessionOp::Arrive { entity, tile } => host.arrive_from_portal(caller, *entity, *tile)?,
        SessionOp::Despawn { entity } => host.despawn(caller, *entity)?,
        SessionOp::CreatePortal {
            world,
            source,
            target,
            target_world,
        } => {
            host.create_portal(caller, *world, *source, *target, *target_world)?;
        }
        SessionOp::RemovePortal { world, portal } => {
            host.remove_portal(caller, *world, *portal)?;
        }
        SessionOp::RegisterCommand {
            command,
            cooldown,
            duration,
            metadata,
        } => {
            let definition =
                CommandDefinition::new(*command, *cooldown, *duration, Arc::new(LoggedHandler))
                    .with_metadata(metadata.clone());
            host.register_command(caller, definition)?;
        }
        SessionOp::AllowCommand {
            source_type,
            target_type,
            command,
        } => {
            host.allow_command(caller, *source_type, *target_type, *command)?;
        }
        SessionOp::DisallowCommand {
            source_type,
            target_type,
            command,
        } => {
            host.disallow_command(caller, *source_type, *target_type, *command)?;
        }
        SessionOp::Execute(invocation) => {
            host.execute_command(caller, invocation)?;
        }
    }
    Ok(())
}
