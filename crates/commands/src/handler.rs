//! Command implementations plug in through [`CommandHandler`].
//!
//! The engine commits its own cooldown and lock state before calling a
//! handler, and never re-checks after the call returns. A handler that fails
//! aborts the whole execution.

use std::fmt;

use anyhow::bail;
use multiverse_core::{CommandId, EntityRef, WorldId};
use serde::{Deserialize, Serialize};

/// Which handler entry point an invocation is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandShape {
    /// Source and target are the same entity.
    SelfTarget,
    /// Source acts on a different entity on its tile.
    Entity,
    /// Target is the empty entity; the command acts on the source's world.
    World,
}

impl CommandShape {
    /// Classify an invocation by its target.
    pub fn classify(source: EntityRef, target: EntityRef) -> Self {
        if target.is_none() {
            Self::World
        } else if source == target {
            Self::SelfTarget
        } else {
            Self::Entity
        }
    }
}

impl fmt::Display for CommandShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SelfTarget => "self",
            Self::Entity => "entity",
            Self::World => "world",
        })
    }
}

/// Effect implementation of one or more commands.
///
/// Implement the entry points for the shapes the command supports; the others
/// reject the invocation.
pub trait CommandHandler {
    /// `entity` acts on itself.
    fn execute_self(
        &self,
        command: CommandId,
        entity: EntityRef,
        data: &[u8],
    ) -> anyhow::Result<()> {
        let _ = (entity, data);
        bail!("{command} has no {} handler", CommandShape::SelfTarget)
    }

    /// `entity` acts on `target`, which shares its tile.
    fn execute_on_entity(
        &self,
        command: CommandId,
        entity: EntityRef,
        target: EntityRef,
        data: &[u8],
    ) -> anyhow::Result<()> {
        let _ = (entity, target, data);
        bail!("{command} has no {} handler", CommandShape::Entity)
    }

    /// `entity` acts on `world`, the world it is located in.
    fn execute_on_world(
        &self,
        command: CommandId,
        entity: EntityRef,
        world: WorldId,
        data: &[u8],
    ) -> anyhow::Result<()> {
        let _ = (entity, world, data);
        bail!("{command} has no {} handler", CommandShape::World)
    }
}
