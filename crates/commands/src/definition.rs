use std::fmt;
use std::sync::Arc;

use multiverse_core::CommandId;
use serde::{Deserialize, Serialize};

use crate::CommandHandler;

/// Descriptive data carried alongside a command. The engine never reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandMetadata {
    /// Short display name.
    pub name: String,
    /// Longer description for tooling.
    pub description: String,
}

/// A registered command: timing rules plus the handler that applies it.
#[derive(Clone)]
pub struct CommandDefinition {
    /// Identifier.
    pub id: CommandId,
    /// Ticks before the same entity may run it again.
    pub cooldown: u64,
    /// Ticks the acting entity is locked out of every command afterwards.
    pub duration: u64,
    /// Effect implementation.
    pub handler: Arc<dyn CommandHandler>,
    /// Descriptive data.
    pub metadata: CommandMetadata,
}

impl CommandDefinition {
    /// Definition with empty metadata.
    pub fn new(
        id: CommandId,
        cooldown: u64,
        duration: u64,
        handler: Arc<dyn CommandHandler>,
    ) -> Self {
        Self {
            id,
            cooldown,
            duration,
            handler,
            metadata: CommandMetadata::default(),
        }
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: CommandMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("id", &self.id)
            .field("cooldown", &self.cooldown)
            .field("duration", &self.duration)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}
