//! Command definitions and the source → target permission matrix.
//!
//! Entity types are the issuing contract addresses. [`WILDCARD`] (the zero
//! address) on one side of a key means "any type" on that side. A check tries,
//! in order, the exact pair, the wildcard-source pair and the wildcard-target
//! pair. A both-wildcard entry is never looked up on its own account.

use std::collections::HashMap;

use multiverse_core::{Address, CommandId, OrderedSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::CommandDefinition;

/// "Any entity type".
pub const WILDCARD: Address = Address::ZERO;

/// Typed key of one permission-matrix cell, ordered `(source, target)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionKey {
    /// Acting entity type.
    pub source_type: Address,
    /// Target entity type.
    pub target_type: Address,
}

impl PermissionKey {
    /// Construct a key.
    pub const fn new(source_type: Address, target_type: Address) -> Self {
        Self {
            source_type,
            target_type,
        }
    }

    /// The three keys consulted for a concrete pair, in lookup order.
    pub const fn lookup_chain(source_type: Address, target_type: Address) -> [Self; 3] {
        [
            Self::new(source_type, target_type),
            Self::new(WILDCARD, target_type),
            Self::new(source_type, WILDCARD),
        ]
    }
}

/// Registered commands plus the permission matrix.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: HashMap<CommandId, CommandDefinition>,
    permissions: HashMap<PermissionKey, OrderedSet<CommandId>>,
}

impl CommandRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `definition`, replacing any previous one with the same id.
    pub fn register_command(&mut self, definition: CommandDefinition) -> Option<CommandDefinition> {
        debug!(
            command = definition.id.0,
            cooldown = definition.cooldown,
            duration = definition.duration,
            "command registered"
        );
        self.commands.insert(definition.id, definition)
    }

    /// Definition of `command`.
    pub fn command(&self, command: CommandId) -> Option<&CommandDefinition> {
        self.commands.get(&command)
    }

    /// Registered command ids, ascending.
    pub fn command_ids(&self) -> Vec<CommandId> {
        let mut ids: Vec<_> = self.commands.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Permit `command` from `source_type` to `target_type`. Either side may be
    /// [`WILDCARD`]. Returns false if already permitted.
    pub fn allow_command(
        &mut self,
        source_type: Address,
        target_type: Address,
        command: CommandId,
    ) -> bool {
        self.permissions
            .entry(PermissionKey::new(source_type, target_type))
            .or_default()
            .insert(command)
    }

    /// Revoke an exact matrix entry. Returns false if it was absent.
    pub fn disallow_command(
        &mut self,
        source_type: Address,
        target_type: Address,
        command: CommandId,
    ) -> bool {
        let key = PermissionKey::new(source_type, target_type);
        let Some(allowed) = self.permissions.get_mut(&key) else {
            return false;
        };
        let removed = allowed.remove(&command);
        if allowed.is_empty() {
            self.permissions.remove(&key);
        }
        removed
    }

    /// Three-way permission check.
    pub fn is_command_allowed(
        &self,
        source_type: Address,
        target_type: Address,
        command: CommandId,
    ) -> bool {
        PermissionKey::lookup_chain(source_type, target_type)
            .iter()
            .any(|key| {
                self.permissions
                    .get(key)
                    .is_some_and(|allowed| allowed.contains(&command))
            })
    }

    /// Paginated commands of one exact matrix cell.
    pub fn allowed_commands(
        &self,
        source_type: Address,
        target_type: Address,
        start: usize,
        count: usize,
    ) -> Vec<CommandId> {
        self.permissions
            .get(&PermissionKey::new(source_type, target_type))
            .map(|allowed| allowed.page(start, count))
            .unwrap_or_default()
    }
}
