#![warn(missing_docs)]
//! Command engine: definitions, the entity-type permission matrix, per-entity
//! cooldown and duration timers, and dispatch to pluggable handlers.

mod definition;
mod error;
mod executor;
mod handler;
pub mod registry;

pub use definition::{CommandDefinition, CommandMetadata};
pub use error::CommandError;
pub use executor::{
    CommandEnvironment, CommandExecutor, CommandInvocation, CommandKey, CommandReceipt,
};
pub use handler::{CommandHandler, CommandShape};
pub use registry::{CommandRegistry, PermissionKey, WILDCARD};
