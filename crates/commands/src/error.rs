use multiverse_core::{CommandId, MultiverseError};
use thiserror::Error;

/// Failure of a command execution.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Rejected by the engine before the handler ran.
    #[error(transparent)]
    Rejected(#[from] MultiverseError),
    /// Handler returned an error; timers were rolled back.
    #[error("handler for {command} failed: {reason:#}")]
    HandlerFailed {
        /// Command whose handler failed.
        command: CommandId,
        /// Error reported by the handler.
        reason: anyhow::Error,
    },
}

impl CommandError {
    /// The engine rejection, if this is one.
    pub fn rejection(&self) -> Option<&MultiverseError> {
        match self {
            Self::Rejected(err) => Some(err),
            Self::HandlerFailed { .. } => None,
        }
    }
}
