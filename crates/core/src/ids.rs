//! Portal and command identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Portal identifier, allocated per world starting at 1.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PortalId(pub u64);

impl PortalId {
    /// Never assigned; the "not found" answer of tile lookups.
    pub const NONE: Self = Self(0);

    /// Returns true for [`PortalId::NONE`].
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for PortalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "portal:{}", self.0)
    }
}

/// Command identifier chosen by whoever registers the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommandId(pub u64);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "command:{}", self.0)
    }
}
