//! World identifiers.
//!
//! Worlds receive sequential ids from the world registry starting at 1. The id
//! 0 is reserved: an entity whose stored location is [`WorldId::NONE`] is not
//! spawned anywhere.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable numeric identifier of a registered world.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct WorldId(pub u64);

impl WorldId {
    /// "No world": unspawned or despawned.
    pub const NONE: Self = Self(0);

    /// First id handed out by the registry.
    pub const FIRST: Self = Self(1);

    /// Returns true for [`WorldId::NONE`].
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Next sequential id.
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "world:none")
        } else {
            write!(f, "world:{}", self.0)
        }
    }
}
