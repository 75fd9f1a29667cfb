//! Caller identities.
//!
//! An [`Address`] names anything that can invoke an operation: a world (its
//! handle doubles as its caller identity), a player account, an admin, or the
//! contract that issues a family of entities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity of a caller, a world handle or an entity contract.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Address(pub u64);

impl Address {
    /// The zero address. Used as the wildcard entity type and the null contract.
    pub const ZERO: Self = Self(0);

    /// Returns true for [`Address::ZERO`].
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}
