#![warn(missing_docs)]
//! Authoritative host: worlds, ownership, roles and commands behind one
//! sequential ledger.

mod access;
mod host;
mod ownership;

pub use access::RoleTable;
pub use host::{Multiverse, WorldKind, WorldSpec};
pub use multiverse_core::AllowAll;
pub use ownership::OwnershipLedger;
