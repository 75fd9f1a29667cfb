#![warn(missing_docs)]
//! Entity–world ownership protocol and the spatial world model.

mod datastore;
mod game_world;
mod portal;
mod reducer;
mod registry;
mod spawn;

pub use datastore::*;
pub use game_world::*;
pub use portal::Portal;
pub use reducer::*;
pub use registry::*;
pub use spawn::*;
