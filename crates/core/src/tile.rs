//! Tile coordinates and their packed 256-bit form.
//!
//! Layout of a [`PackedTile`] (little-endian 64-bit limbs):
//!
//! | limb | bits      | field               |
//! |------|-----------|---------------------|
//! | 0    | 0..64     | `x` (two's complement) |
//! | 1    | 64..128   | `y` (two's complement) |
//! | 2..4 | 128..256  | `z` (two's complement) |
//!
//! Packing is a pure reinterpretation of bits, so every `(x, y, z)` round-trips.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete spatial cell address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Column.
    pub x: i64,
    /// Row.
    pub y: i64,
    /// Layer. Square worlds keep it at 0.
    #[serde(default)]
    pub z: i128,
}

impl TileCoord {
    /// The origin, and the only legal tile of a single-tile world.
    pub const ORIGIN: Self = Self { x: 0, y: 0, z: 0 };

    /// Construct a planar tile (z = 0).
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y, z: 0 }
    }

    /// Construct a tile with an explicit layer.
    pub const fn with_layer(x: i64, y: i64, z: i128) -> Self {
        Self { x, y, z }
    }

    /// Packed map-key form.
    pub fn pack(self) -> PackedTile {
        pack_coordinate(self.x, self.y, self.z)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl From<PackedTile> for TileCoord {
    fn from(packed: PackedTile) -> Self {
        packed.unpack()
    }
}

/// A tile coordinate packed into 256 bits; cheap to hash and compare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackedTile([u64; 4]);

impl PackedTile {
    /// Raw limbs, least significant first.
    pub const fn limbs(self) -> [u64; 4] {
        self.0
    }

    /// Rebuild from raw limbs.
    pub const fn from_limbs(limbs: [u64; 4]) -> Self {
        Self(limbs)
    }

    /// Big-endian 32-byte form, most significant limb first.
    pub fn to_be_bytes(self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for (i, limb) in self.0.iter().rev().enumerate() {
            out[i * 8..(i + 1) * 8].copy_from_slice(&limb.to_be_bytes());
        }
        out
    }

    /// Inverse of [`PackedTile::to_be_bytes`].
    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        let mut limbs = [0u64; 4];
        for (i, chunk) in bytes.chunks_exact(8).enumerate() {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            limbs[3 - i] = u64::from_be_bytes(word);
        }
        Self(limbs)
    }

    /// Unpack into a [`TileCoord`].
    pub fn unpack(self) -> TileCoord {
        let (x, y, z) = unpack_coordinate(self);
        TileCoord { x, y, z }
    }
}

/// Pack `(x, y, z)` losslessly into one 256-bit value.
pub fn pack_coordinate(x: i64, y: i64, z: i128) -> PackedTile {
    let z = z as u128;
    PackedTile([x as u64, y as u64, z as u64, (z >> 64) as u64])
}

/// Exact inverse of [`pack_coordinate`].
pub fn unpack_coordinate(packed: PackedTile) -> (i64, i64, i128) {
    let [x, y, z_lo, z_hi] = packed.0;
    let z = ((z_hi as u128) << 64) | z_lo as u128;
    (x as i64, y as i64, z as i128)
}
