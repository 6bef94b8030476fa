use serde::{Deserialize, Serialize};

use super::Position;

/// Largest tile a 4x4 board can produce. Two of these never merge.
pub const MAX_TILE: u32 = 1 << 17;

/// Identifier of a tile, unique within the board that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(pub u32);

/// A single numbered piece.
///
/// `value` is a power of two between 2 and [`MAX_TILE`]. `merged_from` is set only on a
/// tile produced by a merge during the most recent slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub(crate) id: TileId,
    pub(crate) value: u32,
    pub(crate) position: Position,
    pub(crate) merged_from: Option<(TileId, TileId)>,
}

impl Tile {
    /// Create a tile at `position`. Its id is assigned by [`Board::insert_tile`](super::Board::insert_tile).
    ///
    /// Panics if `value` is not a power of two in `2..=MAX_TILE`.
    pub fn new(position: Position, value: u32) -> Self {
        assert!(is_tile_value(value), "invalid tile value {value}");
        Tile { id: TileId(0), value, position, merged_from: None }
    }

    #[inline]
    pub fn id(&self) -> TileId { self.id }

    #[inline]
    pub fn value(&self) -> u32 { self.value }

    #[inline]
    pub fn position(&self) -> Position { self.position }

    #[inline]
    pub fn merged_from(&self) -> Option<(TileId, TileId)> { self.merged_from }

    /// log2 of the value, i.e. the tile's rank (2 -> 1, 4 -> 2, ...).
    #[inline]
    pub fn exponent(&self) -> u32 { self.value.trailing_zeros() }
}

#[inline]
pub(crate) fn is_tile_value(value: u32) -> bool {
    (2..=MAX_TILE).contains(&value) && value.is_power_of_two()
}

/// Equal tiles merge unless the result would pass [`MAX_TILE`].
#[inline]
pub(crate) fn can_merge(a: u32, b: u32) -> bool {
    a == b && a < MAX_TILE
}
