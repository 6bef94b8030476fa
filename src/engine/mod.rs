//! Board simulation for the 4x4 merge puzzle.
//!
//! The model follows the live game closely: a [`Board`] owns up to sixteen
//! [`Tile`]s, each of which remembers its own [`Position`]. Moves are applied
//! with [`Board::slide`] (in place) or [`apply_move`] (on a copy), both of
//! which enforce the merge-once rule for a single move.
//!
//! ```
//! use agent_2048::engine::{apply_move, Board, Move};
//!
//! let board: Board = "2,2,4,4/0,0,0,0/0,0,0,0/0,0,0,0".parse().unwrap();
//! let out = apply_move(&board, 0, Move::Left);
//! assert!(out.moved);
//! assert_eq!(out.score, 12);
//! assert_eq!(out.board.rows()[0], [4, 8, 0, 0]);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

mod board;
mod shift;
mod snapshot;
mod tile;

pub use board::{Board, ParseBoardError};
pub use shift::{apply_move, MoveOutcome, Slide};
pub use snapshot::{GridSnapshot, SnapshotError, TileState};
pub use tile::{Tile, TileId, MAX_TILE};

/// Board dimension.
pub const SIZE: usize = 4;

/// Number of cells on a board.
pub const CELLS: usize = SIZE * SIZE;

/// Probability that a spawned tile is a 4 rather than a 2.
pub const FOUR_PROBABILITY: f64 = 0.1;

/// A direction to move/merge tiles.
///
/// The discriminants follow the live game's numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Move {
    /// All directions in the order the search tries them.
    pub const ALL: [Move; 4] = [Move::Up, Move::Right, Move::Down, Move::Left];

    /// Unit vector tiles travel along for this direction.
    #[inline]
    pub fn vector(self) -> Vector {
        match self {
            Move::Up => Vector { x: 0, y: -1 },
            Move::Right => Vector { x: 1, y: 0 },
            Move::Down => Vector { x: 0, y: 1 },
            Move::Left => Vector { x: -1, y: 0 },
        }
    }

    #[inline]
    pub fn index(self) -> u8 { self as u8 }

    pub fn from_index(idx: u8) -> Option<Move> {
        Move::ALL.get(idx as usize).copied()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Up => "up",
            Move::Right => "right",
            Move::Down => "down",
            Move::Left => "left",
        };
        f.pad(name)
    }
}

/// Cell coordinate. `x` is the column, `y` the row, both counted from the top-left.
///
/// Coordinates are signed so a walk may step one cell off the board before
/// [`Board::within_bounds`] rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i8,
    pub y: i8,
}

impl Position {
    #[inline]
    pub const fn new(x: i8, y: i8) -> Self { Position { x, y } }

    #[inline]
    pub fn step(self, v: Vector) -> Self {
        Position { x: self.x + v.x, y: self.y + v.y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Unit movement vector for a [`Move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vector {
    pub x: i8,
    pub y: i8,
}
