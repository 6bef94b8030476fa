//! Interchange form of a live board, as handed over by the game context.
//!
//! The layout follows the game's own serialization: `cells[x][y]` holds either
//! `null` or `{ "position": { "x": .., "y": .. }, "value": .. }`.
//!
//! ```
//! use agent_2048::engine::{Board, GridSnapshot};
//!
//! let json = r#"{
//!   "size": 4,
//!   "cells": [
//!     [{"position": {"x": 0, "y": 0}, "value": 2}, null, null, null],
//!     [null, null, null, null],
//!     [null, null, null, null],
//!     [null, null, null, {"position": {"x": 3, "y": 3}, "value": 4}]
//!   ]
//! }"#;
//! let snap: GridSnapshot = serde_json::from_str(json).unwrap();
//! let board = Board::from_snapshot(&snap).unwrap();
//! assert_eq!(board.rows()[3], [0, 0, 0, 4]);
//! assert!(!board.is_over());
//! ```

use serde::{Deserialize, Serialize};

use super::tile::{is_tile_value, Tile};
use super::{Board, Position, SIZE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileState {
    pub position: Position,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub size: usize,
    /// Column-major: `cells[x][y]`.
    pub cells: Vec<Vec<Option<TileState>>>,
    /// Terminal flag from the game context.
    #[serde(default)]
    pub over: bool,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("unsupported board size {0}, expected 4")]
    Size(usize),
    #[error("snapshot has {0} columns, expected 4")]
    Columns(usize),
    #[error("column {x} has {len} cells, expected 4")]
    Shape { x: usize, len: usize },
    #[error("cell ({x}, {y}) holds {value}, which is not a tile value")]
    InvalidValue { x: usize, y: usize, value: u32 },
    #[error("cell ({x}, {y}) holds a tile recorded at {position}")]
    PositionMismatch { x: usize, y: usize, position: Position },
}

impl Board {
    /// Rebuild an independent board from a snapshot, validating its shape and values.
    pub fn from_snapshot(snapshot: &GridSnapshot) -> Result<Self, SnapshotError> {
        if snapshot.size != SIZE {
            return Err(SnapshotError::Size(snapshot.size));
        }
        if snapshot.cells.len() != SIZE {
            return Err(SnapshotError::Columns(snapshot.cells.len()));
        }
        let mut board = Board::new();
        for (x, column) in snapshot.cells.iter().enumerate() {
            if column.len() != SIZE {
                return Err(SnapshotError::Shape { x, len: column.len() });
            }
            for (y, cell) in column.iter().enumerate() {
                let Some(state) = cell else { continue };
                if !is_tile_value(state.value) {
                    return Err(SnapshotError::InvalidValue { x, y, value: state.value });
                }
                if state.position != Position::new(x as i8, y as i8) {
                    return Err(SnapshotError::PositionMismatch { x, y, position: state.position });
                }
                board.insert_tile(Tile::new(state.position, state.value));
            }
        }
        board.set_over(snapshot.over);
        Ok(board)
    }

    /// Serialize into the game's interchange form.
    pub fn snapshot(&self) -> GridSnapshot {
        let cells = (0..SIZE as i8)
            .map(|x| {
                (0..SIZE as i8)
                    .map(|y| {
                        self.cell_content(Position::new(x, y))
                            .map(|t| TileState { position: t.position(), value: t.value() })
                    })
                    .collect()
            })
            .collect();
        GridSnapshot { size: SIZE, cells, over: self.is_over() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Board {
        let mut b: Board = "2,0,0,0/0,4,0,0/0,0,0,0/0,0,0,1024".parse().unwrap();
        b.set_over(true);
        b
    }

    #[test]
    fn snapshot_restores_board_and_flag() {
        let b = sample();
        let snap = b.snapshot();
        assert_eq!(snap.size, 4);
        assert_eq!(snap.cells[1][1], Some(TileState { position: Position::new(1, 1), value: 4 }));
        let back = Board::from_snapshot(&snap).unwrap();
        assert_eq!(back, b);
        assert!(back.is_over());
    }

    #[test]
    fn json_form_matches_game_layout() {
        let json = serde_json::to_value(sample().snapshot()).unwrap();
        assert_eq!(json["cells"][3][3]["value"], 1024);
        assert_eq!(json["cells"][0][0]["position"]["x"], 0);
        assert!(json["cells"][0][1].is_null());
    }

    #[test]
    fn rejects_wrong_size() {
        let mut snap = sample().snapshot();
        snap.size = 5;
        assert_eq!(Board::from_snapshot(&snap).unwrap_err(), SnapshotError::Size(5));
    }

    #[test]
    fn rejects_missing_column() {
        let mut snap = sample().snapshot();
        snap.cells.pop();
        assert_eq!(Board::from_snapshot(&snap).unwrap_err(), SnapshotError::Columns(3));
    }

    #[test]
    fn rejects_oversized_tile() {
        let mut snap = sample().snapshot();
        snap.cells[1][0] = Some(TileState { position: Position::new(1, 0), value: 1 << 31 });
        assert_eq!(
            Board::from_snapshot(&snap).unwrap_err(),
            SnapshotError::InvalidValue { x: 1, y: 0, value: 1 << 31 }
        );
    }

    #[test]
    fn rejects_short_column() {
        let mut snap = sample().snapshot();
        snap.cells[2].pop();
        assert_eq!(Board::from_snapshot(&snap).unwrap_err(), SnapshotError::Shape { x: 2, len: 3 });
    }

    #[test]
    fn rejects_bad_value_and_position() {
        let mut snap = sample().snapshot();
        snap.cells[0][0] = Some(TileState { position: Position::new(0, 0), value: 3 });
        assert!(matches!(Board::from_snapshot(&snap), Err(SnapshotError::InvalidValue { x: 0, y: 0, value: 3 })));

        let mut snap = sample().snapshot();
        snap.cells[0][0] = Some(TileState { position: Position::new(2, 2), value: 2 });
        assert!(matches!(Board::from_snapshot(&snap), Err(SnapshotError::PositionMismatch { x: 0, y: 0, .. })));
    }
}
