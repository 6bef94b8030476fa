//! Expectimax move selection.
//!
//! The search alternates maximizing plies (the agent picks a direction) and
//! chance plies (the game spawns a tile), scoring cut-off positions with the
//! heuristic in [`heuristic`]. Depth adapts to the board: the fuller the board,
//! the fewer branches per ply, the deeper the search goes.
//!
//! Randomness is always injected by the caller, so a seeded RNG replays a
//! decision exactly.
//!
//! ```
//! use agent_2048::engine::{apply_move, Board};
//! use agent_2048::expectimax::Expectimax;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let board: Board = "2,2,0,0/0,0,0,0/0,0,4,0/0,0,0,0".parse().unwrap();
//! let mut rng = StdRng::seed_from_u64(7);
//! let mut ex = Expectimax::new();
//! let dir = ex.best_move(&board, &mut rng).unwrap();
//! assert!(apply_move(&board, 0, dir).moved);
//! ```

use serde::Deserialize;

use crate::engine::{Board, Move, CELLS};

mod brain;
pub mod heuristic;
mod search_seq;

pub use brain::Brain;
pub use search_seq::Expectimax;

/// Deepest search the adaptive depth is allowed to reach.
pub const DEFAULT_DEPTH_CAP: u32 = 11;

/// How chance plies model the random spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChanceMode {
    /// Draw one spawn (cell and value) from the RNG and follow only that.
    #[default]
    Sampled,
    /// Average over every empty cell and both values, weighted 0.9 / 0.1.
    Exhaustive,
}

/// Configurable knobs for Expectimax. Defaults give the classic agent.
///
/// - `depth_cap`: upper bound on the adaptive depth.
/// - `chance`: single-sample or fully weighted chance plies.
/// - `tile_penalty`: heuristic cost per log2 of every resident tile.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExpectimaxConfig {
    pub depth_cap: u32,
    pub chance: ChanceMode,
    pub tile_penalty: f64,
}

impl Default for ExpectimaxConfig {
    fn default() -> Self {
        Self { depth_cap: DEFAULT_DEPTH_CAP, chance: ChanceMode::Sampled, tile_penalty: heuristic::TILE_PENALTY }
    }
}

/// Value of one root direction.
///
/// `legal` is false when the move leaves the board unchanged; `ev` is then 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchEval {
    pub dir: Move,
    pub ev: f64,
    pub legal: bool,
}

/// Basic search stats for a single evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes visited, leaves included.
    pub nodes: u64,
    /// Depth limit used for the search.
    pub depth_limit: u32,
    /// Deepest ply actually reached.
    pub max_depth: u32,
}

/// Plies to search for `board`: one per occupied cell, at most `cap`.
///
/// ```
/// use agent_2048::engine::Board;
/// use agent_2048::expectimax::depth_limit;
/// assert_eq!(depth_limit(&Board::new(), 11), 0);
/// ```
pub fn depth_limit(board: &Board, cap: u32) -> u32 {
    let occupied = CELLS.saturating_sub(board.available_cells().len()) as u32;
    occupied.min(cap)
}
