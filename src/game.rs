//! Headless game context.
//!
//! Plays the part of the live game around the agent: it owns the real board,
//! applies the direction the agent picks, spawns the real random tile and
//! decides when the game is over. The search never touches this board; it
//! only sees clones of it.

use log::trace;
use rand::Rng;

use crate::engine::{Board, Move};

/// Tiles placed on a fresh board.
pub const START_TILES: usize = 2;

/// A running game driven by an injected RNG.
pub struct Game<R: Rng> {
    board: Board,
    score: u64,
    moves: u32,
    rng: R,
}

impl<R: Rng> Game<R> {
    /// Fresh game with [`START_TILES`] random tiles.
    pub fn new(mut rng: R) -> Self {
        let mut board = Board::new();
        for _ in 0..START_TILES {
            board.add_random_tile(&mut rng);
        }
        Game { board, score: 0, moves: 0, rng }
    }

    /// Resume from an existing position.
    pub fn from_board(mut board: Board, score: u64, rng: R) -> Self {
        board.set_over(!board.has_moves());
        Game { board, score, moves: 0, rng }
    }

    #[inline]
    pub fn board(&self) -> &Board { &self.board }

    #[inline]
    pub fn score(&self) -> u64 { self.score }

    /// Moves that changed the board so far.
    #[inline]
    pub fn moves(&self) -> u32 { self.moves }

    #[inline]
    pub fn is_over(&self) -> bool { self.board.is_over() }

    #[inline]
    pub fn highest_tile(&self) -> u32 { self.board.highest_tile() }

    /// Apply `direction` to the live board.
    ///
    /// When something moved, one real tile is spawned and `over` is
    /// recomputed. Returns whether the move changed the board.
    pub fn play(&mut self, direction: Move) -> bool {
        if self.board.is_over() {
            return false;
        }
        let slide = self.board.slide(direction);
        if !slide.moved {
            return false;
        }
        self.score += slide.points;
        self.moves += 1;
        let spawned = self.board.add_random_tile(&mut self.rng);
        let over = !self.board.has_moves();
        self.board.set_over(over);
        trace!(
            "move {} {}: +{} score={} spawn={:?} over={}",
            self.moves, direction, slide.points, self.score, spawned, over
        );
        true
    }
}
