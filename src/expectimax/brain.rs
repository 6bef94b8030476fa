use rand::Rng;

use crate::engine::{Board, Move, Position};

use super::heuristic;

/// A board under simulation together with the score banked along this line of play.
///
/// Every search branch works on its own clone; nothing is shared between siblings.
#[derive(Debug, Clone)]
pub struct Brain {
    board: Board,
    score: u64,
}

impl Brain {
    /// Start simulating from a copy of the live board with nothing banked yet.
    pub fn new(board: &Board) -> Self { Self::with_score(board, 0) }

    pub fn with_score(board: &Board, score: u64) -> Self {
        Brain { board: board.clone(), score }
    }

    #[inline]
    pub fn board(&self) -> &Board { &self.board }

    #[inline]
    pub fn score(&self) -> u64 { self.score }

    /// Terminal flag carried over from the game context.
    #[inline]
    pub fn is_over(&self) -> bool { self.board.is_over() }

    /// Slide in `direction`, banking merge points. Returns whether anything moved.
    pub fn make_move(&mut self, direction: Move) -> bool {
        let slide = self.board.slide(direction);
        self.score += slide.points;
        slide.moved
    }

    /// Spawn a speculative 2 or 4 in a random empty cell. `None` on a full board.
    pub fn add_random_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Position> {
        self.board.add_random_tile(rng)
    }

    #[inline]
    pub fn evaluate(&self, tile_penalty: f64) -> f64 {
        heuristic::evaluate_with(&self.board, self.score, tile_penalty)
    }

    pub(crate) fn board_mut(&mut self) -> &mut Board { &mut self.board }
}
