//! Position evaluation.
//!
//! A board is worth its banked score minus a charge for every tile still on
//! it, proportional to the tile's log2. Points sitting in large unmerged
//! tiles therefore count for less than points already scored.

use crate::engine::{Board, Tile};

/// Default charge per log2 of each resident tile.
pub const TILE_PENALTY: f64 = 10.0;

/// Heuristic value of `board` given the running `score`, with the default penalty.
///
/// ```
/// use agent_2048::engine::Board;
/// use agent_2048::expectimax::heuristic::evaluate;
/// let b: Board = "2,0,0,0/0,0,0,0/0,0,0,0/0,0,0,8".parse().unwrap();
/// assert_eq!(evaluate(&b, 100), 100.0 - 10.0 - 30.0);
/// ```
#[inline]
pub fn evaluate(board: &Board, score: u64) -> f64 {
    evaluate_with(board, score, TILE_PENALTY)
}

/// Like [`evaluate`] with an explicit per-rank penalty.
pub fn evaluate_with(board: &Board, score: u64, tile_penalty: f64) -> f64 {
    board.tiles().fold(score as f64, |acc, tile| acc - tile_penalty * rank(tile))
}

// Values are powers of two >= 2, so log2 is always defined and positive.
#[inline]
fn rank(tile: &Tile) -> f64 {
    f64::from(tile.value()).log2()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_board_is_worth_its_score() {
        assert_eq!(evaluate(&Board::new(), 0), 0.0);
        assert_eq!(evaluate(&Board::new(), 512), 512.0);
    }

    #[test]
    fn larger_tile_scores_lower() {
        let four: Board = "0,0,0,0/0,4,0,0/0,0,2,0/0,0,0,0".parse().unwrap();
        let eight: Board = "0,0,0,0/0,8,0,0/0,0,2,0/0,0,0,0".parse().unwrap();
        assert!(evaluate(&eight, 40) < evaluate(&four, 40));
        assert_eq!(evaluate(&four, 40) - evaluate(&eight, 40), 10.0);
    }

    #[test]
    fn penalty_is_configurable() {
        let b: Board = "1024,0,0,0/0,0,0,0/0,0,0,0/0,0,0,0".parse().unwrap();
        assert_eq!(evaluate_with(&b, 0, 1.0), -10.0);
        assert_eq!(evaluate_with(&b, 0, 0.0), 0.0);
    }

    #[test]
    fn merging_improves_value() {
        // 2+2 -> 4: score +4, penalty 20 -> 20, net +4
        let before: Board = "2,2,0,0/0,0,0,0/0,0,0,0/0,0,0,0".parse().unwrap();
        let after: Board = "4,0,0,0/0,0,0,0/0,0,0,0/0,0,0,0".parse().unwrap();
        assert!(evaluate(&after, 4) > evaluate(&before, 0));
    }
}
