use log::debug;
use rand::Rng;

use crate::engine::{Board, Move, Tile, FOUR_PROBABILITY};

use super::{depth_limit, BranchEval, Brain, ChanceMode, ExpectimaxConfig, SearchStats};

enum Node { Max, Chance }

#[derive(Debug, Clone, Copy)]
struct ExpectimaxResult { score: f64, move_dir: Option<Move> }

/// Single-threaded Expectimax search.
///
/// Each call is a function of the board snapshot, the config and the RNG
/// handed in; the only state kept between calls is [`SearchStats`].
pub struct Expectimax {
    cfg: ExpectimaxConfig,
    stats: SearchStats,
}

impl Expectimax {
    pub fn new() -> Self { Self::with_config(ExpectimaxConfig::default()) }

    pub fn with_config(cfg: ExpectimaxConfig) -> Self {
        Self { cfg, stats: SearchStats::default() }
    }

    /// Pick a direction for the live `board`, or `None` if no direction moves anything.
    ///
    /// The board is never modified; all speculative tiles land on private copies.
    ///
    /// Example
    /// ```
    /// use agent_2048::engine::Board;
    /// use agent_2048::expectimax::Expectimax;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(3);
    /// let stuck: Board = "2,4,2,4/4,2,4,2/2,4,2,4/4,2,4,2".parse().unwrap();
    /// assert!(Expectimax::new().best_move(&stuck, &mut rng).is_none());
    /// ```
    pub fn best_move<R: Rng + ?Sized>(&mut self, board: &Board, rng: &mut R) -> Option<Move> {
        let brain = Brain::new(board);
        let limit = self.depth_limit(board);
        let mut stats = SearchStats { depth_limit: limit, ..SearchStats::default() };
        let result = self.expectimax(&brain, Node::Max, 0, limit, rng, &mut stats);
        debug!(
            "expectimax: depth_limit={} nodes={} value={:.1} move={:?}",
            limit, stats.nodes, result.score, result.move_dir
        );
        self.stats = stats;
        result.move_dir
    }

    /// Value of each root direction, in [`Move::ALL`] order.
    ///
    /// Directions that leave the board unchanged are marked `legal=false`.
    /// On a board flagged `over` every direction is reported illegal.
    pub fn branch_evals<R: Rng + ?Sized>(&mut self, board: &Board, rng: &mut R) -> [BranchEval; 4] {
        let brain = Brain::new(board);
        let limit = self.depth_limit(board);
        let mut stats = SearchStats { depth_limit: limit, ..SearchStats::default() };
        let out = Move::ALL.map(|dir| {
            let mut child = brain.clone();
            if brain.is_over() || !child.make_move(dir) {
                return BranchEval { dir, ev: 0.0, legal: false };
            }
            let ev = self.expectimax(&child, Node::Chance, 1, limit, rng, &mut stats).score;
            BranchEval { dir, ev, legal: true }
        });
        self.stats = stats;
        out
    }

    /// Value of the root position as the search sees it.
    pub fn state_value<R: Rng + ?Sized>(&mut self, board: &Board, rng: &mut R) -> f64 {
        let brain = Brain::new(board);
        let limit = self.depth_limit(board);
        let mut stats = SearchStats { depth_limit: limit, ..SearchStats::default() };
        let result = self.expectimax(&brain, Node::Max, 0, limit, rng, &mut stats);
        self.stats = stats;
        result.score
    }

    /// Statistics collected from the last call to [`Self::best_move`],
    /// [`Self::branch_evals`] or [`Self::state_value`].
    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    #[inline]
    pub fn reset_stats(&mut self) { self.stats = SearchStats::default(); }

    #[inline]
    pub fn depth_limit(&self, board: &Board) -> u32 { depth_limit(board, self.cfg.depth_cap) }

    fn expectimax<R: Rng + ?Sized>(
        &self,
        brain: &Brain,
        node: Node,
        depth: u32,
        limit: u32,
        rng: &mut R,
        stats: &mut SearchStats,
    ) -> ExpectimaxResult {
        stats.nodes += 1;
        stats.max_depth = stats.max_depth.max(depth);
        let baseline = brain.evaluate(self.cfg.tile_penalty);
        if brain.is_over() || depth >= limit {
            return ExpectimaxResult { score: baseline, move_dir: None };
        }
        match node {
            Node::Max => self.evaluate_max(brain, baseline, depth, limit, rng, stats),
            Node::Chance => match self.cfg.chance {
                ChanceMode::Sampled => self.evaluate_sampled(brain, baseline, depth, limit, rng, stats),
                ChanceMode::Exhaustive => self.evaluate_exhaustive(brain, baseline, depth, limit, rng, stats),
            },
        }
    }

    fn evaluate_max<R: Rng + ?Sized>(
        &self,
        brain: &Brain,
        baseline: f64,
        depth: u32,
        limit: u32,
        rng: &mut R,
        stats: &mut SearchStats,
    ) -> ExpectimaxResult {
        let mut best: Option<(f64, Move)> = None;
        for direction in Move::ALL {
            let mut child = brain.clone();
            if !child.make_move(direction) {
                continue;
            }
            let score = self.expectimax(&child, Node::Chance, depth + 1, limit, rng, stats).score;
            // `>=`: on equal values the later direction wins.
            match best {
                Some((best_score, _)) if score < best_score => {}
                _ => best = Some((score, direction)),
            }
        }
        match best {
            Some((score, direction)) => ExpectimaxResult { score, move_dir: Some(direction) },
            None => ExpectimaxResult { score: baseline, move_dir: None },
        }
    }

    /// One sampled spawn. The node keeps the better of its own value and the sample's.
    fn evaluate_sampled<R: Rng + ?Sized>(
        &self,
        brain: &Brain,
        baseline: f64,
        depth: u32,
        limit: u32,
        rng: &mut R,
        stats: &mut SearchStats,
    ) -> ExpectimaxResult {
        let mut child = brain.clone();
        if child.add_random_tile(rng).is_none() {
            return ExpectimaxResult { score: baseline, move_dir: None };
        }
        let sampled = self.expectimax(&child, Node::Max, depth + 1, limit, rng, stats).score;
        ExpectimaxResult { score: sampled.max(baseline), move_dir: None }
    }

    /// Probability-weighted mean over every empty cell and both spawn values.
    fn evaluate_exhaustive<R: Rng + ?Sized>(
        &self,
        brain: &Brain,
        baseline: f64,
        depth: u32,
        limit: u32,
        rng: &mut R,
        stats: &mut SearchStats,
    ) -> ExpectimaxResult {
        let cells = brain.board().available_cells();
        if cells.is_empty() {
            return ExpectimaxResult { score: baseline, move_dir: None };
        }
        let cell_prob = 1.0 / cells.len() as f64;
        let mut score = 0.0;
        for pos in cells {
            for (value, prob) in [(2, 1.0 - FOUR_PROBABILITY), (4, FOUR_PROBABILITY)] {
                let mut child = brain.clone();
                child.board_mut().insert_tile(Tile::new(pos, value));
                score += cell_prob * prob * self.expectimax(&child, Node::Max, depth + 1, limit, rng, stats).score;
            }
        }
        ExpectimaxResult { score, move_dir: None }
    }
}

impl Default for Expectimax { fn default() -> Self { Self::new() } }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{apply_move, MAX_TILE};
    use rand::{rngs::StdRng, SeedableRng};

    fn board(s: &str) -> Board { s.parse().unwrap() }

    fn capped(depth_cap: u32) -> Expectimax {
        Expectimax::with_config(ExpectimaxConfig { depth_cap, ..ExpectimaxConfig::default() })
    }

    #[test]
    fn no_legal_move_gives_none() {
        let mut rng = StdRng::seed_from_u64(1);
        let stuck = board("2,4,2,4/4,2,4,2/2,4,2,4/4,2,4,2");
        let mut ex = Expectimax::new();
        assert_eq!(ex.best_move(&stuck, &mut rng), None);
        assert!(ex.branch_evals(&stuck, &mut rng).iter().all(|b| !b.legal));
    }

    #[test]
    fn over_flag_is_terminal() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut b = board("2,2,0,0/0,0,0,0/0,0,0,0/0,0,0,0");
        b.set_over(true);
        let mut ex = Expectimax::new();
        assert_eq!(ex.best_move(&b, &mut rng), None);
        assert_eq!(ex.last_stats().nodes, 1);
    }

    #[test]
    fn empty_board_has_zero_depth() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut ex = Expectimax::new();
        assert_eq!(ex.best_move(&Board::new(), &mut rng), None);
        assert_eq!(ex.last_stats().depth_limit, 0);
    }

    #[test]
    fn ties_go_to_the_later_direction() {
        let mut rng = StdRng::seed_from_u64(1);
        // Right and Down both slide a lone 2 and evaluate the same.
        let lone = board("2,0,0,0/0,0,0,0/0,0,0,0/0,0,0,0");
        assert_eq!(capped(1).best_move(&lone, &mut rng), Some(Move::Down));
        // Right and Left both merge the pair; Left comes later.
        let pair = board("2,2,0,0/0,0,0,0/0,0,0,0/0,0,0,0");
        assert_eq!(capped(1).best_move(&pair, &mut rng), Some(Move::Left));
    }

    #[test]
    fn picks_the_only_merging_axis() {
        let mut rng = StdRng::seed_from_u64(11);
        // Only a vertical move merges the 8s.
        let b = board("8,2,4,16/8,4,2,32/2,16,32,4/4,32,2,8");
        let m = capped(2).best_move(&b, &mut rng);
        assert!(matches!(m, Some(Move::Up) | Some(Move::Down)));
    }

    #[test]
    fn chosen_move_is_always_legal() {
        let mut rng = StdRng::seed_from_u64(2024);
        let mut ex = capped(4);
        for _ in 0..40 {
            let mut b = Board::new();
            let fill = rng.gen_range(1..16);
            for _ in 0..fill {
                b.add_random_tile(&mut rng);
            }
            match ex.best_move(&b, &mut rng) {
                Some(dir) => assert!(apply_move(&b, 0, dir).moved),
                None => assert!(Move::ALL.iter().all(|&d| !apply_move(&b, 0, d).moved)),
            }
        }
    }

    #[test]
    fn seeded_rng_replays_decision() {
        let b = board("2,4,8,0/0,2,0,0/4,0,0,2/0,0,16,2");
        let mut ex = Expectimax::new();
        let first = ex.best_move(&b, &mut StdRng::seed_from_u64(99));
        let first_stats = ex.last_stats();
        let second = ex.best_move(&b, &mut StdRng::seed_from_u64(99));
        assert_eq!(first, second);
        assert_eq!(first_stats, ex.last_stats());
    }

    #[test]
    fn search_never_touches_the_input() {
        let b = board("2,4,8,0/0,2,0,0/4,0,0,2/0,0,16,2");
        let before = b.clone();
        let _ = Expectimax::new().best_move(&b, &mut StdRng::seed_from_u64(5));
        assert_eq!(b, before);
    }

    #[test]
    fn stats_respect_depth_limit() {
        let b = board("2,4,8,0/0,2,0,0/4,0,0,2/0,0,16,2");
        let mut ex = Expectimax::new();
        ex.best_move(&b, &mut StdRng::seed_from_u64(5));
        let stats = ex.last_stats();
        assert_eq!(stats.depth_limit, 8);
        assert!(stats.max_depth <= stats.depth_limit);
        assert!(stats.nodes > 1);
        ex.reset_stats();
        assert_eq!(ex.last_stats(), SearchStats::default());
    }

    #[test]
    fn branch_evals_flag_illegal_directions() {
        let mut rng = StdRng::seed_from_u64(8);
        // Top row is pinned against the top wall; no horizontal move possible.
        let b = board("2,4,8,16/0,0,0,0/0,0,0,0/0,0,0,0");
        let evals = capped(3).branch_evals(&b, &mut rng);
        let legal: Vec<Move> = evals.iter().filter(|e| e.legal).map(|e| e.dir).collect();
        assert_eq!(legal, vec![Move::Down]);
        assert_eq!(evals[0].dir, Move::Up);
        assert_eq!(evals[0].ev, 0.0);
    }

    #[test]
    fn chance_on_full_board_keeps_baseline() {
        let full = Brain::new(&board("2,4,2,4/4,2,4,2/2,4,2,4/4,2,4,2"));
        for chance in [ChanceMode::Sampled, ChanceMode::Exhaustive] {
            let ex = Expectimax::with_config(ExpectimaxConfig { chance, ..ExpectimaxConfig::default() });
            let mut rng = StdRng::seed_from_u64(4);
            let mut untouched = rng.clone();
            let mut stats = SearchStats::default();
            let result = ex.expectimax(&full, Node::Chance, 1, 5, &mut rng, &mut stats);
            assert_eq!(result.score, full.evaluate(ex.cfg.tile_penalty));
            assert_eq!(result.move_dir, None);
            assert_eq!(stats.nodes, 1);
            assert_eq!(rng.gen::<u64>(), untouched.gen::<u64>());
        }
    }

    #[test]
    fn largest_tiles_do_not_break_the_search() {
        let mut rng = StdRng::seed_from_u64(12);
        let b = Board::from_rows([[MAX_TILE, MAX_TILE, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
        match Expectimax::new().best_move(&b, &mut rng) {
            Some(dir) => assert!(apply_move(&b, 0, dir).moved),
            None => panic!("vertical moves are legal"),
        }
    }

    #[test]
    fn exhaustive_mode_weights_spawns() {
        let cfg = ExpectimaxConfig { depth_cap: 2, chance: ChanceMode::Exhaustive, ..ExpectimaxConfig::default() };
        let mut ex = Expectimax::with_config(cfg);
        let mut rng = StdRng::seed_from_u64(0);
        let b = board("2,0,0,0/0,0,0,0/0,0,0,0/0,0,0,4");
        assert_eq!(ex.depth_limit(&b), 2);
        let evals = ex.branch_evals(&b, &mut rng);
        for e in evals.iter().filter(|e| e.legal) {
            // After any slide: score 0, tiles 2 and 4 (-30), then a spawn of
            // 2 (-10, p=0.9) or 4 (-20, p=0.1): -30 - 11 = -41.
            assert!((e.ev - -41.0).abs() < 1e-9, "{:?}", e);
        }
        assert!(ex.best_move(&b, &mut rng).is_some());
    }
}
