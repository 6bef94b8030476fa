//! agent-2048: move selection for the 4x4 sliding-tile merge puzzle.
//!
//! This crate provides:
//! - A tile-level board model with the game's slide/merge rules (`engine` module)
//! - An adaptive-depth Expectimax policy over simulated boards (`expectimax` module)
//! - A headless game context for self-play (`game` module)
//! - A checksummed binary record of self-played games (`trace` module)
//!
//! The live game hands the agent a snapshot of its board and later applies the
//! direction the agent returns. Every random tile the search spawns is
//! speculative and lives on a private copy.
//!
//! Quick start:
//! ```
//! use agent_2048::engine::{Board, Move};
//! use agent_2048::expectimax::Expectimax;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let board: Board = "2,0,0,2/0,4,0,0/0,0,0,0/0,0,0,0".parse().unwrap();
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut agent = Expectimax::new();
//! let dir: Option<Move> = agent.best_move(&board, &mut rng);
//! assert!(dir.is_some());
//! ```
//!
//! Full loop (simplest possible)
//! ```
//! use agent_2048::expectimax::{Expectimax, ExpectimaxConfig};
//! use agent_2048::game::Game;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let cfg = ExpectimaxConfig { depth_cap: 3, ..Default::default() };
//! let mut policy = Expectimax::with_config(cfg);
//! let mut game = Game::new(StdRng::seed_from_u64(123));
//! let mut search_rng = StdRng::seed_from_u64(321);
//!
//! while !game.is_over() && game.moves() < 8 {
//!     match policy.best_move(game.board(), &mut search_rng) {
//!         Some(dir) => assert!(game.play(dir)),
//!         None => break,
//!     }
//! }
//! assert!(game.moves() > 0);
//! ```
//!
pub mod config;
pub mod engine;
pub mod expectimax;
pub mod game;
pub mod trace;
