use std::env;
use std::fs;
use std::path::PathBuf;

use agent_2048::config::Config;
use agent_2048::engine::{Board, GridSnapshot};
use agent_2048::expectimax::Expectimax;
use agent_2048::game::Game;
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::{info, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};

#[derive(Parser, Debug)]
#[command(name = "agent-2048", version, about = "Expectimax agent for the 2048 sliding-tile puzzle")]
struct Cli {
    /// TOML configuration file (defaults to ./Agent.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Override the search depth cap
    #[arg(long, global = true)]
    depth_cap: Option<u32>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play one game from a fresh board, printing every position
    Play {
        /// Seed for the game and the search (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Stop after this many moves
        #[arg(long)]
        max_moves: Option<u32>,
        /// Print only the final summary
        #[arg(short, long)]
        quiet: bool,
    },
    /// Suggest a move for a given position
    Suggest {
        /// Board snapshot as JSON (`{"size": 4, "cells": [[...]], "over": false}`)
        #[arg(long, value_name = "PATH", conflicts_with = "rows", required_unless_present = "rows")]
        board: Option<PathBuf>,
        /// Board as text rows, e.g. "2,2,0,0/0,4,0,0/0,0,0,0/0,0,0,2"
        #[arg(long)]
        rows: Option<String>,
        /// Seed for the search RNG
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

fn main() -> anyhow::Result<()> {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let cli = Cli::parse();
    let mut cfg = match &cli.config {
        Some(path) => Config::from_path(path).with_context(|| format!("reading {}", path.display()))?,
        None => Config::load_or_default(),
    };
    if let Some(cap) = cli.depth_cap {
        cfg.search.depth_cap = cap;
    }
    let mut expectimax = Expectimax::with_config(cfg.search);

    match cli.cmd {
        Command::Play { seed, max_moves, quiet } => {
            let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
            info!("playing with seed {seed}");
            let mut game = Game::new(StdRng::seed_from_u64(seed));
            let mut search_rng = StdRng::seed_from_u64(seed.wrapping_add(1));
            let mut total_nodes: u64 = 0;
            let mut peak_nodes: u64 = 0;
            if !quiet {
                println!("{}", game.board());
            }
            while !game.is_over() {
                if max_moves.is_some_and(|limit| game.moves() >= limit) {
                    break;
                }
                let Some(direction) = expectimax.best_move(game.board(), &mut search_rng) else { break };
                if !game.play(direction) {
                    warn!("seed {seed}: agent chose a no-op move {direction}");
                    break;
                }
                let stats = expectimax.last_stats();
                total_nodes = total_nodes.saturating_add(stats.nodes);
                peak_nodes = peak_nodes.max(stats.nodes);
                if !quiet {
                    println!("{direction} | score: {}\n{}", game.score(), game.board());
                }
            }
            println!(
                "Moves made: {}, Score: {}, Highest tile: {}, States considered: {}, Max states considered for a move: {}",
                game.moves(),
                game.score(),
                game.highest_tile(),
                total_nodes,
                peak_nodes
            );
        }
        Command::Suggest { board, rows, seed } => {
            let board = match (board, rows) {
                (Some(path), _) => {
                    let text = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
                    let snapshot: GridSnapshot = serde_json::from_str(&text).context("parsing board snapshot")?;
                    Board::from_snapshot(&snapshot)?
                }
                (None, Some(rows)) => rows.parse::<Board>()?,
                (None, None) => bail!("either --board or --rows is required"),
            };
            println!("{board}");
            let mut rng = StdRng::seed_from_u64(seed);
            for branch in expectimax.branch_evals(&board, &mut rng) {
                if branch.legal {
                    println!("{:>5}: {:.1}", branch.dir, branch.ev);
                } else {
                    println!("{:>5}: -", branch.dir);
                }
            }
            let mut rng = StdRng::seed_from_u64(seed);
            match expectimax.best_move(&board, &mut rng) {
                Some(direction) => println!("move: {direction}"),
                None => println!("move: none"),
            }
        }
    }
    Ok(())
}
