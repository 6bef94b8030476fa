use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use agent_2048::config::Config;
use agent_2048::expectimax::{Expectimax, ExpectimaxConfig};
use agent_2048::game::Game;
use agent_2048::trace::{self, GameRecord, Recorder};
use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;

#[derive(Debug, Parser)]
#[command(name = "selfplay", about = "Play many 2048 games with the expectimax agent")]
struct Args {
    /// TOML configuration file (defaults to ./Agent.toml when present)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of games (overrides the config file)
    #[arg(long)]
    games: Option<u32>,

    /// Base seed; game i uses seed + i (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Stop each game after this many moves
    #[arg(long)]
    max_moves: Option<u32>,

    /// Override the search depth cap
    #[arg(long)]
    depth_cap: Option<u32>,

    /// Worker threads (defaults to all cores)
    #[arg(long)]
    jobs: Option<usize>,

    /// Write one trace per game into this directory
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Suppress the progress bar
    #[arg(long)]
    quiet: bool,
}

struct Outcome {
    seed: u64,
    score: u64,
    highest_tile: u32,
    moves: u32,
    nodes: u64,
}

fn main() -> anyhow::Result<()> {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args = Args::parse();
    let mut cfg = match &args.config {
        Some(path) => Config::from_path(path).with_context(|| format!("reading {}", path.display()))?,
        None => Config::load_or_default(),
    };
    if let Some(games) = args.games {
        cfg.selfplay.games = games;
    }
    if let Some(seed) = args.seed {
        cfg.selfplay.seed = seed;
    }
    if args.max_moves.is_some() {
        cfg.selfplay.max_moves = args.max_moves;
    }
    if let Some(cap) = args.depth_cap {
        cfg.search.depth_cap = cap;
    }
    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new().num_threads(jobs).build_global()?;
    }
    if let Some(dir) = &args.out {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    info!(
        "self-play: games={} seed={} depth_cap={} chance={:?}",
        cfg.selfplay.games, cfg.selfplay.seed, cfg.search.depth_cap, cfg.search.chance
    );

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(u64::from(cfg.selfplay.games));
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} games ({eta}) {msg}")?
                .progress_chars("=>-"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    };

    let start = Instant::now();
    let outcomes: Vec<Outcome> = (0..cfg.selfplay.games)
        .into_par_iter()
        .map(|i| -> anyhow::Result<Outcome> {
            let seed = cfg.selfplay.seed.wrapping_add(u64::from(i));
            let (outcome, record) = play_one(seed, &cfg.search, cfg.selfplay.max_moves, args.out.is_some())?;
            if let (Some(dir), Some(record)) = (&args.out, record) {
                let path = trace_path(dir, seed);
                trace::write_record(&path, &record).with_context(|| format!("writing {}", path.display()))?;
            }
            pb.inc(1);
            pb.set_message(format!("last score {}", outcome.score));
            Ok(outcome)
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    pb.finish_and_clear();

    report(&outcomes, start.elapsed());
    Ok(())
}

fn play_one(
    seed: u64,
    search: &ExpectimaxConfig,
    max_moves: Option<u32>,
    record: bool,
) -> anyhow::Result<(Outcome, Option<GameRecord>)> {
    let mut expectimax = Expectimax::with_config(search.clone());
    let mut game = Game::new(StdRng::seed_from_u64(seed));
    // Separate stream so search draws never shift the real spawns.
    let mut search_rng = StdRng::seed_from_u64(seed.rotate_left(32) ^ 0x9e37_79b9_7f4a_7c15);
    let mut recorder = if record { Some(Recorder::new(seed, game.board())?) } else { None };
    let mut nodes: u64 = 0;

    while !game.is_over() {
        if max_moves.is_some_and(|limit| game.moves() >= limit) {
            break;
        }
        let Some(direction) = expectimax.best_move(game.board(), &mut search_rng) else { break };
        if !game.play(direction) {
            warn!("seed {seed}: agent chose a no-op move {direction}");
            break;
        }
        nodes = nodes.saturating_add(expectimax.last_stats().nodes);
        if let Some(rec) = recorder.as_mut() {
            rec.push(direction, game.board(), game.score())?;
        }
    }

    let outcome = Outcome {
        seed,
        score: game.score(),
        highest_tile: game.highest_tile(),
        moves: game.moves(),
        nodes,
    };
    Ok((outcome, recorder.map(Recorder::finish)))
}

fn trace_path(dir: &Path, seed: u64) -> PathBuf {
    dir.join(format!("game-{seed:020}.a2g"))
}

fn report(outcomes: &[Outcome], elapsed: Duration) {
    if outcomes.is_empty() {
        println!("No games played.");
        return;
    }
    let n = outcomes.len() as f64;
    let mean_score = outcomes.iter().map(|o| o.score as f64).sum::<f64>() / n;
    let total_moves: u64 = outcomes.iter().map(|o| u64::from(o.moves)).sum();
    let total_nodes: u64 = outcomes.iter().map(|o| o.nodes).sum();
    let best = outcomes.iter().max_by_key(|o| o.score);
    let mut tiles: Vec<u32> = outcomes.iter().map(|o| o.highest_tile).collect();
    tiles.sort_unstable();
    tiles.dedup();

    println!("Games: {} | elapsed: {:.1}s | moves/sec: {:.1}", outcomes.len(), elapsed.as_secs_f64(), total_moves as f64 / elapsed.as_secs_f64().max(1e-6));
    println!("Mean score: {:.1} | States considered: {}", mean_score, total_nodes);
    if let Some(best) = best {
        println!("Best: seed {} score {} tile {} in {} moves", best.seed, best.score, best.highest_tile, best.moves);
    }
    for tile in tiles {
        let reached = outcomes.iter().filter(|o| o.highest_tile >= tile).count();
        println!("  reached {:>6}: {:5.1}%", tile, 100.0 * reached as f64 / n);
    }
}
