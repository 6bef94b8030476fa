//! Configuration for the binaries, read from `Agent.toml`.
//!
//! Every field has a default, so a partial file (or none at all) is fine:
//!
//! ```toml
//! [search]
//! depth_cap = 6
//! chance = "exhaustive"
//!
//! [selfplay]
//! games = 32
//! seed = 7
//! ```

use std::fs;
use std::io;
use std::path::Path;

use log::{info, warn};
use serde::Deserialize;

use crate::expectimax::ExpectimaxConfig;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "Agent.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: ExpectimaxConfig,
    pub selfplay: SelfPlayConfig,
}

/// Batch self-play parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SelfPlayConfig {
    pub games: u32,
    /// Game `i` is seeded with `seed + i`.
    pub seed: u64,
    /// Stop a game after this many moves.
    pub max_moves: Option<u32>,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self { games: 8, seed: 0, max_moves: None }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Config {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Load [`CONFIG_FILE`] if present, otherwise fall back to defaults.
    pub fn load_or_default() -> Self {
        let path = Path::new(CONFIG_FILE);
        if !path.exists() {
            return Self::default();
        }
        match Self::from_path(path) {
            Ok(cfg) => {
                info!("loaded configuration from {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("ignoring {}: {e}", path.display());
                Self::default()
            }
        }
    }
}
