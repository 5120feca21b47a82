use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use quizchess_core::{validate_chance, DepthBand, DifficultyBands, DifficultyError, Narratives};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

use crate::leaderboard::{HttpLeaderboard, InMemoryLeaderboard, Leaderboard, LeaderboardError};
use crate::session::SessionSettings;

/// Top-level configuration, usually read from a TOML file. Every section
/// and every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionConfig,
    pub difficulty: DifficultyConfig,
    pub engine: EngineConfig,
    pub leaderboard: LeaderboardConfig,
    pub narratives: Narratives,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid difficulty settings: {0}")]
    Difficulty(#[from] DifficultyError),
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub player_name: String,
    /// Fixed rng seed for reproducible sessions. Entropy when absent.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            player_name: "Player".to_string(),
            seed: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    pub correct: DepthBand,
    pub incorrect: DepthBand,
    pub easy_random_move_chance: f64,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        let bands = DifficultyBands::default();
        Self {
            correct: bands.correct(),
            incorrect: bands.incorrect(),
            easy_random_move_chance: 0.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub command: String,
    pub args: Vec<String>,
    pub timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: "stockfish".to_string(),
            args: Vec::new(),
            timeout_ms: 30_000,
        }
    }
}

impl EngineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    /// Base URL of the score service. Scores stay in memory when absent.
    pub url: Option<String>,
    pub top_n: usize,
    pub timeout_ms: u64,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            url: None,
            top_n: 10,
            timeout_ms: 5_000,
        }
    }
}

impl LeaderboardConfig {
    pub fn build(&self) -> Result<Arc<dyn Leaderboard>, LeaderboardError> {
        match &self.url {
            Some(url) => {
                let timeout = Duration::from_millis(self.timeout_ms);
                Ok(Arc::new(HttpLeaderboard::new(url.clone(), timeout)?))
            }
            None => Ok(Arc::new(InMemoryLeaderboard::new())),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses and validates a configuration.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.session_settings()?;
        Ok(config)
    }

    pub fn bands(&self) -> Result<DifficultyBands, ConfigError> {
        Ok(DifficultyBands::new(
            self.difficulty.correct,
            self.difficulty.incorrect,
        )?)
    }

    pub fn session_settings(&self) -> Result<SessionSettings, ConfigError> {
        Ok(SessionSettings {
            player_name: self.session.player_name.clone(),
            bands: self.bands()?,
            easy_random_move_chance: validate_chance(self.difficulty.easy_random_move_chance)?,
            narratives: self.narratives.clone(),
        })
    }

    pub fn rng(&self) -> ChaCha8Rng {
        match self.session.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }
}
