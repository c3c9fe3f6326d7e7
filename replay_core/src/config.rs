//! Playback timing configuration.
//!
//! Loaded from `replay_config.json` with support for an environment
//! variable override, falling back to the embedded builtin.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;

pub const BUILTIN_REPLAY_CONFIG: &str = include_str!("data/replay_config.json");

/// Floor for the step animation duration, in milliseconds.
pub const MIN_ANIMATION_DURATION_MS: u64 = 50;

/// Timing parameters for the playback loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// How long one step's position interpolation runs.
    pub animation_duration_ms: u64,
    /// Gap between the end of one step animation and the next advance.
    /// When absent, derived as half the animation duration.
    pub pause_gap_ms: Option<u64>,
    /// Fixed short delay before the very first advance, so the initial
    /// frame appears immediately. Independent of the configured duration.
    pub bootstrap_delay_ms: u64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            animation_duration_ms: 300,
            pause_gap_ms: None,
            bootstrap_delay_ms: 50,
        }
    }
}

impl ReplayConfig {
    pub fn builtin() -> Self {
        serde_json::from_str(BUILTIN_REPLAY_CONFIG).expect("builtin replay config should parse")
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, ReplayConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ReplayConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = ReplayConfig::from_json_str(&contents)?;
        Ok(config)
    }

    /// Clamp to the duration floor and resolve the derived pause gap.
    pub fn normalized(mut self) -> Self {
        if self.animation_duration_ms < MIN_ANIMATION_DURATION_MS {
            self.animation_duration_ms = MIN_ANIMATION_DURATION_MS;
        }
        if self.pause_gap_ms.is_none() {
            self.pause_gap_ms = Some(self.animation_duration_ms / 2);
        }
        self
    }

    /// Override the animation duration (UI-provided value, floor applied).
    pub fn with_animation_duration_ms(mut self, ms: u64) -> Self {
        self.animation_duration_ms = ms.max(MIN_ANIMATION_DURATION_MS);
        self.pause_gap_ms = None;
        self
    }

    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_duration_ms)
    }

    pub fn pause_gap(&self) -> Duration {
        Duration::from_millis(
            self.pause_gap_ms
                .unwrap_or(self.animation_duration_ms / 2),
        )
    }

    /// Delay between two scheduled advances while playing.
    pub fn step_interval(&self) -> Duration {
        self.animation_duration() + self.pause_gap()
    }

    pub fn bootstrap_delay(&self) -> Duration {
        Duration::from_millis(self.bootstrap_delay_ms)
    }
}

#[derive(Debug, Error)]
pub enum ReplayConfigError {
    #[error("failed to parse replay config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read replay config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Load the replay configuration from the environment or default path.
pub fn load_replay_config_from_env() -> ReplayConfig {
    let override_path = env::var("REPLAY_CONFIG_PATH").ok().map(PathBuf::from);
    let default_path =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src/data/replay_config.json");

    let candidates: Vec<PathBuf> = match override_path {
        Some(ref path) => vec![path.clone()],
        None => vec![default_path],
    };

    for path in candidates {
        match ReplayConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!(
                    target: "swarm_replay::config",
                    path = %path.display(),
                    "replay_config.loaded=file"
                );
                return config.normalized();
            }
            Err(err) => {
                tracing::warn!(
                    target: "swarm_replay::config",
                    path = %path.display(),
                    error = %err,
                    "replay_config.load_failed"
                );
            }
        }
    }

    tracing::info!(target: "swarm_replay::config", "replay_config.loaded=builtin");
    ReplayConfig::builtin().normalized()
}
