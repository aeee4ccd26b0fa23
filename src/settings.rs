//! Runner settings
//!
//! Loaded from a JSON file; every field is optional and falls back to its
//! default, so a partial file is fine.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Headless runner settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seed for enemy targeting and mystery rewards
    pub seed: u64,
    /// Virtual clock advance per tick (ms)
    pub tick_ms: u64,
    /// Stop after this many ticks
    pub max_ticks: u64,
    /// Let the demo driver play instead of idling
    pub autopilot: bool,
    /// Print a JSON snapshot every N ticks (0 = never)
    pub snapshot_every: u64,
    /// Stop once this many games have ended (0 = no limit)
    pub max_games: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            tick_ms: 16,
            max_ticks: 60 * 60 * 5,
            autopilot: true,
            snapshot_every: 0,
            max_games: 1,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load from `path` if given, logging and falling back to defaults on error
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            log::info!("Using default settings");
            return Self::default();
        };
        match Self::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("{err}; using default settings");
                Self::default()
            }
        }
    }
}
