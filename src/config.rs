//! Armada configuration.
//!
//! Loaded from `~/.armada/config.toml` (or `--config`). Every key has a
//! default, so a missing file means a standard universe.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Armada configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Path of the `SQLite` store. Defaults to `~/.armada/universe.sqlite`.
    pub database: Option<PathBuf>,

    /// Player acting when `--player` and `ARMADA_PLAYER` are absent.
    pub player: Option<i64>,

    pub universe: UniverseConfig,
}

/// Shape and pacing of the universe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UniverseConfig {
    pub galaxies: u32,
    pub systems: u32,
    /// Planet slots per system.
    pub positions: u32,
    /// The slot past the last planet where expeditions head.
    pub expedition_position: u32,
    /// Galaxy 1 neighbours the last galaxy.
    pub donut_galaxy: bool,
    /// System 1 neighbours the last system.
    pub donut_system: bool,
    pub fleet_speed_war: u32,
    pub fleet_speed_holding: u32,
    pub fleet_speed_peaceful: u32,
    pub max_planets: u32,
    /// Share of destroyed ships' metal and crystal left as debris.
    pub debris_percent: u64,
    /// Share of a defeated planet's resources an attacker may carry off.
    pub loot_percent: u64,
    /// Mixed with mission ids to seed each mission's random outcomes.
    pub seed: u64,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            galaxies: 9,
            systems: 499,
            positions: 15,
            expedition_position: 16,
            donut_galaxy: true,
            donut_system: true,
            fleet_speed_war: 1,
            fleet_speed_holding: 1,
            fleet_speed_peaceful: 1,
            max_planets: 9,
            debris_percent: 30,
            loot_percent: 50,
            seed: 0x5EED,
        }
    }
}

impl Config {
    /// Load config from `path`, or from `~/.armada/config.toml` when `None`.
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::path) else {
            return Ok(Self::default());
        };

        let contents = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        Self::from_toml(&contents).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse { path, source },
            other => other,
        })
    }

    /// Parse and validate config from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.universe.validate()?;
        Ok(config)
    }

    /// The config file path: `~/.armada/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".armada").join("config.toml"))
    }
}

impl UniverseConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let sizes = [
            ("galaxies", self.galaxies),
            ("systems", self.systems),
            ("positions", self.positions),
            ("fleet-speed-war", self.fleet_speed_war),
            ("fleet-speed-holding", self.fleet_speed_holding),
            ("fleet-speed-peaceful", self.fleet_speed_peaceful),
            ("max-planets", self.max_planets),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::Invalid(format!("{name} must be at least 1")));
        }
        if self.expedition_position <= self.positions {
            return Err(ConfigError::Invalid(
                "expedition-position must lie past the last planet position".into(),
            ));
        }
        if self.debris_percent > 100 || self.loot_percent > 100 {
            return Err(ConfigError::Invalid(
                "debris-percent and loot-percent are percentages (0-100)".into(),
            ));
        }
        Ok(())
    }
}
