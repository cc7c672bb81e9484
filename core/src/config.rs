//! Engine configuration, loaded from YAML.
//!
//! ```yaml
//! stats_file: players_stats.yml
//! flush_interval_ms: 5000
//! display_name_key: Username
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StatsError};


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path of the stats document. Relative paths are resolved against
    /// the directory the config was loaded from.
    #[serde(default = "default_stats_file")]
    pub stats_file: PathBuf,

    /// Period of the background flush.
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Stat key holding an entity's display name.
    #[serde(default = "default_display_name_key")]
    pub display_name_key: String,
}

fn default_stats_file() -> PathBuf {
    PathBuf::from("players_stats.yml")
}

fn default_flush_interval_ms() -> u64 {
    5000
}

fn default_display_name_key() -> String {
    "Username".into()
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            stats_file: default_stats_file(),
            flush_interval_ms: default_flush_interval_ms(),
            display_name_key: default_display_name_key(),
        }
    }
}

impl EngineConfig {
    /// Load from a YAML file, resolving a relative `stats_file` against
    /// the file's directory.
    pub fn load(path: &Path) -> Result<EngineConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| StatsError::Config(format!("cannot read '{}': {}", path.display(), e)))?;
        let mut config = Self::parse(&content)?;
        if config.stats_file.is_relative() {
            if let Some(dir) = path.parent() {
                config.stats_file = dir.join(&config.stats_file);
            }
        }
        Ok(config)
    }

    /// Parse from a YAML string. Missing fields take their defaults.
    pub fn parse(content: &str) -> Result<EngineConfig> {
        if content.trim().is_empty() {
            return Ok(EngineConfig::default());
        }
        let config: EngineConfig = serde_yaml::from_str(content)
            .map_err(|e| StatsError::Config(format!("invalid engine config: {}", e)))?;
        if config.flush_interval_ms == 0 {
            return Err(StatsError::Config(
                "flush_interval_ms must be greater than zero".into(),
            ));
        }
        if config.display_name_key.trim().is_empty() {
            return Err(StatsError::Config("display_name_key must not be empty".into()));
        }
        Ok(config)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}
