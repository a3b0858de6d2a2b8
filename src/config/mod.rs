//! TOML configuration for the postfetch pipeline
//!
//! Configuration is normally assembled by the surrounding proxy and handed
//! to this crate already parsed. [`PostfetchConfig::load`] and
//! [`PostfetchConfig::discover`] exist for embedders that keep a dedicated
//! configuration file.

mod error;

pub use error::{ConfigError, ConfigResult};

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the local statistics database
pub const DEFAULT_STATS_DB_FILE: &str = "./warcprox-stats.db";
/// Default database name on the distributed store
pub const DEFAULT_STATS_DB: &str = "warcprox";
/// Default table name on the distributed store
pub const DEFAULT_STATS_TABLE: &str = "stats";
/// Default shard and replica factor on the distributed store
pub const DEFAULT_SHARDS: u32 = 3;
pub const DEFAULT_REPLICAS: u32 = 3;

/// Top level configuration document
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PostfetchConfig {
    pub logging: LoggingConfig,
    pub stages: StageConfig,
    pub stats: Option<StatsConfig>,
}

/// `[logging]` table
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// flexi_logger spec, e.g. `info` or `info,postfetch::stats=debug`
    pub level: String,
    /// `text`, `ext` or `json`
    pub format: String,
    pub file: Option<PathBuf>,
    pub color: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            file: None,
            color: false,
        }
    }
}

/// `[stages]` table: timings shared by every stage loop
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StageConfig {
    pub poll_timeout_ms: u64,
    pub error_backoff_ms: u64,
    pub profile: bool,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: 500,
            error_backoff_ms: 500,
            profile: false,
        }
    }
}

impl StageConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }
}

/// `[stats]` table, tagged by `backend`
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StatsConfig {
    Local {
        #[serde(default = "default_stats_db_file")]
        path: PathBuf,
    },
    Distributed {
        servers: Vec<String>,
        #[serde(default = "default_stats_db")]
        db: String,
        #[serde(default = "default_stats_table")]
        table: String,
        #[serde(default = "default_shards")]
        shards: u32,
        #[serde(default = "default_replicas")]
        replicas: u32,
    },
}

fn default_stats_db_file() -> PathBuf {
    PathBuf::from(DEFAULT_STATS_DB_FILE)
}

fn default_stats_db() -> String {
    DEFAULT_STATS_DB.to_string()
}

fn default_stats_table() -> String {
    DEFAULT_STATS_TABLE.to_string()
}

fn default_shards() -> u32 {
    DEFAULT_SHARDS
}

fn default_replicas() -> u32 {
    DEFAULT_REPLICAS
}

impl PostfetchConfig {
    /// Parse a configuration document and validate it
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(contents).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file that must exist
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents).map_err(|e| e.in_file(path))
    }

    /// Default configuration file location, `<config dir>/Postfetch/postfetch.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("Postfetch").join("postfetch.toml"))
    }

    /// Load the given file, or the default file if it exists, or defaults
    pub fn discover(config_file: Option<&Path>) -> ConfigResult<Self> {
        match config_file {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        if !matches!(self.logging.format.as_str(), "text" | "ext" | "json") {
            return Err(ConfigError::Invalid {
                message: format!(
                    "logging.format must be one of text, ext, json (got '{}')",
                    self.logging.format
                ),
            });
        }
        if self.stages.poll_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                message: "stages.poll_timeout_ms must be greater than zero".to_string(),
            });
        }
        if let Some(StatsConfig::Distributed {
            servers,
            shards,
            replicas,
            ..
        }) = &self.stats
        {
            if servers.is_empty() {
                return Err(ConfigError::Invalid {
                    message: "stats.servers must list at least one server".to_string(),
                });
            }
            if *shards == 0 || *replicas == 0 {
                return Err(ConfigError::Invalid {
                    message: "stats.shards and stats.replicas must be greater than zero"
                        .to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
