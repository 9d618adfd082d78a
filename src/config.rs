//! Configuration for the roster service
//!
//! Values come from a TOML file when one is given, otherwise from `ONCALL_*`
//! environment variables with defaults for anything unset.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::schedule::{HolidayDistance, OrderingKind, DEFAULT_RECENCY_WINDOW};
use crate::store::RunOptions;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub scheduling: SchedulingConfig,
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Where the roster files live
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
        }
    }
}

/// Scheduling knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Days after a shift during which the doctor is penalised
    pub recency_window: i64,

    pub holiday_distance: HolidayDistance,

    pub ordering: OrderingKind,

    /// Fixed seed for reproducible rosters
    pub seed: Option<u64>,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            recency_window: DEFAULT_RECENCY_WINDOW,
            holiday_distance: HolidayDistance::Occurrences,
            ordering: OrderingKind::RankSum,
            seed: None,
        }
    }
}

impl SchedulingConfig {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            recency_window: self.recency_window,
            holiday_distance: self.holiday_distance,
            ordering: self.ordering,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("ONCALL_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("ONCALL_PORT") {
            config.server.port = port.parse().context("ONCALL_PORT must be a port number")?;
        }
        if let Ok(dir) = std::env::var("ONCALL_DATA_DIR") {
            config.data.dir = PathBuf::from(dir);
        }
        if let Ok(window) = std::env::var("ONCALL_RECENCY_WINDOW") {
            config.scheduling.recency_window =
                window.parse().context("ONCALL_RECENCY_WINDOW must be an integer")?;
        }
        if let Ok(unit) = std::env::var("ONCALL_HOLIDAY_DISTANCE") {
            config.scheduling.holiday_distance = match unit.to_lowercase().as_str() {
                "days" => HolidayDistance::Days,
                "occurrences" => HolidayDistance::Occurrences,
                other => bail!("ONCALL_HOLIDAY_DISTANCE must be 'days' or 'occurrences', got '{}'", other),
            };
        }
        if let Ok(ordering) = std::env::var("ONCALL_ORDERING") {
            config.scheduling.ordering = match ordering.to_lowercase().as_str() {
                "rank_sum" => OrderingKind::RankSum,
                "chronological" => OrderingKind::Chronological,
                other => bail!("ONCALL_ORDERING must be 'rank_sum' or 'chronological', got '{}'", other),
            };
        }
        if let Ok(seed) = std::env::var("ONCALL_SEED") {
            config.scheduling.seed = Some(seed.parse().context("ONCALL_SEED must be an unsigned integer")?);
        }
        if let Ok(level) = std::env::var("ONCALL_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("ONCALL_LOG_FORMAT") {
            config.logging.format = format;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// File if given, environment otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::from_env(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("server.port must be greater than 0");
        }
        if self.scheduling.recency_window < 1 {
            bail!("scheduling.recency_window must be at least 1");
        }
        if !matches!(self.logging.format.as_str(), "text" | "json") {
            bail!("logging.format must be 'text' or 'json'");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.scheduling.recency_window, 8);
        assert_eq!(config.scheduling.holiday_distance, HolidayDistance::Occurrences);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [scheduling]
            holiday_distance = "days"
            ordering = "chronological"
            seed = 42
            "#,
        )
        .unwrap();

        assert_eq!(config.scheduling.holiday_distance, HolidayDistance::Days);
        assert_eq!(config.scheduling.ordering, OrderingKind::Chronological);
        assert_eq!(config.scheduling.seed, Some(42));
        assert_eq!(config.scheduling.recency_window, 8);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Config::from_toml("[server]\nport = 0\n").is_err());
        assert!(Config::from_toml("[scheduling]\nrecency_window = 0\n").is_err());
        assert!(Config::from_toml("[logging]\nformat = \"xml\"\n").is_err());
        assert!(Config::from_toml("[scheduling]\nholiday_distance = \"weeks\"\n").is_err());
    }

    #[test]
    fn test_run_options_follow_config() {
        let mut config = Config::default();
        config.scheduling.recency_window = 5;
        let options = config.scheduling.run_options();
        assert_eq!(options.recency_window, 5);
        assert_eq!(options.ordering, OrderingKind::RankSum);
    }
}
