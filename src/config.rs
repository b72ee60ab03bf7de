//! Configuration management for the ledger tools

use crate::error::ChainError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// File read by [`load_config`] when no explicit path is given.
pub const DEFAULT_CONFIG_PATH: &str = "ledger.toml";

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Number of replica chains in the availability scenario.
    #[serde(default = "default_replicas")]
    pub replicas: usize,
    /// Zero-based replica taken down and later recovered.
    #[serde(default = "default_failed_replica")]
    pub failed_replica: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            replicas: default_replicas(),
            failed_replica: default_failed_replica(),
        }
    }
}

fn default_filter() -> String {
    "info".to_string()
}

fn default_replicas() -> usize {
    3
}

fn default_failed_replica() -> usize {
    1
}

/// Load `ledger.toml` from the working directory, or defaults if absent.
pub fn load_config() -> Result<Config, ChainError> {
    load_config_from(DEFAULT_CONFIG_PATH)
}

/// Load configuration from `path`; a missing file yields the defaults.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config, ChainError> {
    let path = path.as_ref();
    let config = if path.exists() {
        let config_str = fs::read_to_string(path)?;
        toml::from_str(&config_str)?
    } else {
        Config::default()
    };

    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate critical values
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.logging.filter.trim().is_empty() {
            return Err(ChainError::ConfigError(
                "logging.filter must not be empty".to_string(),
            ));
        }
        if self.simulation.replicas < 2 {
            return Err(ChainError::ConfigError(format!(
                "simulation.replicas must be at least 2, got {}",
                self.simulation.replicas
            )));
        }
        if self.simulation.failed_replica >= self.simulation.replicas {
            return Err(ChainError::ConfigError(format!(
                "simulation.failed_replica must be below {}, got {}",
                self.simulation.replicas, self.simulation.failed_replica
            )));
        }
        Ok(())
    }
}
