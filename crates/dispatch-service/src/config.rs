//! # Configuration
//!
//! [`DispatchConfig`] is read from a TOML file. Every field has a default, so an empty
//! file (or no file at all) yields a working configuration:
//!
//! ```toml
//! worker_count = 4
//! channel_buffer = 64
//! poll_interval_ms = 25
//! priority_decimals = 2
//! ```

use dispatch_core::ranking::{DEFAULT_PRIORITY_DECIMALS, MAX_PRIORITY_DECIMALS};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Runtime settings for the dispatch system.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// Number of dispatch workers polling for couriers.
    pub worker_count: usize,
    /// Capacity of the dispatch actor's request channel.
    pub channel_buffer: usize,
    /// How long an idle worker sleeps before polling again.
    pub poll_interval_ms: u64,
    /// Decimal places kept in ranking priorities.
    pub priority_decimals: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            worker_count: 2,
            channel_buffer: 32,
            poll_interval_ms: 50,
            priority_decimals: DEFAULT_PRIORITY_DECIMALS,
        }
    }
}

impl DispatchConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::Invalid("worker_count must be at least 1".into()));
        }
        if self.channel_buffer == 0 {
            return Err(ConfigError::Invalid("channel_buffer must be at least 1".into()));
        }
        if self.priority_decimals > MAX_PRIORITY_DECIMALS {
            return Err(ConfigError::Invalid(format!(
                "priority_decimals must be at most {MAX_PRIORITY_DECIMALS}"
            )));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
