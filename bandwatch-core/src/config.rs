//! Serializable monitor configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config.
//! Credentials never live here; the CLI reads them from the environment.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::components::summary::DEFAULT_EMIT_INTERVAL;
use crate::domain::{BarInterval, DEFAULT_CAPACITY};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Where alerts are delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertConfig {
    /// Print to stdout and the log.
    #[default]
    Log,

    /// Twilio Messages API; `from` / `to` like `whatsapp:+14155238886`.
    Twilio { from: String, to: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    /// Instrument, e.g. "BTC/USDT".
    pub symbol: String,

    /// Bar timeframe.
    pub interval: BarInterval,

    /// Bars kept in the price window.
    pub capacity: usize,

    /// Minimum spacing between summary reports.
    pub summary_interval_secs: u64,

    /// Sleep between polling cycles.
    pub poll_interval_secs: u64,

    pub alert: AlertConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            symbol: "BTC/USDT".to_string(),
            interval: BarInterval::OneMinute,
            capacity: DEFAULT_CAPACITY,
            summary_interval_secs: DEFAULT_EMIT_INTERVAL.as_secs(),
            poll_interval_secs: 10,
            alert: AlertConfig::Log,
        }
    }
}

impl MonitorConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("symbol must not be empty".into()));
        }
        if self.capacity == 0 {
            return Err(ConfigError::Invalid("capacity must be >= 1".into()));
        }
        if self.summary_interval_secs == 0 {
            return Err(ConfigError::Invalid("summary_interval_secs must be >= 1".into()));
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid("poll_interval_secs must be >= 1".into()));
        }
        if let AlertConfig::Twilio { from, to } = &self.alert {
            if from.trim().is_empty() || to.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "twilio alerts need both `from` and `to`".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn summary_interval(&self) -> Duration {
        Duration::from_secs(self.summary_interval_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
