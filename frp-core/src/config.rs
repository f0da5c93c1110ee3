//! Engine configuration.
//!
//! Configuration is plain data deserialized from JSON. Missing fields fall
//! back to their defaults, so an empty object is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default minimum interval between throttled deliveries.
pub const DEFAULT_THROTTLE_INTERVAL_MS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum interval, in milliseconds, for throttled signals.
    pub throttle_interval_ms: u64,

    /// Prefix under which persistent settings are stored.
    pub settings_namespace: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            throttle_interval_ms: DEFAULT_THROTTLE_INTERVAL_MS,
            settings_namespace: "settings".to_string(),
        }
    }
}

impl Config {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.settings_namespace.trim().is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        Ok(())
    }

    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle_interval_ms)
    }

    /// Storage key for a named setting.
    pub fn setting_key(&self, name: &str) -> String {
        format!("{}.{}", self.settings_namespace, name)
    }
}
