//! # Engine Configuration
//!
//! Serializable settings for the pooling core: logging, randomness, pool
//! contents and spawn governance. Every struct offers `validate()` returning
//! a [`ConfigurationError`], and builder-style setters for use from code.

use crate::pool::{validate_entries, ConfigurationError, PoolEntry};
use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError, ConfigFormat};

/// # Engine Configuration
///
/// Session-wide settings shared by every subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log level, overridable through `RUST_LOG`
    pub log_level: String,
    /// Master seed; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            seed: None,
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Fix the master seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Derive a per-subsystem seed so subsystems do not share a sequence
    pub fn derive_seed(&self, stream: u64) -> Option<u64> {
        self.seed
            .map(|seed| seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Pool Configuration
///
/// Contents of one pool: its kinds, their prewarm counts and draw weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Pool name used in log output
    pub name: String,
    /// Seed for weighted draws
    #[serde(default)]
    pub seed: Option<u64>,
    /// Kinds in weighted walk order
    #[serde(default)]
    pub entries: Vec<PoolEntry>,
}

impl PoolConfig {
    /// Create an empty pool configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            seed: None,
            entries: Vec::new(),
        }
    }

    /// Append a kind
    pub fn with_entry(mut self, entry: PoolEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Fix the draw seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sum of all entry weights
    pub fn total_weight(&self) -> u64 {
        self.entries.iter().map(|entry| u64::from(entry.weight)).sum()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.name.is_empty() {
            return Err(ConfigurationError::Invalid("pool name cannot be empty".to_string()));
        }
        validate_entries(&self.entries)
    }
}

/// # Spawn Governor Configuration
///
/// Population ceiling and how often the governor re-checks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    /// Spawning stays enabled while the active count is at or below this
    pub ceiling: usize,
    /// Seconds between polls
    pub poll_interval: f32,
}

impl GovernorConfig {
    /// Create a governor configuration
    pub fn new(ceiling: usize, poll_interval: f32) -> Self {
        Self {
            ceiling,
            poll_interval,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.poll_interval.is_finite() || self.poll_interval <= 0.0 {
            return Err(ConfigurationError::Invalid(format!(
                "governor poll interval must be positive, got {}",
                self.poll_interval
            )));
        }
        Ok(())
    }
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self::new(10, 1.0)
    }
}

impl Config for EngineConfig {
    fn validate(&self) -> Result<(), ConfigurationError> {
        self.log_level
            .parse::<log::LevelFilter>()
            .map(|_| ())
            .map_err(|_| ConfigurationError::Invalid(format!("unknown log level '{}'", self.log_level)))
    }
}

impl Config for PoolConfig {
    fn validate(&self) -> Result<(), ConfigurationError> {
        Self::validate(self)
    }
}

impl Config for GovernorConfig {
    fn validate(&self) -> Result<(), ConfigurationError> {
        Self::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_from_toml() {
        let config: PoolConfig = toml::from_str(
            r#"
            name = "tabs"
            seed = 3

            [[entries]]
            kind_id = "basic"
            initial_count = 8
            weight = 3

            [[entries]]
            kind_id = "explosive"
            initial_count = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.entries.len(), 2);
        assert_eq!(config.total_weight(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pool_config_requires_name() {
        assert!(PoolConfig::default().validate().is_err());
    }

    #[test]
    fn test_governor_rejects_zero_interval() {
        assert!(GovernorConfig::new(10, 0.0).validate().is_err());
        assert!(GovernorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_engine_config_rejects_unknown_level() {
        assert!(Config::validate(&EngineConfig::new().with_log_level("loud")).is_err());
        assert!(Config::validate(&EngineConfig::new().with_log_level("debug")).is_ok());
    }

    #[test]
    fn test_derived_seeds_differ_per_stream() {
        let config = EngineConfig::new().with_seed(11);
        assert_ne!(config.derive_seed(1), config.derive_seed(2));
        assert_eq!(EngineConfig::new().derive_seed(1), None);
    }
}
