//! # Core Engine Module
//!
//! Shared configuration types used by every subsystem.

pub mod config;

pub use config::{Config, ConfigError, ConfigFormat, EngineConfig, GovernorConfig, PoolConfig};
