//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types for world placement
//! - Generational instance keys
//! - Simulated frame time
//! - Logging utilities

pub mod math;
pub mod collections;
pub mod time;
pub mod logging;
