//! # Tab Arena
//!
//! Arcade arena built on `pool_engine`: shooters fire bullets in fixed
//! direction patterns at tabs that a governed spawner drops in from spawn
//! points. Every bullet, tab, particle and explosion is pooled.

#![warn(missing_docs)]

pub mod arena;
pub mod components;
pub mod config;
pub mod prefabs;

pub use arena::{Arena, ArenaError, ArenaResult, ArenaSummary};
pub use config::ArenaConfig;
