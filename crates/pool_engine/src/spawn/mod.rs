//! # Spawning
//!
//! Timed spawners that pull instances from a pool, and the governor that
//! halts them while the population is over its ceiling.

pub mod governor;
pub mod spawner;

pub use governor::SpawnGovernor;
pub use spawner::{
    Placement, SpawnSchedule, SpawnSource, Spawned, Spawner, SpawnerConfig, SpawnerStats,
};
