//! # Pool Engine
//!
//! Instance lifecycle core for arcade-style games: pools of reusable
//! instances, weighted kind selection, governed spawners and lifetime
//! reclaiming, all driven from a single-threaded update loop.
//!
//! ## Features
//!
//! - **Multi-kind pools**: FIFO reuse per kind, growth on starvation
//! - **Weighted selection**: integer weights walked in insertion order
//! - **Spawners**: fixed or random schedules, placement, spawn chance
//! - **Spawn governor**: population ceiling broadcast to spawners
//! - **Reclaimer**: per-kind lifetime policies over a timer queue
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pool_engine::prelude::*;
//!
//! struct Bullet;
//!
//! impl Poolable for Bullet {
//!     fn set_active(&mut self, _active: bool) {}
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let factory = |_: &KindId| -> Result<Bullet, ConstructionError> { Ok(Bullet) };
//!     let mut pool: Pool<Bullet, _> = Pool::new("bullets", factory);
//!     pool.prewarm(&[PoolEntry::new("bullet", 32)])?;
//!
//!     let mut reclaimer = Reclaimer::new();
//!     reclaimer.set_policy("bullet", ReclaimPolicy::AfterDuration { seconds: 2.0 })?;
//!
//!     let kind = KindId::from("bullet");
//!     let handle = pool.acquire(&kind)?;
//!     reclaimer.arm(handle, &kind);
//!
//!     for _ in 0..180 {
//!         reclaimer.update(1.0 / 60.0, &mut pool);
//!     }
//!     assert!(!pool.is_active(handle));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;
pub mod config;
pub mod foundation;

// Instance lifecycle
pub mod pool;
pub mod events;
pub mod lifetime;
pub mod spawn;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        core::config::{Config, ConfigError, EngineConfig, GovernorConfig, PoolConfig},
        events::{Broadcaster, Event, EventBus, EventType, Subscription},
        foundation::{
            math::{Rect, Vec2},
            time::FrameClock,
        },
        lifetime::{ReclaimCause, ReclaimPolicy, ReclaimTrigger, Reclaimed, Reclaimer},
        pool::{
            ConfigurationError, ConstructionError, InstanceFactory, InstanceHandle, KindId, Pool,
            PoolEntry, PoolError, PoolResult, Poolable, ReleaseOutcome,
        },
        spawn::{Placement, SpawnGovernor, SpawnSchedule, SpawnSource, Spawner, SpawnerConfig},
    };
}
