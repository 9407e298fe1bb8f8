//! Timed spawner feeding instances from a pool into the world
//!
//! Every attempt draws a kind (weighted or fixed), rolls an optional chance,
//! and picks a placement. Attempts made while the governor gate is closed are
//! skipped without touching the pool; the schedule keeps running either way.

use super::governor::SpawnGovernor;
use crate::events::Subscription;
use crate::foundation::math::{Rect, Vec2};
use crate::pool::{
    ConfigurationError, InstanceFactory, InstanceHandle, KindId, Pool, PoolResult, Poolable,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Attempts a single update may run before the remaining backlog is dropped
pub const MAX_CATCH_UP_ATTEMPTS: u32 = 64;

/// Where the spawned kind comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpawnSource {
    /// Weighted draw across the pool's kinds
    Weighted,
    /// Always the same kind
    Kind {
        /// Kind to acquire
        kind: KindId,
    },
}

/// When attempts happen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpawnSchedule {
    /// Fixed period
    Fixed {
        /// Seconds between attempts
        interval: f32,
    },
    /// Random period in `[min, max)`, re-rolled after every attempt
    Random {
        /// Shortest wait
        min: f32,
        /// Longest wait (exclusive)
        max: f32,
    },
}

/// Where spawned instances are placed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Placement {
    /// Always the same point
    Point {
        /// Spawn position
        position: Vec2,
    },
    /// A random pick from a list of spawn points
    Points {
        /// Candidate positions
        points: Vec<Vec2>,
    },
    /// A uniform random point inside a rectangle
    Area {
        /// Spawn rectangle
        area: Rect,
    },
}

impl Placement {
    fn sample(&self, rng: &mut StdRng) -> Vec2 {
        match self {
            Self::Point { position } => *position,
            Self::Points { points } => {
                if points.is_empty() {
                    Vec2::zeros()
                } else {
                    points[rng.gen_range(0..points.len())]
                }
            }
            Self::Area { area } => Vec2::new(
                sample_span(rng, area.min.x, area.max.x),
                sample_span(rng, area.min.y, area.max.y),
            ),
        }
    }
}

fn sample_span(rng: &mut StdRng, low: f32, high: f32) -> f32 {
    if high > low {
        rng.gen_range(low..high)
    } else {
        low
    }
}

fn default_chance() -> u8 {
    100
}

fn default_true() -> bool {
    true
}

/// # Spawner Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnerConfig {
    /// Name used in log output
    pub name: String,
    /// Kind selection
    pub source: SpawnSource,
    /// Attempt timing
    pub schedule: SpawnSchedule,
    /// Placement of spawned instances
    pub placement: Placement,
    /// Per-attempt success chance in percent
    #[serde(default = "default_chance")]
    pub chance_percent: u8,
    /// Skip attempts while the governor gate is closed
    #[serde(default = "default_true")]
    pub respect_governor: bool,
    /// Attempt once as soon as the spawner starts
    #[serde(default)]
    pub spawn_on_start: bool,
    /// Seed for interval, chance and placement rolls
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SpawnerConfig {
    /// Fixed-interval spawner of one kind at one point
    pub fn fixed(name: impl Into<String>, kind: impl Into<KindId>, interval: f32, position: Vec2) -> Self {
        Self {
            name: name.into(),
            source: SpawnSource::Kind { kind: kind.into() },
            schedule: SpawnSchedule::Fixed { interval },
            placement: Placement::Point { position },
            chance_percent: 100,
            respect_governor: true,
            spawn_on_start: false,
            seed: None,
        }
    }

    /// Draw kinds by weight instead
    pub fn weighted(mut self) -> Self {
        self.source = SpawnSource::Weighted;
        self
    }

    /// Replace the schedule
    pub fn with_schedule(mut self, schedule: SpawnSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Replace the placement
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Set the per-attempt chance
    pub fn with_chance(mut self, percent: u8) -> Self {
        self.chance_percent = percent;
        self
    }

    /// Fix the roll seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let invalid = |message: String| Err(ConfigurationError::Invalid(message));

        match self.schedule {
            SpawnSchedule::Fixed { interval } if !(interval.is_finite() && interval > 0.0) => {
                return invalid(format!("spawner '{}': interval must be positive", self.name));
            }
            SpawnSchedule::Random { min, max }
                if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) =>
            {
                return invalid(format!(
                    "spawner '{}': random interval needs 0 < min <= max, got [{}, {})",
                    self.name, min, max
                ));
            }
            _ => {}
        }

        if self.chance_percent > 100 {
            return invalid(format!(
                "spawner '{}': chance {}% exceeds 100",
                self.name, self.chance_percent
            ));
        }

        match &self.placement {
            Placement::Points { points } if points.is_empty() => {
                invalid(format!("spawner '{}': no spawn points", self.name))
            }
            Placement::Area { area } if !area.is_valid() => {
                invalid(format!("spawner '{}': invalid spawn area", self.name))
            }
            _ => Ok(()),
        }
    }
}

/// One successful spawn
#[derive(Debug, Clone, PartialEq)]
pub struct Spawned {
    /// Acquired instance
    pub handle: InstanceHandle,
    /// Its kind
    pub kind: KindId,
    /// Where to place it
    pub position: Vec2,
}

/// Spawner counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnerStats {
    /// Scheduled attempts
    pub attempts: u64,
    /// Attempts that acquired an instance
    pub spawned: u64,
    /// Attempts skipped by the governor
    pub skipped_gated: u64,
    /// Attempts lost to the chance roll
    pub skipped_chance: u64,
}

/// Timed, optionally governed spawner
pub struct Spawner {
    config: SpawnerConfig,
    gate: Option<Subscription<bool>>,
    spawnable: bool,
    until_next: f32,
    rng: StdRng,
    stats: SpawnerStats,
}

impl Spawner {
    /// Create a spawner from validated configuration
    pub fn new(config: SpawnerConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let until_next = if config.spawn_on_start {
            0.0
        } else {
            next_interval(&config.schedule, &mut rng)
        };
        log::debug!("Spawner '{}' created: {:?}", config.name, config.schedule);
        Ok(Self {
            config,
            gate: None,
            spawnable: true,
            until_next,
            rng,
            stats: SpawnerStats::default(),
        })
    }

    /// Follow a governor's spawnable flag
    pub fn attach(&mut self, governor: &mut SpawnGovernor) {
        self.spawnable = governor.is_spawnable();
        self.gate = Some(governor.subscribe());
    }

    /// Stop following the governor
    pub fn detach(&mut self) {
        self.gate = None;
        self.spawnable = true;
    }

    /// Run the schedule for `dt` seconds and return the spawns it produced.
    ///
    /// On error nothing stays acquired from this call.
    pub fn update<T, F>(&mut self, dt: f32, pool: &mut Pool<T, F>) -> PoolResult<Vec<Spawned>>
    where
        T: Poolable,
        F: InstanceFactory<T>,
    {
        if let Some(flag) = self.gate.as_ref().and_then(Subscription::latest) {
            self.spawnable = flag;
        }

        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let mut spawned: Vec<Spawned> = Vec::new();
        let mut attempts = 0;
        self.until_next -= dt;
        while self.until_next <= 0.0 {
            if attempts == MAX_CATCH_UP_ATTEMPTS {
                log::debug!(
                    "Spawner '{}' dropped backlog of {:.2}s after {} attempts",
                    self.config.name,
                    -self.until_next,
                    attempts
                );
                self.until_next = next_interval(&self.config.schedule, &mut self.rng);
                break;
            }
            attempts += 1;
            self.until_next += next_interval(&self.config.schedule, &mut self.rng);
            match self.attempt(pool) {
                Ok(Some(spawn)) => spawned.push(spawn),
                Ok(None) => {}
                Err(err) => {
                    // This frame's earlier spawns go back to the pool.
                    for spawn in spawned {
                        pool.release(spawn.handle);
                        self.stats.spawned -= 1;
                    }
                    return Err(err);
                }
            }
        }
        Ok(spawned)
    }

    fn attempt<T, F>(&mut self, pool: &mut Pool<T, F>) -> PoolResult<Option<Spawned>>
    where
        T: Poolable,
        F: InstanceFactory<T>,
    {
        self.stats.attempts += 1;

        if self.config.respect_governor && !self.spawnable {
            self.stats.skipped_gated += 1;
            log::trace!("Spawner '{}' gated", self.config.name);
            return Ok(None);
        }

        if self.config.chance_percent < 100
            && self.rng.gen_range(0..100u8) >= self.config.chance_percent
        {
            self.stats.skipped_chance += 1;
            return Ok(None);
        }

        let kind = match &self.config.source {
            SpawnSource::Weighted => pool.draw_kind()?,
            SpawnSource::Kind { kind } => kind.clone(),
        };
        let handle = pool.acquire(&kind)?;
        let position = self.config.placement.sample(&mut self.rng);
        self.stats.spawned += 1;
        log::trace!(
            "Spawner '{}' placed '{}' at ({:.2}, {:.2})",
            self.config.name,
            kind,
            position.x,
            position.y
        );

        Ok(Some(Spawned {
            handle,
            kind,
            position,
        }))
    }

    /// Whether the last gate value allows spawning
    pub fn is_spawnable(&self) -> bool {
        self.spawnable
    }

    /// Seconds until the next attempt
    pub fn until_next(&self) -> f32 {
        self.until_next
    }

    /// Spawner name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Configuration in use
    pub fn config(&self) -> &SpawnerConfig {
        &self.config
    }

    /// Counters since creation
    pub fn stats(&self) -> &SpawnerStats {
        &self.stats
    }
}

fn next_interval(schedule: &SpawnSchedule, rng: &mut StdRng) -> f32 {
    match *schedule {
        SpawnSchedule::Fixed { interval } => interval,
        SpawnSchedule::Random { min, max } => sample_span(rng, min, max),
    }
}
