//! Arena configuration
//!
//! Loaded from TOML or RON through [`Config`]; every section has defaults so
//! a file only needs the values it changes.

use crate::components::{BulletDirections, TabKind};
use pool_engine::core::config::{Config, EngineConfig, GovernorConfig, PoolConfig};
use pool_engine::foundation::math::{Rect, Vec2};
use pool_engine::lifetime::{ReclaimPolicy, ReclaimTrigger};
use pool_engine::pool::{ConfigurationError, KindId, PoolEntry};
use pool_engine::spawn::{Placement, SpawnSource, SpawnerConfig};
use serde::{Deserialize, Serialize};

/// Kind id of the single bullet kind
pub const BULLET_KIND: &str = "bullet";
/// Kind id of death particles
pub const PARTICLE_KIND: &str = "death_particle";
/// Kind id of explosions
pub const EXPLOSION_KIND: &str = "explosion";

/// Arena configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Logging and seed
    pub engine: EngineConfig,
    /// Run length
    pub simulation: SimulationConfig,
    /// Playfield
    pub world: WorldConfig,
    /// Shooter and bullet pool
    pub bullets: BulletsConfig,
    /// Tab pool, spawner and governor
    pub tabs: TabsConfig,
    /// Particles and explosions
    pub effects: EffectsConfig,
    /// Simulated cursor dragging of explosive tabs
    pub drag: DragConfig,
}

/// Simulation length and timestep
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Frames to run
    pub frames: u32,
    /// Seconds per frame
    pub timestep: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            frames: 1800,
            timestep: 1.0 / 60.0,
        }
    }
}

/// Playfield layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Visible area; bullets outside it are gone
    pub bounds: Rect,
    /// Point tabs walk toward
    pub target: Vec2,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            bounds: Rect::centered(10.0, 7.5),
            target: Vec2::zeros(),
        }
    }
}

/// Shooter and bullet settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletsConfig {
    /// Prewarmed bullets
    pub pool_size: i32,
    /// Units per second
    pub speed: f32,
    /// Damage per hit
    pub damage: i32,
    /// Directions each shooter fires in
    pub directions: BulletDirections,
    /// Seconds between volleys
    pub fire_interval: f32,
    /// Shooter positions
    pub shooters: Vec<Vec2>,
}

impl Default for BulletsConfig {
    fn default() -> Self {
        Self {
            pool_size: 32,
            speed: 6.0,
            damage: 1,
            directions: BulletDirections::all(),
            fire_interval: 0.5,
            shooters: vec![Vec2::zeros()],
        }
    }
}

/// Explosive tab settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplosiveConfig {
    /// Starting health
    pub health: i32,
    /// Telegraph between death and explosion
    pub death_delay: f32,
    /// Seconds until self-destruction
    pub fuse: f32,
}

impl Default for ExplosiveConfig {
    fn default() -> Self {
        Self {
            health: 3,
            death_delay: 1.0,
            fuse: 5.0,
        }
    }
}

/// Tab pool, spawning and movement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TabsConfig {
    /// Kinds, counts and weights
    pub pool: PoolConfig,
    /// Spawner feeding the pool into the world
    pub spawner: SpawnerConfig,
    /// Population ceiling (`max_tabs`)
    pub governor: GovernorConfig,
    /// Walking speed of basic tabs
    pub speed: f32,
    /// Starting health of basic tabs
    pub basic_health: i32,
    /// Distance at which a bullet hits a tab
    pub contact_radius: f32,
    /// Explosive variant
    pub explosive: ExplosiveConfig,
}

impl Default for TabsConfig {
    fn default() -> Self {
        let spawn_points = vec![
            Vec2::new(-8.0, 6.0),
            Vec2::new(8.0, 6.0),
            Vec2::new(-8.0, -6.0),
            Vec2::new(8.0, -6.0),
        ];
        let mut spawner = SpawnerConfig::fixed("tabs", TabKind::Basic.as_str(), 1.0, Vec2::zeros())
            .weighted()
            .with_placement(Placement::Points {
                points: spawn_points,
            });
        spawner.spawn_on_start = true;

        Self {
            pool: PoolConfig::new("tabs")
                .with_entry(PoolEntry::new(TabKind::Basic.as_str(), 8).with_weight(3))
                .with_entry(PoolEntry::new(TabKind::Explosive.as_str(), 2)),
            spawner,
            governor: GovernorConfig::default(),
            speed: 1.5,
            basic_health: 2,
            contact_radius: 0.5,
            explosive: ExplosiveConfig::default(),
        }
    }
}

/// Particles and explosions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    /// Prewarmed death particles
    pub particle_pool: i32,
    /// Seconds a particle burst lasts
    pub particle_lifetime: f32,
    /// Prewarmed explosions
    pub explosion_pool: i32,
    /// Seconds an explosion lasts
    pub explosion_lifetime: f32,
    /// Blast radius
    pub explosion_radius: f32,
    /// Damage to tabs caught in the blast
    pub explosion_damage: i32,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            particle_pool: 8,
            particle_lifetime: 0.5,
            explosion_pool: 4,
            explosion_lifetime: 2.0,
            explosion_radius: 2.0,
            explosion_damage: 2,
        }
    }
}

/// Simulated dragging of explosive tabs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Whether the cursor picks tabs up at all
    pub enabled: bool,
    /// Seconds between grabs
    pub interval: f32,
    /// Seconds a tab is held
    pub hold: f32,
    /// Where the cursor carries a held tab
    pub cursor: Vec2,
    /// Carry speed in units per second
    pub carry_speed: f32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: 4.0,
            hold: 1.5,
            cursor: Vec2::new(0.0, -6.0),
            carry_speed: 6.0,
        }
    }
}

fn require_positive(name: &str, value: f32) -> Result<(), ConfigurationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::Invalid(format!(
            "{name} must be positive, got {value}"
        )))
    }
}

impl ArenaConfig {
    /// Pool configuration of the bullet pool
    pub fn bullet_pool(&self) -> PoolConfig {
        PoolConfig::new("bullets").with_entry(PoolEntry::new(BULLET_KIND, self.bullets.pool_size))
    }

    /// Pool configuration of the particle pool
    pub fn particle_pool(&self) -> PoolConfig {
        PoolConfig::new("death_particles")
            .with_entry(PoolEntry::new(PARTICLE_KIND, self.effects.particle_pool))
    }

    /// Pool configuration of the explosion pool
    pub fn explosion_pool(&self) -> PoolConfig {
        PoolConfig::new("explosions")
            .with_entry(PoolEntry::new(EXPLOSION_KIND, self.effects.explosion_pool))
    }

    /// Lifetime policy of every kind in the arena
    pub fn reclaim_policies(&self) -> Vec<(KindId, ReclaimPolicy)> {
        vec![
            (
                KindId::from(BULLET_KIND),
                ReclaimPolicy::FirstTrigger {
                    triggers: vec![ReclaimTrigger::Collision, ReclaimTrigger::LeftView],
                },
            ),
            (
                TabKind::Basic.kind_id(),
                ReclaimPolicy::OnDeath {
                    delay: 0.0,
                    fuse: None,
                },
            ),
            (
                TabKind::Explosive.kind_id(),
                ReclaimPolicy::OnDeath {
                    delay: self.tabs.explosive.death_delay,
                    fuse: Some(self.tabs.explosive.fuse),
                },
            ),
            (
                KindId::from(PARTICLE_KIND),
                ReclaimPolicy::AfterDuration {
                    seconds: self.effects.particle_lifetime,
                },
            ),
            (
                KindId::from(EXPLOSION_KIND),
                ReclaimPolicy::AfterDuration {
                    seconds: self.effects.explosion_lifetime,
                },
            ),
        ]
    }
}

impl Config for ArenaConfig {
    fn validate(&self) -> Result<(), ConfigurationError> {
        Config::validate(&self.engine)?;
        require_positive("simulation.timestep", self.simulation.timestep)?;
        if !self.world.bounds.is_valid() {
            return Err(ConfigurationError::Invalid("world.bounds is not a valid rectangle".into()));
        }

        require_positive("bullets.speed", self.bullets.speed)?;
        require_positive("bullets.fire_interval", self.bullets.fire_interval)?;
        self.bullet_pool().validate()?;

        self.tabs.pool.validate()?;
        if let Some(entry) = self
            .tabs
            .pool
            .entries
            .iter()
            .find(|entry| TabKind::from_kind(&entry.kind_id).is_none())
        {
            return Err(ConfigurationError::UnknownKind(entry.kind_id.clone()));
        }
        if let SpawnSource::Kind { kind } = &self.tabs.spawner.source {
            if TabKind::from_kind(kind).is_none() {
                return Err(ConfigurationError::UnknownKind(kind.clone()));
            }
        }
        if matches!(self.tabs.spawner.source, SpawnSource::Weighted)
            && self.tabs.pool.total_weight() == 0
        {
            return Err(ConfigurationError::ZeroTotalWeight);
        }
        self.tabs.spawner.validate()?;
        self.tabs.governor.validate()?;
        require_positive("tabs.contact_radius", self.tabs.contact_radius)?;

        self.particle_pool().validate()?;
        self.explosion_pool().validate()?;
        for (_, policy) in self.reclaim_policies() {
            policy.validate()?;
        }

        if self.drag.enabled {
            require_positive("drag.interval", self.drag.interval)?;
            require_positive("drag.hold", self.drag.hold)?;
            require_positive("drag.carry_speed", self.drag.carry_speed)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pool_engine::core::config::ConfigFormat;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ArenaConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ArenaConfig::from_str_as(
            r#"
            [engine]
            seed = 42

            [bullets]
            directions = "UP | DOWN"

            [tabs.governor]
            ceiling = 4
            "#,
            ConfigFormat::Toml,
        )
        .unwrap();
        assert_eq!(config.engine.seed, Some(42));
        assert_eq!(config.bullets.directions, BulletDirections::UP | BulletDirections::DOWN);
        assert_eq!(config.tabs.governor.ceiling, 4);
        assert_eq!(config.tabs.pool.entries.len(), 2);
    }

    #[test]
    fn test_rejects_unknown_tab_kind() {
        let mut config = ArenaConfig::default();
        config.tabs.pool = config.tabs.pool.with_entry(PoolEntry::new("boss", 1));
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::UnknownKind(KindId::from("boss")))
        );
    }

    #[test]
    fn test_rejects_zero_weight_pool() {
        let mut config = ArenaConfig::default();
        for entry in &mut config.tabs.pool.entries {
            entry.weight = 0;
        }
        assert_eq!(config.validate(), Err(ConfigurationError::ZeroTotalWeight));
    }

    #[test]
    fn test_rejects_negative_pool_size() {
        let mut config = ArenaConfig::default();
        config.bullets.pool_size = -1;
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::NegativeInitialCount { .. })
        ));
    }

    #[test]
    fn test_written_toml_loads_back() {
        let config = ArenaConfig::default();
        let text = config.to_string_as(ConfigFormat::Toml).unwrap();
        let parsed = ArenaConfig::from_str_as(&text, ConfigFormat::Toml).unwrap();
        assert_eq!(parsed.tabs.pool, config.tabs.pool);
    }
}
