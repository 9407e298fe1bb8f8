//! Arena simulation
//!
//! One [`Arena::step`] is one frame:
//!
//! 1. governor poll, tab spawner, shooter volley
//! 2. cursor drag of explosive tabs
//! 3. movement, bounds and contact checks, which emit events
//! 4. event dispatch into the reclaimers
//! 5. reclaimer timers (fuses, telegraphs, effect lifetimes)

use crate::components::{
    Bullet, Damageable, DeathParticle, Draggable, Explosion, Tab, TabKind,
};
use crate::config::{ArenaConfig, BULLET_KIND, EXPLOSION_KIND, PARTICLE_KIND};
use crate::prefabs::{BulletPrefab, ExplosionPrefab, ParticlePrefab, TabPrefab};
use pool_engine::core::config::{Config, ConfigError, PoolConfig};
use pool_engine::events::{Event, EventBus, EventType, Subscription};
use pool_engine::foundation::math::Vec2;
use pool_engine::foundation::time::FrameClock;
use pool_engine::lifetime::{ReclaimCause, ReclaimTrigger, Reclaimed, Reclaimer};
use pool_engine::pool::{
    ConfigurationError, InstanceFactory, InstanceHandle, KindId, Pool, PoolError, PoolStats,
    Poolable,
};
use pool_engine::spawn::{SpawnGovernor, Spawner, SpawnerStats};
use std::collections::HashMap;

/// Arena errors
#[derive(thiserror::Error, Debug)]
pub enum ArenaError {
    /// Pool setup or growth failed
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// Invalid settings
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Configuration file could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for arena operations
pub type ArenaResult<T> = Result<T, ArenaError>;

/// Counters gathered while the arena runs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArenaSummary {
    /// Frames simulated
    pub frames: u64,
    /// Simulated seconds
    pub elapsed: f64,
    /// Bullets fired
    pub bullets_fired: u64,
    /// Bullets that hit a tab
    pub bullet_hits: u64,
    /// Tabs killed by damage
    pub kills: u64,
    /// Explosive tabs whose fuse burnt down
    pub self_destructs: u64,
    /// Explosions spawned
    pub explosions: u64,
    /// Times the cursor grabbed a tab
    pub drags: u64,
    /// Tab spawner counters
    pub spawner: SpawnerStats,
    /// Most tabs alive at once
    pub peak_tabs: usize,
    /// Per-pool counters, by pool name
    pub pools: Vec<(String, PoolStats)>,
}

#[derive(Debug, Clone, Copy)]
struct Grab {
    handle: InstanceHandle,
    held_for: f32,
}

/// The simulated playfield and everything living in it
pub struct Arena {
    config: ArenaConfig,
    clock: FrameClock,

    bullets: Pool<Bullet, BulletPrefab>,
    tabs: Pool<Tab, TabPrefab>,
    particles: Pool<DeathParticle, ParticlePrefab>,
    explosions: Pool<Explosion, ExplosionPrefab>,

    bullet_reclaimer: Reclaimer,
    tab_reclaimer: Reclaimer,
    effect_reclaimer: Reclaimer,
    explosion_reclaimer: Reclaimer,

    governor: SpawnGovernor,
    tab_spawner: Spawner,
    until_volley: f32,

    bus: EventBus,
    bullet_events: [Subscription<Event>; 2],
    deaths: Subscription<Event>,

    until_grab: f32,
    grab: Option<Grab>,

    summary: ArenaSummary,
}

fn build_pool<T, F>(config: &PoolConfig, seed: Option<u64>, factory: F) -> ArenaResult<Pool<T, F>>
where
    T: Poolable,
    F: InstanceFactory<T>,
{
    let mut config = config.clone();
    if config.seed.is_none() {
        config.seed = seed;
    }
    Ok(Pool::from_config(&config, factory)?)
}

fn build_reclaimer(config: &ArenaConfig) -> ArenaResult<Reclaimer> {
    let mut reclaimer = Reclaimer::new();
    for (kind, policy) in config.reclaim_policies() {
        reclaimer.set_policy(kind, policy)?;
    }
    Ok(reclaimer)
}

impl Arena {
    /// Build the arena: validate, prewarm every pool, wire governor and events
    pub fn new(config: ArenaConfig) -> ArenaResult<Self> {
        config.validate()?;
        let engine = &config.engine;

        let bullets = build_pool(&config.bullet_pool(), engine.derive_seed(1), BulletPrefab::new(&config.bullets))?;
        let tabs = build_pool(&config.tabs.pool, engine.derive_seed(2), TabPrefab::new(&config.tabs))?;
        let particles = build_pool(&config.particle_pool(), engine.derive_seed(3), ParticlePrefab)?;
        let explosions = build_pool(
            &config.explosion_pool(),
            engine.derive_seed(4),
            ExplosionPrefab::new(&config.effects),
        )?;

        let mut governor = SpawnGovernor::new(config.tabs.governor.clone())?;
        let mut spawner_config = config.tabs.spawner.clone();
        if spawner_config.seed.is_none() {
            spawner_config.seed = engine.derive_seed(5);
        }
        let mut tab_spawner = Spawner::new(spawner_config)?;
        tab_spawner.attach(&mut governor);

        let mut bus = EventBus::new();
        let bullet_events = [bus.subscribe(EventType::Collided), bus.subscribe(EventType::LeftView)];
        let deaths = bus.subscribe(EventType::Died);

        log::info!(
            "Arena ready: {} bullets, {} tabs, {} particles, {} explosions prewarmed",
            bullets.total_constructed(),
            tabs.total_constructed(),
            particles.total_constructed(),
            explosions.total_constructed()
        );

        Ok(Self {
            bullet_reclaimer: build_reclaimer(&config)?,
            tab_reclaimer: build_reclaimer(&config)?,
            effect_reclaimer: build_reclaimer(&config)?,
            explosion_reclaimer: build_reclaimer(&config)?,
            until_volley: 0.0,
            until_grab: config.drag.interval,
            grab: None,
            clock: FrameClock::new(),
            bullets,
            tabs,
            particles,
            explosions,
            governor,
            tab_spawner,
            bus,
            bullet_events,
            deaths,
            summary: ArenaSummary::default(),
            config,
        })
    }

    /// Load configuration from a TOML or RON file and build the arena
    pub fn from_file(path: impl AsRef<std::path::Path>) -> ArenaResult<Self> {
        Self::new(ArenaConfig::load_from_file(path)?)
    }

    /// Run the configured number of frames
    pub fn run(&mut self) -> ArenaResult<ArenaSummary> {
        let frames = self.config.simulation.frames;
        let timestep = self.config.simulation.timestep;
        for _ in 0..frames {
            self.step(timestep)?;
        }
        Ok(self.summary())
    }

    /// Advance the simulation by one frame
    pub fn step(&mut self, dt: f32) -> ArenaResult<()> {
        let dt = self.clock.advance(dt);
        self.bus.update_time(self.clock.total_time());

        self.governor.update(dt, self.tabs.active_count());
        self.spawn_tabs(dt)?;
        self.fire_volley(dt)?;
        self.update_grab(dt);

        self.move_bullets(dt);
        self.move_tabs(dt);
        self.resolve_contacts();

        self.bus.dispatch();
        self.reclaim_bullets();
        self.handle_deaths()?;
        self.tick_reclaimers(dt)?;

        self.summary.frames += 1;
        self.summary.peak_tabs = self.summary.peak_tabs.max(self.tabs.active_count());
        Ok(())
    }

    fn spawn_tabs(&mut self, dt: f32) -> ArenaResult<()> {
        for spawn in self.tab_spawner.update(dt, &mut self.tabs)? {
            if let Some(tab) = self.tabs.get_mut(spawn.handle) {
                tab.position = spawn.position;
            }
            self.tab_reclaimer.arm(spawn.handle, &spawn.kind);
        }
        Ok(())
    }

    fn fire_volley(&mut self, dt: f32) -> ArenaResult<()> {
        self.until_volley -= dt;
        if self.until_volley > 0.0 {
            return Ok(());
        }
        self.until_volley += self.config.bullets.fire_interval;

        let kind = KindId::from(BULLET_KIND);
        let directions = self.config.bullets.directions.vectors();
        for origin in &self.config.bullets.shooters {
            for direction in &directions {
                let handle = self.bullets.acquire(&kind)?;
                if let Some(bullet) = self.bullets.get_mut(handle) {
                    bullet.launch(*origin, *direction, self.config.bullets.speed);
                }
                self.bullet_reclaimer.arm(handle, &kind);
                self.summary.bullets_fired += 1;
            }
        }
        Ok(())
    }

    fn update_grab(&mut self, dt: f32) {
        if !self.config.drag.enabled {
            return;
        }

        if let Some(mut grab) = self.grab.take() {
            let Some(tab) = self.tabs.get_mut(grab.handle) else {
                return;
            };
            if !tab.is_dragged() {
                return;
            }
            let offset = self.config.drag.cursor - tab.position;
            let step = self.config.drag.carry_speed * dt;
            if offset.norm() <= step {
                tab.drag_to(self.config.drag.cursor);
            } else {
                tab.drag_to(tab.position + offset.normalize() * step);
            }

            grab.held_for += dt;
            if grab.held_for >= self.config.drag.hold {
                tab.end_drag(Vec2::zeros());
                self.tab_reclaimer.resume(grab.handle);
                log::debug!("Released dragged tab {:?}", grab.handle);
            } else {
                self.grab = Some(grab);
            }
            return;
        }

        self.until_grab -= dt;
        if self.until_grab > 0.0 {
            return;
        }
        self.until_grab += self.config.drag.interval;

        let candidate = self
            .tabs
            .iter_active()
            .find(|(handle, tab)| {
                tab.kind == TabKind::Explosive
                    && !tab.is_dead()
                    && !tab.is_dragged()
                    && !self.tab_reclaimer.is_dying(*handle)
            })
            .map(|(handle, _)| handle);

        if let Some(handle) = candidate {
            if let Some(tab) = self.tabs.get_mut(handle) {
                tab.start_drag();
            }
            self.tab_reclaimer.pause(handle);
            self.grab = Some(Grab {
                handle,
                held_for: 0.0,
            });
            self.summary.drags += 1;
            log::debug!("Grabbed explosive tab {:?}", handle);
        }
    }

    fn move_bullets(&mut self, dt: f32) {
        let bounds = self.config.world.bounds;
        let mut gone = Vec::new();
        for (handle, bullet) in self.bullets.iter_active_mut() {
            bullet.advance(dt);
            if !bounds.contains(&bullet.position) {
                gone.push(handle);
            }
        }
        for handle in gone {
            self.bus.emit(EventType::LeftView, handle);
        }
    }

    fn move_tabs(&mut self, dt: f32) {
        let target = self.config.world.target;
        for (_, tab) in self.tabs.iter_active_mut() {
            if !tab.is_dead() {
                tab.move_towards(target, dt);
            }
        }
    }

    fn resolve_contacts(&mut self) {
        let radius = self.config.tabs.contact_radius;
        let bullets: Vec<(InstanceHandle, Vec2, i32)> = self
            .bullets
            .iter_active()
            .filter(|(_, bullet)| self.config.world.bounds.contains(&bullet.position))
            .map(|(handle, bullet)| (handle, bullet.position, bullet.damage))
            .collect();

        for (bullet, position, damage) in bullets {
            let hit = self
                .tabs
                .iter_active_mut()
                .find(|(_, tab)| !tab.is_dead() && (tab.position - position).norm() <= radius);
            let Some((tab_handle, tab)) = hit else {
                continue;
            };

            let died = tab.take_damage(damage);
            self.summary.bullet_hits += 1;
            self.bus.emit(EventType::Collided, bullet);
            if died {
                self.bus.emit(EventType::Died, tab_handle);
            }
        }
    }

    fn reclaim_bullets(&mut self) {
        for subscription in &self.bullet_events {
            for event in subscription.drain() {
                let trigger = ReclaimTrigger::from(event.event_type);
                self.bullet_reclaimer
                    .notify(event.handle, trigger, &mut self.bullets);
            }
        }
    }

    fn handle_deaths(&mut self) -> ArenaResult<()> {
        for event in self.deaths.drain() {
            let Some(position) = self.tabs.get(event.handle).map(|tab| tab.position) else {
                continue;
            };
            self.summary.kills += 1;
            self.spawn_particle(position)?;

            if self.grab.is_some_and(|grab| grab.handle == event.handle) {
                self.grab = None;
            }
            if let Some(reclaimed) =
                self.tab_reclaimer
                    .notify(event.handle, ReclaimTrigger::Death, &mut self.tabs)
            {
                self.on_tab_reclaimed(&reclaimed, position)?;
            }
        }
        Ok(())
    }

    fn tick_reclaimers(&mut self, dt: f32) -> ArenaResult<()> {
        let positions: HashMap<InstanceHandle, Vec2> = self
            .tabs
            .iter_active()
            .map(|(handle, tab)| (handle, tab.position))
            .collect();
        for reclaimed in self.tab_reclaimer.update(dt, &mut self.tabs) {
            if reclaimed.cause == ReclaimCause::SelfDestructed {
                self.summary.self_destructs += 1;
            }
            if self.grab.is_some_and(|grab| grab.handle == reclaimed.handle) {
                self.grab = None;
            }
            let position = positions
                .get(&reclaimed.handle)
                .copied()
                .unwrap_or_else(Vec2::zeros);
            self.on_tab_reclaimed(&reclaimed, position)?;
        }

        self.bullet_reclaimer.update(dt, &mut self.bullets);
        self.effect_reclaimer.update(dt, &mut self.particles);
        self.explosion_reclaimer.update(dt, &mut self.explosions);
        Ok(())
    }

    fn on_tab_reclaimed(&mut self, reclaimed: &Reclaimed, position: Vec2) -> ArenaResult<()> {
        let explodes = TabKind::from_kind(&reclaimed.kind) == Some(TabKind::Explosive)
            && matches!(
                reclaimed.cause,
                ReclaimCause::Died | ReclaimCause::SelfDestructed
            );
        if explodes {
            self.spawn_explosion(position)?;
        }
        Ok(())
    }

    fn spawn_particle(&mut self, position: Vec2) -> ArenaResult<()> {
        let kind = KindId::from(PARTICLE_KIND);
        let handle = self.particles.acquire(&kind)?;
        if let Some(particle) = self.particles.get_mut(handle) {
            particle.position = position;
        }
        self.effect_reclaimer.arm(handle, &kind);
        Ok(())
    }

    fn spawn_explosion(&mut self, position: Vec2) -> ArenaResult<()> {
        let kind = KindId::from(EXPLOSION_KIND);
        let handle = self.explosions.acquire(&kind)?;
        let Some(explosion) = self.explosions.get_mut(handle) else {
            return Ok(());
        };
        explosion.position = position;
        let blast = explosion.clone();
        self.explosion_reclaimer.arm(handle, &kind);
        self.summary.explosions += 1;
        log::debug!("Explosion at ({:.2}, {:.2})", position.x, position.y);

        for (tab_handle, tab) in self.tabs.iter_active_mut() {
            if blast.reaches(&tab.position) && tab.take_damage(blast.damage) {
                self.bus.emit(EventType::Died, tab_handle);
            }
        }
        Ok(())
    }

    /// Counters so far, with current pool stats
    pub fn summary(&self) -> ArenaSummary {
        let mut summary = self.summary.clone();
        summary.elapsed = self.clock.total_time();
        summary.spawner = *self.tab_spawner.stats();
        summary.pools = vec![
            (self.bullets.name().to_string(), self.bullets.stats().clone()),
            (self.tabs.name().to_string(), self.tabs.stats().clone()),
            (self.particles.name().to_string(), self.particles.stats().clone()),
            (self.explosions.name().to_string(), self.explosions.stats().clone()),
        ];
        summary
    }

    /// Session end: tear down every pool and reset the governor
    pub fn shutdown(&mut self) -> usize {
        self.bus.clear();
        self.grab = None;
        for reclaimer in [
            &mut self.bullet_reclaimer,
            &mut self.tab_reclaimer,
            &mut self.effect_reclaimer,
            &mut self.explosion_reclaimer,
        ] {
            reclaimer.clear();
        }
        self.governor.reset();
        self.bullets.teardown()
            + self.tabs.teardown()
            + self.particles.teardown()
            + self.explosions.teardown()
    }

    /// Configuration in use
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Bullet pool
    pub fn bullets(&self) -> &Pool<Bullet, BulletPrefab> {
        &self.bullets
    }

    /// Tab pool
    pub fn tabs(&self) -> &Pool<Tab, TabPrefab> {
        &self.tabs
    }

    /// Death particle pool
    pub fn particles(&self) -> &Pool<DeathParticle, ParticlePrefab> {
        &self.particles
    }

    /// Explosion pool
    pub fn explosions(&self) -> &Pool<Explosion, ExplosionPrefab> {
        &self.explosions
    }

    /// Spawn governor
    pub fn governor(&self) -> &SpawnGovernor {
        &self.governor
    }

    /// Reclaimer owning tab lifetimes
    pub fn tab_reclaimer(&self) -> &Reclaimer {
        &self.tab_reclaimer
    }

    /// Handle of the tab the cursor is holding
    pub fn grabbed(&self) -> Option<InstanceHandle> {
        self.grab.map(|grab| grab.handle)
    }
}
