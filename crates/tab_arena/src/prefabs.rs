//! Instance factories for the arena pools

use crate::components::{Bullet, DeathParticle, Explosion, Tab, TabKind};
use crate::config::{BulletsConfig, EffectsConfig, TabsConfig};
use pool_engine::pool::{ConstructionError, InstanceFactory, KindId};

/// Builds bullets
#[derive(Debug, Clone)]
pub struct BulletPrefab {
    damage: i32,
}

impl BulletPrefab {
    /// Bullets dealing `damage`
    pub fn new(config: &BulletsConfig) -> Self {
        Self {
            damage: config.damage,
        }
    }
}

impl InstanceFactory<Bullet> for BulletPrefab {
    fn construct(&mut self, _kind: &KindId) -> Result<Bullet, ConstructionError> {
        Ok(Bullet::new(self.damage))
    }
}

/// Builds tabs of either variant
#[derive(Debug, Clone)]
pub struct TabPrefab {
    basic_health: i32,
    explosive_health: i32,
    speed: f32,
}

impl TabPrefab {
    /// Tabs with the configured health and speed
    pub fn new(config: &TabsConfig) -> Self {
        Self {
            basic_health: config.basic_health,
            explosive_health: config.explosive.health,
            speed: config.speed,
        }
    }
}

impl InstanceFactory<Tab> for TabPrefab {
    fn construct(&mut self, kind: &KindId) -> Result<Tab, ConstructionError> {
        match TabKind::from_kind(kind) {
            Some(TabKind::Basic) => Ok(Tab::new(TabKind::Basic, self.basic_health, self.speed)),
            // Explosive tabs stand still
            Some(TabKind::Explosive) => Ok(Tab::new(TabKind::Explosive, self.explosive_health, 0.0)),
            None => Err(ConstructionError::new(kind.clone(), "no tab prefab for this kind")),
        }
    }
}

/// Builds death particles
#[derive(Debug, Clone, Copy, Default)]
pub struct ParticlePrefab;

impl InstanceFactory<DeathParticle> for ParticlePrefab {
    fn construct(&mut self, _kind: &KindId) -> Result<DeathParticle, ConstructionError> {
        Ok(DeathParticle::default())
    }
}

/// Builds explosions
#[derive(Debug, Clone)]
pub struct ExplosionPrefab {
    radius: f32,
    damage: i32,
}

impl ExplosionPrefab {
    /// Explosions with the configured blast
    pub fn new(config: &EffectsConfig) -> Self {
        Self {
            radius: config.explosion_radius,
            damage: config.explosion_damage,
        }
    }
}

impl InstanceFactory<Explosion> for ExplosionPrefab {
    fn construct(&mut self, _kind: &KindId) -> Result<Explosion, ConstructionError> {
        Ok(Explosion::new(self.radius, self.damage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Damageable;
    use crate::config::ArenaConfig;

    #[test]
    fn test_tab_prefab_builds_both_variants() {
        let mut prefab = TabPrefab::new(&ArenaConfig::default().tabs);
        let basic = prefab.construct(&TabKind::Basic.kind_id()).unwrap();
        let explosive = prefab.construct(&TabKind::Explosive.kind_id()).unwrap();
        assert_eq!(basic.kind, TabKind::Basic);
        assert!(basic.speed > 0.0);
        assert_eq!(explosive.speed, 0.0);
        assert_eq!(basic.health(), ArenaConfig::default().tabs.basic_health);
    }

    #[test]
    fn test_tab_prefab_rejects_unknown_kind() {
        let mut prefab = TabPrefab::new(&ArenaConfig::default().tabs);
        let error = prefab.construct(&KindId::from("boss")).unwrap_err();
        assert_eq!(error.kind, KindId::from("boss"));
    }
}
