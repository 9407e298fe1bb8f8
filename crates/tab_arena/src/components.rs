//! Game-specific components
//!
//! Every pooled game object implements [`Poolable`]; activation resets the
//! per-life state the same way a fresh spawn would.

use bitflags::bitflags;
use pool_engine::foundation::math::Vec2;
use pool_engine::pool::{KindId, Poolable};
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_1_SQRT_2;

bitflags! {
    /// Directions a shooter fires in, one bullet per set flag
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct BulletDirections: u8 {
        /// +Y
        const UP = 1 << 0;
        /// -Y
        const DOWN = 1 << 1;
        /// -X
        const LEFT = 1 << 2;
        /// +X
        const RIGHT = 1 << 3;
        /// -X +Y
        const DIAGONAL_UP_LEFT = 1 << 4;
        /// +X +Y
        const DIAGONAL_UP_RIGHT = 1 << 5;
        /// -X -Y
        const DIAGONAL_DOWN_LEFT = 1 << 6;
        /// +X -Y
        const DIAGONAL_DOWN_RIGHT = 1 << 7;

        /// Up, down, left and right
        const CARDINAL = Self::UP.bits() | Self::DOWN.bits() | Self::LEFT.bits() | Self::RIGHT.bits();
        /// The four diagonals
        const DIAGONAL = Self::DIAGONAL_UP_LEFT.bits()
            | Self::DIAGONAL_UP_RIGHT.bits()
            | Self::DIAGONAL_DOWN_LEFT.bits()
            | Self::DIAGONAL_DOWN_RIGHT.bits();
    }
}

impl BulletDirections {
    /// Unit vectors for every set direction, in flag order
    pub fn vectors(self) -> Vec<Vec2> {
        const D: f32 = FRAC_1_SQRT_2;
        [
            (Self::UP, Vec2::new(0.0, 1.0)),
            (Self::DOWN, Vec2::new(0.0, -1.0)),
            (Self::LEFT, Vec2::new(-1.0, 0.0)),
            (Self::RIGHT, Vec2::new(1.0, 0.0)),
            (Self::DIAGONAL_UP_LEFT, Vec2::new(-D, D)),
            (Self::DIAGONAL_UP_RIGHT, Vec2::new(D, D)),
            (Self::DIAGONAL_DOWN_LEFT, Vec2::new(-D, -D)),
            (Self::DIAGONAL_DOWN_RIGHT, Vec2::new(D, -D)),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, direction)| direction)
        .collect()
    }
}

impl Default for BulletDirections {
    fn default() -> Self {
        Self::UP
    }
}

/// Something with health that bullets and explosions can hurt
pub trait Damageable {
    /// Apply damage. Returns true if this hit brought health to zero or below.
    fn take_damage(&mut self, amount: i32) -> bool;

    /// Current health
    fn health(&self) -> i32;

    /// Whether health is gone
    fn is_dead(&self) -> bool {
        self.health() <= 0
    }
}

/// Something the cursor can pick up and throw
pub trait Draggable {
    /// Grab started
    fn start_drag(&mut self);

    /// Follow the cursor
    fn drag_to(&mut self, position: Vec2);

    /// Let go with a throw velocity
    fn end_drag(&mut self, velocity: Vec2);

    /// Whether currently held
    fn is_dragged(&self) -> bool;
}

/// Bullet projectile component
#[derive(Debug, Clone)]
pub struct Bullet {
    /// World position
    pub position: Vec2,
    /// Straight-line velocity
    pub velocity: Vec2,
    /// Damage dealt on impact
    pub damage: i32,
}

impl Bullet {
    /// Create an inactive bullet
    pub fn new(damage: i32) -> Self {
        Self {
            position: Vec2::zeros(),
            velocity: Vec2::zeros(),
            damage,
        }
    }

    /// Launch from `origin` along `direction`
    pub fn launch(&mut self, origin: Vec2, direction: Vec2, speed: f32) {
        self.position = origin;
        self.velocity = direction * speed;
    }

    /// Move along the velocity
    pub fn advance(&mut self, dt: f32) {
        self.position += self.velocity * dt;
    }
}

impl Poolable for Bullet {
    fn set_active(&mut self, active: bool) {
        if !active {
            self.velocity = Vec2::zeros();
        }
    }
}

/// Tab variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabKind {
    /// Walks to the target, dies when shot
    Basic,
    /// Stands still, self-destructs on a fuse, explodes on death
    Explosive,
}

impl TabKind {
    /// Pool kind id of this variant
    pub fn kind_id(self) -> KindId {
        KindId::new(self.as_str())
    }

    /// Stable name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Explosive => "explosive",
        }
    }

    /// Parse a pool kind id
    pub fn from_kind(kind: &KindId) -> Option<Self> {
        match kind.as_str() {
            "basic" => Some(Self::Basic),
            "explosive" => Some(Self::Explosive),
            _ => None,
        }
    }
}

/// Tab enemy component
#[derive(Debug, Clone)]
pub struct Tab {
    /// Variant
    pub kind: TabKind,
    /// World position
    pub position: Vec2,
    /// Movement speed toward the target
    pub speed: f32,
    max_health: i32,
    health: i32,
    dragged: bool,
}

impl Tab {
    /// Create an inactive tab
    pub fn new(kind: TabKind, max_health: i32, speed: f32) -> Self {
        Self {
            kind,
            position: Vec2::zeros(),
            speed,
            max_health,
            health: max_health,
            dragged: false,
        }
    }

    /// Step toward `target`, stopping on arrival. Held tabs do not walk.
    pub fn move_towards(&mut self, target: Vec2, dt: f32) {
        if self.dragged || self.speed <= 0.0 {
            return;
        }
        let offset = target - self.position;
        let distance = offset.norm();
        let step = self.speed * dt;
        if distance <= step {
            self.position = target;
        } else {
            self.position += offset / distance * step;
        }
    }
}

impl Poolable for Tab {
    fn set_active(&mut self, active: bool) {
        if active {
            self.health = self.max_health;
            self.dragged = false;
        }
    }
}

impl Damageable for Tab {
    fn take_damage(&mut self, amount: i32) -> bool {
        if self.is_dead() {
            return false;
        }
        self.health -= amount;
        self.is_dead()
    }

    fn health(&self) -> i32 {
        self.health
    }
}

impl Draggable for Tab {
    fn start_drag(&mut self) {
        self.dragged = true;
    }

    fn drag_to(&mut self, position: Vec2) {
        if self.dragged {
            self.position = position;
        }
    }

    fn end_drag(&mut self, velocity: Vec2) {
        self.dragged = false;
        log::trace!("Tab thrown at ({:.1}, {:.1})", velocity.x, velocity.y);
    }

    fn is_dragged(&self) -> bool {
        self.dragged
    }
}

/// Death particle burst left where a tab died
#[derive(Debug, Clone, Default)]
pub struct DeathParticle {
    /// World position
    pub position: Vec2,
}

impl Poolable for DeathParticle {
    fn set_active(&mut self, _active: bool) {}
}

/// Explosion left by an explosive tab
#[derive(Debug, Clone)]
pub struct Explosion {
    /// World position
    pub position: Vec2,
    /// Blast radius
    pub radius: f32,
    /// Damage dealt to tabs inside the radius
    pub damage: i32,
}

impl Explosion {
    /// Create an inactive explosion
    pub fn new(radius: f32, damage: i32) -> Self {
        Self {
            position: Vec2::zeros(),
            radius,
            damage,
        }
    }

    /// Whether a point is inside the blast
    pub fn reaches(&self, point: &Vec2) -> bool {
        (point - self.position).norm() <= self.radius
    }
}

impl Poolable for Explosion {
    fn set_active(&mut self, _active: bool) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_direction_vectors_follow_flags() {
        assert_eq!(BulletDirections::empty().vectors().len(), 0);
        assert_eq!(BulletDirections::CARDINAL.vectors().len(), 4);
        assert_eq!(BulletDirections::all().vectors().len(), 8);

        let diagonal = BulletDirections::DIAGONAL_DOWN_RIGHT.vectors()[0];
        assert_relative_eq!(diagonal.norm(), 1.0, epsilon = 1e-6);
        assert!(diagonal.x > 0.0 && diagonal.y < 0.0);
    }

    #[test]
    fn test_tab_health_resets_on_activation() {
        let mut tab = Tab::new(TabKind::Basic, 3, 1.0);
        tab.set_active(true);
        assert!(!tab.take_damage(2));
        assert!(tab.take_damage(2));
        // Further hits on a dead tab do not report a second death
        assert!(!tab.take_damage(5));

        tab.set_active(false);
        tab.set_active(true);
        assert_eq!(tab.health(), 3);
    }

    #[test]
    fn test_tab_walks_to_target_unless_held() {
        let mut tab = Tab::new(TabKind::Basic, 1, 2.0);
        tab.move_towards(Vec2::new(10.0, 0.0), 1.0);
        assert_relative_eq!(tab.position.x, 2.0);

        tab.start_drag();
        tab.move_towards(Vec2::new(10.0, 0.0), 1.0);
        assert_relative_eq!(tab.position.x, 2.0);
        tab.drag_to(Vec2::new(0.0, 5.0));
        tab.end_drag(Vec2::zeros());
        assert!(!tab.is_dragged());

        tab.move_towards(Vec2::new(0.0, 6.0), 1.0);
        assert_eq!(tab.position, Vec2::new(0.0, 6.0));
    }

    #[test]
    fn test_kind_ids_round_trip() {
        for kind in [TabKind::Basic, TabKind::Explosive] {
            assert_eq!(TabKind::from_kind(&kind.kind_id()), Some(kind));
        }
        assert_eq!(TabKind::from_kind(&KindId::from("boss")), None);
    }
}
