//! Entities and per-tick kinematic integration
//!
//! Every body in the arena is one `Entity`. Its `Role` only steers collision
//! dispatch; integration treats all roles identically.

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::ai::AiController;
use super::module::ModuleSlot;
use super::vector::VectorExt;
use crate::error::{SimError, SimResult};

/// Stable entity identifier, allocated by the arena state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Side a projectile was fired for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Faction {
    Player,
    Enemy,
}

/// Pickup effects. Only `Repair` and `Bonus` are applied by the core;
/// `Upgrade` codes are passed through to the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ItemKind {
    Repair { amount: f32 },
    Bonus { points: u64 },
    Upgrade { code: u32 },
}

/// Collision role of an entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Role {
    Player,
    Enemy,
    Projectile {
        owner: EntityId,
        faction: Faction,
        /// Seekers steer toward a target and ignore the arena walls
        seeker: bool,
    },
    Item {
        kind: ItemKind,
    },
    Shield {
        owner: EntityId,
    },
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::Player => "player",
            Role::Enemy => "enemy",
            Role::Projectile { seeker: true, .. } => "seeker",
            Role::Projectile { .. } => "projectile",
            Role::Item { .. } => "item",
            Role::Shield { .. } => "shield",
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self, Role::Player)
    }

    pub fn is_enemy(&self) -> bool {
        matches!(self, Role::Enemy)
    }

    pub fn is_projectile(&self) -> bool {
        matches!(self, Role::Projectile { .. })
    }

    pub fn is_item(&self) -> bool {
        matches!(self, Role::Item { .. })
    }

    pub fn is_seeker(&self) -> bool {
        matches!(self, Role::Projectile { seeker: true, .. })
    }

    /// Owning entity for projectiles and shields
    pub fn owner(&self) -> Option<EntityId> {
        match *self {
            Role::Projectile { owner, .. } | Role::Shield { owner } => Some(owner),
            _ => None,
        }
    }

    /// Which side this body fights for, if any
    pub fn faction(&self) -> Option<Faction> {
        match *self {
            Role::Player => Some(Faction::Player),
            Role::Enemy => Some(Faction::Enemy),
            Role::Projectile { faction, .. } => Some(faction),
            _ => None,
        }
    }
}

/// Physical and combat stats an entity is spawned with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatBlock {
    pub mass: f32,
    pub engine_thrust: f32,
    pub friction: f32,
    pub bounce: f32,
    pub radius: f32,
    pub max_hit_points: f32,
    pub collision_damage: f32,
    /// Points awarded when this entity is destroyed by the player
    #[serde(default)]
    pub score_value: u64,
    /// Lifetime in ms (projectiles, shields); `None` lives until destroyed
    #[serde(default)]
    pub lifetime_ms: Option<f64>,
}

impl StatBlock {
    pub fn player() -> Self {
        Self {
            mass: 10.0,
            engine_thrust: 0.02,
            friction: 0.01,
            bounce: 0.6,
            radius: 15.0,
            max_hit_points: 100.0,
            collision_damage: 10.0,
            score_value: 0,
            lifetime_ms: None,
        }
    }

    pub fn enemy() -> Self {
        Self {
            mass: 20.0,
            engine_thrust: 0.03,
            friction: 0.02,
            bounce: 0.5,
            radius: 20.0,
            max_hit_points: 30.0,
            collision_damage: 10.0,
            score_value: 100,
            lifetime_ms: None,
        }
    }

    pub fn bullet() -> Self {
        Self {
            mass: 1.0,
            engine_thrust: 0.0,
            friction: 0.0,
            bounce: 0.0,
            radius: 4.0,
            max_hit_points: 1.0,
            collision_damage: 8.0,
            score_value: 0,
            lifetime_ms: Some(4000.0),
        }
    }

    pub fn seeker() -> Self {
        Self {
            mass: 2.0,
            engine_thrust: 0.004,
            friction: 0.004,
            bounce: 0.0,
            radius: 6.0,
            max_hit_points: 1.0,
            collision_damage: 15.0,
            score_value: 0,
            lifetime_ms: Some(6000.0),
        }
    }

    pub fn shield() -> Self {
        Self {
            mass: 50.0,
            engine_thrust: 0.0,
            friction: 0.0,
            bounce: 0.0,
            radius: 30.0,
            max_hit_points: 40.0,
            collision_damage: 5.0,
            score_value: 0,
            lifetime_ms: Some(3000.0),
        }
    }

    pub fn item() -> Self {
        Self {
            mass: 1.0,
            engine_thrust: 0.0,
            friction: 0.005,
            bounce: 0.8,
            radius: 10.0,
            max_hit_points: 1.0,
            collision_damage: 0.0,
            score_value: 0,
            lifetime_ms: None,
        }
    }

    /// Reject stats that would put NaN or infinities into the integrator
    pub fn validate(&self) -> SimResult<()> {
        fn check(field: &'static str, value: f32, ok: bool) -> SimResult<()> {
            if value.is_finite() && ok {
                Ok(())
            } else {
                Err(SimError::invalid_stat(field, value))
            }
        }

        check("mass", self.mass, self.mass > 0.0)?;
        check("friction", self.friction, self.friction >= 0.0)?;
        check("radius", self.radius, self.radius >= 0.0)?;
        check("max_hit_points", self.max_hit_points, self.max_hit_points >= 0.0)?;
        check("engine_thrust", self.engine_thrust, true)?;
        check("bounce", self.bounce, true)?;
        check("collision_damage", self.collision_damage, true)?;
        Ok(())
    }
}

/// A simulated body
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub role: Role,

    pub position: Vec3,
    pub velocity: Vec3,
    pub accumulated_force: Vec3,
    /// Aiming/presentation direction, independent of velocity
    pub heading: Vec3,

    mass: f32,
    pub engine_thrust: f32,
    pub friction: f32,
    pub bounce: f32,
    pub radius: f32,

    pub max_hit_points: f32,
    hit_points: f32,
    pub collision_damage: f32,
    pub score_value: u64,

    /// Last entity credited with damaging this one (weak, may be gone)
    pub last_hit_by: Option<EntityId>,
    /// Projectile struck something; removed at cleanup
    pub target_hit: bool,
    /// Item was picked up; removed at cleanup
    pub consumed: bool,
    /// Logical-clock time after which the entity expires
    pub expires_at_ms: Option<f64>,

    pub controller: Option<AiController>,
    pub modules: Vec<ModuleSlot>,
}

impl Entity {
    /// Build an entity from a validated stat block
    pub fn new(id: EntityId, role: Role, stats: &StatBlock, position: Vec3) -> SimResult<Self> {
        stats.validate()?;
        Ok(Self {
            id,
            role,
            position,
            velocity: Vec3::ZERO,
            accumulated_force: Vec3::ZERO,
            heading: Vec3::X,
            mass: stats.mass,
            engine_thrust: stats.engine_thrust,
            friction: stats.friction,
            bounce: stats.bounce,
            radius: stats.radius,
            max_hit_points: stats.max_hit_points,
            hit_points: stats.max_hit_points,
            collision_damage: stats.collision_damage,
            score_value: stats.score_value,
            last_hit_by: None,
            target_hit: false,
            consumed: false,
            expires_at_ms: None,
            controller: None,
            modules: Vec::new(),
        })
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_controller(mut self, controller: AiController) -> Self {
        self.controller = Some(controller);
        self
    }

    pub fn with_modules(mut self, modules: Vec<ModuleSlot>) -> Self {
        self.modules = modules;
        self
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn hit_points(&self) -> f32 {
        self.hit_points
    }

    /// Set hit points directly, clamped to [0, max]
    pub fn set_hit_points(&mut self, hp: f32) {
        self.hit_points = hp.clamp(0.0, self.max_hit_points.max(0.0));
    }

    /// Subtract damage, never going below zero
    pub fn take_damage(&mut self, amount: f32) {
        self.hit_points = (self.hit_points - amount).max(0.0);
    }

    /// Restore hit points up to the maximum
    pub fn heal(&mut self, amount: f32) {
        self.hit_points = (self.hit_points + amount).min(self.max_hit_points);
    }

    pub fn is_dead(&self) -> bool {
        self.hit_points <= 0.0
    }

    /// Whether cleanup should remove this entity
    pub fn should_despawn(&self, now_ms: f64) -> bool {
        self.is_dead()
            || self.target_hit
            || self.consumed
            || self.expires_at_ms.is_some_and(|t| now_ms >= t)
    }

    /// Accumulate a force for the next integration step
    #[inline]
    pub fn apply_force(&mut self, force: Vec3) {
        self.accumulated_force += force;
    }

    /// Apply full engine thrust along `direction`
    pub fn thrust_toward(&mut self, direction: Vec3) {
        let force = direction.with_mag(self.engine_thrust);
        self.apply_force(force);
    }

    /// Advance one step of `dt` milliseconds (semi-implicit Euler)
    pub fn update(&mut self, dt: f32, epsilon: f32) {
        // Friction opposes velocity; capped so it can stop a body but never reverse it
        let damping = self.friction * dt / self.mass;
        let friction_force = if damping > 1.0 {
            -self.velocity * (self.mass / dt)
        } else {
            -self.velocity * self.friction
        };
        self.apply_force(friction_force);

        let acceleration = self.accumulated_force / self.mass;
        self.velocity += acceleration * dt;
        if self.velocity.mag() < epsilon {
            self.velocity = Vec3::ZERO;
        }

        self.accumulated_force = Vec3::ZERO;
        self.position += self.velocity * dt;
    }

    /// Undo the position step of the last `update`
    pub fn rollback(&mut self, dt: f32) {
        self.position -= self.velocity * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::VELOCITY_EPSILON;
    use crate::sim::vector::vec2d;
    use proptest::prelude::*;

    fn body(stats: StatBlock) -> Entity {
        Entity::new(EntityId(1), Role::Player, &stats, Vec3::ZERO).unwrap()
    }

    #[test]
    fn test_rejects_non_positive_mass() {
        let mut stats = StatBlock::player();
        stats.mass = 0.0;
        let err = Entity::new(EntityId(1), Role::Player, &stats, Vec3::ZERO);
        assert!(matches!(
            err,
            Err(SimError::InvalidStat { field: "mass", .. })
        ));

        stats.mass = f32::NAN;
        assert!(Entity::new(EntityId(1), Role::Player, &stats, Vec3::ZERO).is_err());
    }

    #[test]
    fn test_rejects_negative_friction_and_radius() {
        let mut stats = StatBlock::enemy();
        stats.friction = -0.1;
        assert!(stats.validate().is_err());

        let mut stats = StatBlock::enemy();
        stats.radius = -1.0;
        assert!(stats.validate().is_err());
    }

    #[test]
    fn test_force_is_consumed_each_tick() {
        let mut stats = StatBlock::player();
        stats.friction = 0.0;
        let mut e = body(stats);

        e.apply_force(vec2d(10.0, 0.0));
        e.update(1.0, VELOCITY_EPSILON);
        assert_eq!(e.accumulated_force, Vec3::ZERO);
        // a = F/m = 1.0, v = 1.0 after 1ms, position moved by v*dt
        assert!((e.velocity.x - 1.0).abs() < 1e-6);
        assert!((e.position.x - 1.0).abs() < 1e-6);

        // No reapplied force: velocity holds without friction
        e.update(1.0, VELOCITY_EPSILON);
        assert!((e.velocity.x - 1.0).abs() < 1e-6);
        assert!((e.position.x - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_small_velocity_snaps_to_zero() {
        let mut e = body(StatBlock::player()).with_velocity(vec2d(0.0005, 0.0));
        e.update(16.0, VELOCITY_EPSILON);
        assert_eq!(e.velocity, Vec3::ZERO);
        assert_eq!(e.position, Vec3::ZERO);
    }

    #[test]
    fn test_rollback_undoes_position_step() {
        let mut e = body(StatBlock::player()).with_velocity(vec2d(0.5, -0.25));
        e.update(16.0, VELOCITY_EPSILON);
        e.rollback(16.0);
        assert!(e.position.length() < 1e-5);
    }

    #[test]
    fn test_heavy_friction_stops_without_reversing() {
        let mut stats = StatBlock::player();
        stats.friction = 50.0;
        let mut e = body(stats).with_velocity(vec2d(1.0, 0.0));
        e.update(16.0, VELOCITY_EPSILON);
        assert_eq!(e.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_damage_clamps_at_zero() {
        let mut e = body(StatBlock::player());
        e.take_damage(1000.0);
        assert_eq!(e.hit_points(), 0.0);
        assert!(e.is_dead());
        e.heal(500.0);
        assert_eq!(e.hit_points(), e.max_hit_points);
    }

    #[test]
    fn test_expiry_uses_logical_clock() {
        let mut e = body(StatBlock::bullet());
        e.expires_at_ms = Some(100.0);
        assert!(!e.should_despawn(99.0));
        assert!(e.should_despawn(100.0));
    }

    proptest! {
        #[test]
        fn prop_friction_never_increases_speed(
            vx in -2.0f32..2.0,
            vy in -2.0f32..2.0,
            friction in 0.001f32..5.0,
            mass in 0.5f32..50.0,
            dt in 1.0f32..50.0,
        ) {
            let mut stats = StatBlock::player();
            stats.friction = friction;
            stats.mass = mass;
            let mut e = body(stats).with_velocity(vec2d(vx, vy));

            let mut prev = e.velocity;
            for _ in 0..200 {
                e.update(dt, VELOCITY_EPSILON);
                let speed = e.velocity.mag();
                prop_assert!(speed <= prev.mag() + 1e-6);
                // No spurious sign flips on either axis
                prop_assert!(e.velocity.x * prev.x >= 0.0);
                prop_assert!(e.velocity.y * prev.y >= 0.0);
                if speed > 0.0 {
                    prop_assert!(speed >= VELOCITY_EPSILON);
                }
                prev = e.velocity;
            }
        }
    }
}
