//! Equipment modules
//!
//! Activating a module yields either a spawn request (projectiles, shields)
//! or an immediate force on its owner. Spawns are queued by the caller and
//! only join the arena at the end of the tick.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, Faction, Role, StatBlock};
use super::vector::VectorExt;

/// Muzzle speed of cannon shots (px/ms, added to the shooter's velocity)
pub const CANNON_SPEED: f32 = 0.6;
/// Launch speed of seekers (px/ms)
pub const SEEKER_SPEED: f32 = 0.25;
/// Thruster burst as a multiple of engine thrust
pub const THRUSTER_BOOST: f32 = 40.0;

/// Module types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleKind {
    Cannon,
    SeekerLauncher,
    ShieldProjector,
    Thruster,
}

impl ModuleKind {
    /// Minimum logical time between activations
    pub fn cooldown_ms(&self) -> f64 {
        match self {
            ModuleKind::Cannon => 250.0,
            ModuleKind::SeekerLauncher => 1200.0,
            ModuleKind::ShieldProjector => 6000.0,
            ModuleKind::Thruster => 800.0,
        }
    }
}

/// An equipped module and its cooldown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSlot {
    pub kind: ModuleKind,
    pub ready_at_ms: f64,
}

/// Entity a module wants created
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    pub role: Role,
    pub stats: StatBlock,
    pub position: Vec3,
    pub velocity: Vec3,
    pub heading: Vec3,
}

/// Result of a successful activation
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleEffect {
    Spawn(SpawnRequest),
    /// Force already applied to the owner
    Thrust(Vec3),
}

/// Build a shot fired along `owner.heading`. `None` for bodies with no side.
pub fn projectile_request(owner: &Entity, seeker: bool) -> Option<SpawnRequest> {
    let faction: Faction = owner.role.faction()?;
    let stats = if seeker {
        StatBlock::seeker()
    } else {
        StatBlock::bullet()
    };
    let heading = owner.heading.normalized();
    let speed = if seeker { SEEKER_SPEED } else { CANNON_SPEED };
    let muzzle = owner.radius + stats.radius + 1.0;

    Some(SpawnRequest {
        role: Role::Projectile {
            owner: owner.id,
            faction,
            seeker,
        },
        position: owner.position + heading * muzzle,
        velocity: owner.velocity + heading * speed,
        heading,
        stats,
    })
}

impl ModuleSlot {
    pub fn new(kind: ModuleKind) -> Self {
        Self {
            kind,
            ready_at_ms: 0.0,
        }
    }

    pub fn is_ready(&self, now_ms: f64) -> bool {
        now_ms >= self.ready_at_ms
    }

    /// Trigger the module if its cooldown has elapsed
    pub fn activate(&mut self, owner: &mut Entity, now_ms: f64) -> Option<ModuleEffect> {
        if !self.is_ready(now_ms) {
            return None;
        }

        let effect = match self.kind {
            ModuleKind::Cannon => ModuleEffect::Spawn(projectile_request(owner, false)?),
            ModuleKind::SeekerLauncher => ModuleEffect::Spawn(projectile_request(owner, true)?),
            ModuleKind::ShieldProjector => ModuleEffect::Spawn(SpawnRequest {
                role: Role::Shield { owner: owner.id },
                stats: StatBlock::shield(),
                position: owner.position,
                velocity: owner.velocity,
                heading: owner.heading,
            }),
            ModuleKind::Thruster => {
                let force = owner.heading.with_mag(owner.engine_thrust * THRUSTER_BOOST);
                owner.apply_force(force);
                ModuleEffect::Thrust(force)
            }
        };

        self.ready_at_ms = now_ms + self.kind.cooldown_ms();
        Some(effect)
    }
}
