//! Arena Skirmish - arcade arena combat simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (kinematics, collisions, enemy AI, tick driver)
//! - `settings`: Data-driven arena geometry and tuning
//! - `error`: Construction and configuration errors

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{SimError, SimResult};
pub use settings::Settings;

/// Simulation tuning constants
pub mod consts {
    /// Velocity magnitude below which a body is snapped to rest
    pub const VELOCITY_EPSILON: f32 = 0.001;

    /// Default arena dimensions (pixels)
    pub const ARENA_WIDTH: f32 = 1600.0;
    pub const ARENA_HEIGHT: f32 = 1200.0;
    /// Inset of the playable boundary from the arena edge
    pub const WALL_MARGIN: f32 = 20.0;
    /// Outward push on wall contact, as a multiple of engine thrust
    pub const WALL_PUSH_FACTOR: f32 = 1.1;

    /// Enemy AI: hit points below which the controller turns kamikaze
    pub const KAMIKAZE_HEALTH: f32 = 5.0;
    /// Enemy AI: approach threshold range [min, max) chosen on entry
    pub const APPROACH_MIN: f32 = 400.0;
    pub const APPROACH_MAX: f32 = 600.0;
    /// Enemy AI: distance-attack upper band above the approach threshold
    pub const ATTACK_BAND: f32 = 200.0;
    /// Enemy AI: flee when closer than this
    pub const FLEE_DISTANCE: f32 = 200.0;
    /// Enemy AI: stop fleeing at this distance
    pub const FLEE_SAFE_DISTANCE: f32 = 300.0;
    /// Enemy AI: re-engage threshold range after fleeing [min, max)
    pub const REENGAGE_MIN: f32 = 400.0;
    pub const REENGAGE_MAX: f32 = 800.0;
    /// Enemy AI: strafe direction flip interval [min, max) in ms
    pub const STRAFE_FLIP_MIN_MS: f64 = 1000.0;
    pub const STRAFE_FLIP_MAX_MS: f64 = 1500.0;
    /// Enemy AI: fire cooldown base and jitter in ms
    pub const FIRE_COOLDOWN_MS: f64 = 1500.0;
    pub const FIRE_JITTER_MS: f64 = 1000.0;
}

/// Normalize an angle to [0, 2π)
#[inline]
pub fn normalize_angle_positive(angle: f32) -> f32 {
    use std::f32::consts::TAU;
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{PI, TAU};

    #[test]
    fn test_normalize_angle_positive() {
        assert!((normalize_angle_positive(-PI / 2.0) - 3.0 * PI / 2.0).abs() < 1e-5);
        assert!((normalize_angle_positive(TAU + 0.5) - 0.5).abs() < 1e-5);
        assert_eq!(normalize_angle_positive(0.0), 0.0);
        assert!(normalize_angle_positive(-1e-9) < TAU);
    }
}
