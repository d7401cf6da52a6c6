//! Vector arithmetic for the arena plane
//!
//! Vectors are glam `Vec3` values with z unused in the 2D arena. `Vec3` is
//! `Copy`, so every stored vector is exclusively owned and never aliased.
//! `VectorExt` adds the zero-safe helpers the simulation relies on.

use glam::Vec3;

use crate::normalize_angle_positive;

/// Construct an arena-plane vector (z = 0)
#[inline]
pub const fn vec2d(x: f32, y: f32) -> Vec3 {
    Vec3::new(x, y, 0.0)
}

/// Zero-safe vector helpers
pub trait VectorExt: Sized {
    /// Add a scalar triple component-wise
    fn add_xyz(self, x: f32, y: f32, z: f32) -> Self;
    /// Subtract a scalar triple component-wise
    fn sub_xyz(self, x: f32, y: f32, z: f32) -> Self;
    /// Magnitude
    fn mag(self) -> f32;
    /// Unit vector in the same direction; the zero vector stays zero
    fn normalized(self) -> Self;
    /// Same direction with magnitude `m`; the zero vector stays zero
    fn with_mag(self, m: f32) -> Self;
    /// Euclidean distance to `other`
    fn dist(self, other: Self) -> f32;
    /// Rotate about the z axis by `angle` radians
    fn rotated_2d(self, angle: f32) -> Self;
    /// Heading of the xy projection in [0, 2π); 0 for the zero vector
    fn angle_2d(self) -> f32;
    /// Unsigned angle to `other` in [0, π]; 0 if either vector is zero
    fn angle_to(self, other: Self) -> f32;
    /// Linear interpolation toward `other` by `t`
    fn lin_interp(self, other: Self, t: f32) -> Self;
    /// Perpendicular in the arena plane (rotated +90°)
    fn perp_2d(self) -> Self;
}

impl VectorExt for Vec3 {
    #[inline]
    fn add_xyz(self, x: f32, y: f32, z: f32) -> Self {
        self + Vec3::new(x, y, z)
    }

    #[inline]
    fn sub_xyz(self, x: f32, y: f32, z: f32) -> Self {
        self - Vec3::new(x, y, z)
    }

    #[inline]
    fn mag(self) -> f32 {
        self.length()
    }

    #[inline]
    fn normalized(self) -> Self {
        self.normalize_or_zero()
    }

    #[inline]
    fn with_mag(self, m: f32) -> Self {
        self.normalize_or_zero() * m
    }

    #[inline]
    fn dist(self, other: Self) -> f32 {
        self.distance(other)
    }

    fn rotated_2d(self, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Vec3::new(
            self.x * cos - self.y * sin,
            self.x * sin + self.y * cos,
            self.z,
        )
    }

    fn angle_2d(self) -> f32 {
        if self.x == 0.0 && self.y == 0.0 {
            return 0.0;
        }
        normalize_angle_positive(self.y.atan2(self.x))
    }

    fn angle_to(self, other: Self) -> f32 {
        let denom = (self.length_squared() * other.length_squared()).sqrt();
        if denom == 0.0 || !denom.is_finite() {
            return 0.0;
        }
        (self.dot(other) / denom).clamp(-1.0, 1.0).acos()
    }

    #[inline]
    fn lin_interp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }

    #[inline]
    fn perp_2d(self) -> Self {
        Vec3::new(-self.y, self.x, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_zero_vector_is_safe() {
        assert_eq!(Vec3::ZERO.normalized(), Vec3::ZERO);
        assert_eq!(Vec3::ZERO.angle_2d(), 0.0);
        assert_eq!(Vec3::ZERO.with_mag(5.0), Vec3::ZERO);
        assert_eq!(Vec3::ZERO.angle_to(vec2d(1.0, 0.0)), 0.0);
        assert!(!Vec3::ZERO.normalized().x.is_nan());
    }

    #[test]
    fn test_angle_2d_quadrants() {
        assert!((vec2d(1.0, 0.0).angle_2d() - 0.0).abs() < 1e-6);
        assert!((vec2d(0.0, 1.0).angle_2d() - FRAC_PI_2).abs() < 1e-6);
        assert!((vec2d(-1.0, 0.0).angle_2d() - PI).abs() < 1e-6);
        assert!((vec2d(0.0, -1.0).angle_2d() - 3.0 * FRAC_PI_2).abs() < 1e-6);
        assert!((vec2d(1.0, -1.0).angle_2d() - 7.0 * PI / 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let v = vec2d(2.0, 0.0).rotated_2d(FRAC_PI_2);
        assert!(v.x.abs() < 1e-6);
        assert!((v.y - 2.0).abs() < 1e-6);
        assert!((vec2d(3.0, 4.0).rotated_2d(1.234).mag() - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_with_mag_and_dist() {
        let v = vec2d(3.0, 4.0).with_mag(10.0);
        assert!((v.x - 6.0).abs() < 1e-5);
        assert!((v.y - 8.0).abs() < 1e-5);
        assert!((vec2d(0.0, 0.0).dist(vec2d(3.0, 4.0)) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_angle_to_and_interp() {
        let a = vec2d(1.0, 0.0);
        let b = vec2d(0.0, 3.0);
        assert!((a.angle_to(b) - FRAC_PI_2).abs() < 1e-6);
        assert!((a.angle_to(-a) - PI).abs() < 1e-6);

        let mid = a.lin_interp(b, 0.5);
        assert_eq!(mid, vec2d(0.5, 1.5));
    }

    #[test]
    fn test_scalar_triples_and_cross() {
        let v = vec2d(1.0, 2.0).add_xyz(1.0, 1.0, 0.0).sub_xyz(0.5, 0.0, 0.0);
        assert_eq!(v, vec2d(1.5, 3.0));
        assert_eq!(vec2d(1.0, 0.0).cross(vec2d(0.0, 1.0)), Vec3::Z);
        assert_eq!(vec2d(1.0, 0.0).perp_2d(), vec2d(0.0, 1.0));
    }
}
