//! Math types.
//!
//! Axis convention: X forward, Y right, Z up. Rotations are in degrees.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Below this squared length a vector is treated as zero.
pub const SMALL_NUMBER: f32 = 1.0e-8;

/// 3D vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    pub const UP: Self = Self::new(0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn len_sq(self) -> f32 {
        self.dot(self)
    }

    pub fn len(self) -> f32 {
        self.len_sq().sqrt()
    }

    /// Unit vector in the same direction, or zero for a (near) zero vector.
    pub fn normalize_or_zero(self) -> Self {
        let len_sq = self.len_sq();
        if len_sq < SMALL_NUMBER {
            return Self::ZERO;
        }
        self * (1.0 / len_sq.sqrt())
    }

    /// Copy with the vertical component removed.
    pub fn flattened(self) -> Self {
        Self::new(self.x, self.y, 0.0)
    }

    pub fn distance(self, other: Self) -> f32 {
        (other - self).len()
    }

    /// Clamps the length to `max`, keeping direction.
    pub fn clamp_len(self, max: f32) -> Self {
        let len_sq = self.len_sq();
        if len_sq > max * max && len_sq > SMALL_NUMBER {
            self * (max / len_sq.sqrt())
        } else {
            self
        }
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Euler rotation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotator {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Rotation that faces along `dir` with no roll.
    pub fn from_direction(dir: Vec3) -> Self {
        let yaw = dir.y.atan2(dir.x).to_degrees();
        let pitch = dir.z.atan2((dir.x * dir.x + dir.y * dir.y).sqrt()).to_degrees();
        Self::new(pitch, yaw, 0.0)
    }

    /// Adds `degrees` of yaw, wrapping into (-180, 180].
    pub fn add_yaw(&mut self, degrees: f32) {
        self.yaw = normalize_axis(self.yaw + degrees);
    }

    fn sin_cos(self) -> ((f32, f32), (f32, f32), (f32, f32)) {
        (
            self.pitch.to_radians().sin_cos(),
            self.yaw.to_radians().sin_cos(),
            self.roll.to_radians().sin_cos(),
        )
    }

    /// Local X axis.
    pub fn forward(self) -> Vec3 {
        let ((sp, cp), (sy, cy), _) = self.sin_cos();
        Vec3::new(cp * cy, cp * sy, sp)
    }

    /// Local Y axis.
    pub fn right(self) -> Vec3 {
        let ((sp, cp), (sy, cy), (sr, cr)) = self.sin_cos();
        Vec3::new(sr * sp * cy - cr * sy, sr * sp * sy + cr * cy, -sr * cp)
    }

    /// Local Z axis.
    pub fn up(self) -> Vec3 {
        let ((sp, cp), (sy, cy), (sr, cr)) = self.sin_cos();
        Vec3::new(-(cr * sp * cy + sr * sy), cy * sr - cr * sp * sy, cr * cp)
    }
}

/// Wraps an angle in degrees into (-180, 180].
pub fn normalize_axis(mut degrees: f32) -> f32 {
    degrees %= 360.0;
    if degrees > 180.0 {
        degrees -= 360.0;
    } else if degrees <= -180.0 {
        degrees += 360.0;
    }
    degrees
}

/// Moves `current` toward `target` by a fraction `dt * speed` of the gap.
///
/// Converges without overshoot for any positive `dt`; a non-positive `speed`
/// snaps straight to the target.
pub fn interp_to(current: f32, target: f32, dt: f32, speed: f32) -> f32 {
    if speed <= 0.0 {
        return target;
    }
    let dist = target - current;
    if dist * dist < SMALL_NUMBER {
        return target;
    }
    current + dist * (dt * speed).clamp(0.0, 1.0)
}
