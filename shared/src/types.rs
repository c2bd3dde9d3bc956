/*!
Core math aliases and small value types shared by every module.

This module intentionally contains no algorithms. It defines the data exchanged between:
- physics (rigid-body poses copied out each frame)
- scene (visual node poses)
- proximity and interaction (debug proxies, pick bounds)
*/

use nalgebra as na;
use rapier3d::parry::bounding_volume::Aabb;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// A rigid transform (isometry) in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Pose {
    #[inline]
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    #[inline]
    pub fn identity() -> Self {
        Self::new(Vec3::zeros(), Quat::identity())
    }

    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self::new(translation, Quat::identity())
    }

    /// Build a pose from XYZ Euler angles (radians).
    #[inline]
    pub fn from_euler(translation: Vec3, euler: Vec3) -> Self {
        Self::new(translation, Quat::from_euler_angles(euler.x, euler.y, euler.z))
    }

    /// Euler angles (roll, pitch, yaw) of the rotation, in radians.
    #[inline]
    pub fn euler(&self) -> Vec3 {
        let (x, y, z) = self.rotation.euler_angles();
        Vec3::new(x, y, z)
    }

    #[inline]
    pub fn set_euler(&mut self, euler: Vec3) {
        self.rotation = Quat::from_euler_angles(euler.x, euler.y, euler.z);
    }

    /// Convert to nalgebra `Isometry3` for use with rapier/parry.
    #[inline]
    pub fn iso(&self) -> Iso {
        Iso::from_parts(
            na::Translation3::new(self.translation.x, self.translation.y, self.translation.z),
            self.rotation,
        )
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Axis-aligned box described by its center and full size.
///
/// Debug proxies and pick volumes both use this shape; neither takes part in collision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub center: Vec3,
    pub size: Vec3,
}

impl Bounds {
    #[inline]
    pub fn new(center: Vec3, size: Vec3) -> Self {
        Self { center, size }
    }

    #[inline]
    pub fn min(&self) -> Vec3 {
        self.center - self.size * 0.5
    }

    #[inline]
    pub fn max(&self) -> Vec3 {
        self.center + self.size * 0.5
    }

    /// Inclusive X extent `(min_x, max_x)`.
    #[inline]
    pub fn span_x(&self) -> (f32, f32) {
        (self.min().x, self.max().x)
    }

    pub fn to_aabb(&self) -> Aabb {
        Aabb::new(self.min().into(), self.max().into())
    }
}

/// Component-wise approximate equality (absolute tolerance).
#[inline]
pub fn approx_eq(a: Vec3, b: Vec3, eps: f32) -> bool {
    (a - b).amax() <= eps
}
