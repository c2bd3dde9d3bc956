//! Conversions between the core's nalgebra types and Bevy's glam types.

use bevy::prelude::*;
use nalgebra as na;

#[inline]
pub fn to_bevy_vec(v: &shopfront::Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

#[inline]
pub fn to_core_vec(v: Vec3) -> shopfront::Vec3 {
    na::Vector3::new(v.x, v.y, v.z)
}

#[inline]
pub fn to_bevy_quat(q: &shopfront::Quat) -> Quat {
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

pub fn to_transform(pose: &shopfront::Pose, scale: &shopfront::Vec3) -> Transform {
    Transform {
        translation: to_bevy_vec(&pose.translation),
        rotation: to_bevy_quat(&pose.rotation),
        scale: to_bevy_vec(scale),
    }
}

pub fn to_pick_ray(ray: Ray3d) -> shopfront::PickRay {
    shopfront::PickRay {
        origin: to_core_vec(ray.origin),
        dir: to_core_vec(*ray.direction),
    }
}
