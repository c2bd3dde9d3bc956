/*!
Scene layout tables and runtime configuration.

Layout values are fixed by the authored street: four shop fronts along -Z,
two shelves of six container/content pairs per shop, seven barrels and two
signposts. Everything here is data; the modules that consume it own the logic.

Notes
- Distances are in meters, angles in radians.
- `SceneConfig` carries the few values a host may override at startup.
*/

use crate::constants::FIXED_TIMESTEP;
use crate::types::{Pose, Quat, Vec3};

/// Number of shop fronts.
pub const SHOP_COUNT: usize = 4;

/// Number of container/content pairs.
pub const PAIR_COUNT: usize = 24;

/// Pairs per shop (two shelves of three).
pub const PAIRS_PER_SHOP: usize = 6;

/// Pair slots converted to decorations after the one-time texture pass.
pub const EMIT_SET: [usize; 8] = [3, 5, 0, 10, 9, 15, 16, 17];

/// Highest scroll texture index that may be assigned.
pub const MAX_SCROLL_TEXTURE: usize = 16;

/// Uniform scale of shop models.
pub const SHOP_SCALE: f32 = 2.0;

/// Amount subtracted from a shop's bounding box to get its collider full size.
pub const SHOP_COLLIDER_SHRINK: [f32; 3] = [2.0, 3.0, 2.0];

/// Named indicator-light parts on each shop model.
pub const SHOP_INDICATOR_PARTS: [&str; 3] = ["Icosphere_hide", "Icosphere001_hide", "Icosphere002_hide"];

/// Named lid part on each container model.
pub const LID_PART: &str = "lid";

/// Camera distance from a focused shop.
pub const SHOP_FOCUS_DISTANCE: f32 = 7.0;

/// Divisor applied to the focus distance for the camera height offset.
pub const SHOP_FOCUS_HEIGHT_DIVISOR: f32 = 2.3;

/// Height above the shop origin the focused camera aims at.
pub const SHOP_LOOK_HEIGHT: f32 = 1.8;

/// Chase-camera offset from the vehicle `(dx, absolute y, dz)`.
pub const CHASE_OFFSET: [f32; 3] = [-9.0, 3.0, 18.0];

/// Uniform scale of container models.
pub const CONTAINER_SCALE: f32 = 0.5;

/// Uniform scale of content (scroll) models.
pub const CONTENT_SCALE: f32 = 0.27;

/// Uniform scale of shelf decorations.
pub const DECORATION_SCALE: f32 = 0.2;

/// Shelf decoration variants, in load order.
pub const DECORATION_VARIANTS: [u8; 8] = [2, 3, 2, 3, 2, 2, 2, 3];

/// Uniform scale of the two signposts.
pub const BOARD_SCALE: f32 = 0.3;

/// Barrel cylinder radius.
pub const BARREL_RADIUS: f32 = 0.7;

/// Barrel cylinder height.
pub const BARREL_HEIGHT: f32 = 1.5;

/// Barrel cylinder radial segments.
pub const BARREL_SEGMENTS: u32 = 14;

/// Wheel model for each wheel index (left/right alternating).
pub const WHEEL_MODELS: [&str; 4] = ["wheelr.glb", "wheell.glb", "wheelr.glb", "wheell.glb"];

pub const VEHICLE_MODEL: &str = "Cars.glb";
pub const CONTAINER_MODEL: &str = "container.glb";
pub const CONTENT_MODEL: &str = "123.glb";
pub const BARREL_MODEL: &str = "barrel2.glb";

/// Shop model path for load slot `i` (zero based).
pub fn shop_model(i: usize) -> String {
    format!("store-shutter-animation-nonbaked2-{}.gltf", i + 1)
}

pub fn decoration_model(variant: u8) -> String {
    format!("shelf_decor{variant}.glb")
}

pub fn scroll_texture(index: usize) -> String {
    format!("scroll_tex{index}")
}

/// Pair slots whose content gets a scroll texture: every slot up to
/// [`MAX_SCROLL_TEXTURE`] that is not retired by the emit set.
pub fn textured_slots() -> impl Iterator<Item = usize> {
    (0..=MAX_SCROLL_TEXTURE).filter(|i| !EMIT_SET.contains(i))
}

/// World position of shop `i`.
pub fn shop_position(i: usize) -> Vec3 {
    let i = i as f32;
    Vec3::new(0.5 * i + 20.0 * i - 33.0, 0.0, -9.5)
}

/// Rest position of pair slot `slot` on the shelves.
///
/// Slots run shop by shop; within a shop the first three sit on the upper shelf,
/// the next three on the lower one.
pub fn pair_rest_position(slot: usize) -> Vec3 {
    let shop = (slot / PAIRS_PER_SHOP) as f32;
    let j = slot % PAIRS_PER_SHOP + 1;
    let (x_change, y_change) = if j >= 4 {
        ((j - 3) as f32, 0.7)
    } else {
        (j as f32, 1.0)
    };
    Vec3::new(
        0.5 * shop + 20.0 * shop - 34.0 + x_change * 0.5,
        3.0 * y_change,
        0.5 - 11.0,
    )
}

/// Static barrel placement.
#[derive(Clone, Copy, Debug)]
pub struct BarrelDef {
    pub position: [f32; 3],
    pub mass: f32,
    /// Optional initial orientation as (axis, angle).
    pub orientation: Option<([f32; 3], f32)>,
}

impl BarrelDef {
    pub fn rotation(&self) -> Option<Quat> {
        self.orientation.map(|(axis, angle)| {
            let axis = nalgebra::Unit::new_normalize(Vec3::from(axis));
            Quat::from_axis_angle(&axis, angle)
        })
    }
}

pub const BARRELS: [BarrelDef; 7] = [
    BarrelDef {
        position: [-24.3, 2.0, 7.0],
        mass: 2.0,
        orientation: Some(([1.0, 1.0, 0.0], -std::f32::consts::FRAC_PI_3)),
    },
    BarrelDef {
        position: [-41.0, 0.1, -3.9],
        mass: 2.0,
        orientation: Some(([1.0, 0.0, 0.0], std::f32::consts::FRAC_PI_2)),
    },
    BarrelDef {
        position: [-43.3, 0.4, -3.1],
        mass: 2.0,
        orientation: None,
    },
    BarrelDef {
        position: [-6.9, 0.75, -1.0],
        mass: 0.5,
        orientation: None,
    },
    BarrelDef {
        position: [-5.5, 0.75, 0.0],
        mass: 0.5,
        orientation: None,
    },
    BarrelDef {
        position: [-6.9, 0.75, 1.2],
        mass: 0.5,
        orientation: None,
    },
    BarrelDef {
        position: [25.2, 0.75, -8.0],
        mass: 1.0,
        orientation: None,
    },
];

/// Signpost placement: model path and pose.
pub fn boards() -> [(&'static str, Pose); 2] {
    let yaw = -std::f32::consts::FRAC_PI_2;
    [
        (
            "board1.glb",
            Pose::from_euler(Vec3::new(-45.0, 0.1, -3.9), Vec3::new(0.0, yaw, 0.0)),
        ),
        (
            "board2.glb",
            Pose::from_euler(Vec3::new(45.0, 0.1, -3.9), Vec3::new(0.0, yaw, 0.0)),
        ),
    ]
}

/// Visual ground rotation: a plane lying flat (rotated a quarter turn about X).
pub fn visual_ground_rotation() -> Quat {
    Quat::from_euler_angles(std::f32::consts::FRAC_PI_2, 0.0, 0.0)
}

/// Runtime configuration for a scene session.
#[derive(Clone, Debug)]
pub struct SceneConfig {
    /// Fixed simulation step in seconds.
    pub timestep: f32,
    /// Seed for the shelf decoration shuffle.
    pub decoration_seed: u64,
    /// Emit debug proxy bounds in frame reports.
    pub debug_proxies: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            timestep: FIXED_TIMESTEP,
            decoration_seed: 0x5eed,
            debug_proxies: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shelves_hold_three_pairs_each() {
        let first = pair_rest_position(0);
        let fourth = pair_rest_position(3);
        assert_eq!(first.x, fourth.x);
        assert!((first.y - 3.0).abs() < 1.0e-6);
        assert!((fourth.y - 2.1).abs() < 1.0e-6);
        assert_eq!(first.z, -10.5);
    }

    #[test]
    fn pairs_of_the_next_shop_are_offset() {
        let a = pair_rest_position(0);
        let b = pair_rest_position(PAIRS_PER_SHOP);
        assert!((b.x - a.x - 20.5).abs() < 1.0e-5);
    }

    #[test]
    fn textured_slots_skip_the_emit_set() {
        let slots: Vec<usize> = textured_slots().collect();
        assert_eq!(slots, vec![1, 2, 4, 6, 7, 8, 11, 12, 13, 14]);
        assert!(slots.iter().all(|i| !EMIT_SET.contains(i)));
        // slot 17 is emitted but lies past the textured range
        assert!(EMIT_SET.iter().any(|&i| i > MAX_SCROLL_TEXTURE));
    }
}
