//! Rigid-body registry for the street scene.
//!
//! One rapier world holds the vehicle chassis, the static ground, the shop
//! blocks and the barrels. Every body is created through [`PhysicsWorld`] and
//! referenced elsewhere only by its [`RigidBodyHandle`].

use rapier3d::control::DynamicRayCastVehicleController;
use rapier3d::na::Quaternion;
use rapier3d::prelude::*;

use crate::constants::{
    CHASSIS_DAMPING, CHASSIS_MASS, CHASSIS_YAW, CONTACT_FRICTION, CONTACT_RESTITUTION,
    CYLINDER_SPIN, DEFAULT_FRICTION, FIXED_TIMESTEP, GRAVITY_Y, GROUND_HALF_EXTENT,
    GROUND_HALF_THICKNESS, PROP_ANGULAR_DAMPING, PROP_LINEAR_DAMPING,
};
use crate::types::{Pose, Quat, Vec3};

/// Surface properties registered once for the ground, the surface the wheels ride on.
///
/// Only the friction reaches the ground collider. The wheels are suspension rays
/// with no collider of their own, so the restitution describes the ground/wheel
/// pairing but never enters a rapier contact. Props land with rapier's default
/// zero restitution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactMaterial {
    pub friction: f32,
    pub restitution: f32,
}

impl Default for ContactMaterial {
    fn default() -> Self {
        Self {
            friction: CONTACT_FRICTION,
            restitution: CONTACT_RESTITUTION,
        }
    }
}

/// Shape descriptor kept alongside each body so hosts can build matching visuals.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BodyShape {
    Cuboid { half_extents: Vec3 },
    Cylinder { radius: f32, height: f32, segments: u32 },
}

/// The ground's rotation is the visual plane's rotation with the X component negated.
///
/// The sign convention is kept as authored; the resulting slab is flat either way.
pub fn mirrored_ground_rotation(visual: Quat) -> Quat {
    let c = visual.into_inner().coords;
    Quat::new_normalize(Quaternion::new(c.w, -c.x, c.y, c.z))
}

pub struct PhysicsWorld {
    gravity: Vector<Real>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    shapes: Vec<(RigidBodyHandle, BodyShape)>,
    ground_material: Option<ContactMaterial>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self {
            gravity: vector![0.0, GRAVITY_Y, 0.0],
            params: IntegrationParameters {
                dt: FIXED_TIMESTEP,
                ..IntegrationParameters::default()
            },
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            shapes: Vec::new(),
            ground_material: None,
        }
    }

    fn insert(&mut self, body: RigidBody, collider: Collider, shape: BodyShape) -> RigidBodyHandle {
        let handle = self.bodies.insert(body);
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        self.shapes.push((handle, shape));
        handle
    }

    /// Dynamic box chassis: fixed mass and damping, initial yaw of a quarter turn.
    ///
    /// CCD is enabled so the chassis cannot tunnel through the thin ground at speed.
    pub fn create_vehicle_chassis(&mut self, position: Vec3, half_extents: Vec3) -> RigidBodyHandle {
        let rotation = Quat::from_axis_angle(&Vector::y_axis(), CHASSIS_YAW);
        let body = RigidBodyBuilder::dynamic()
            .pose(Pose::new(position, rotation).iso())
            .linear_damping(CHASSIS_DAMPING)
            .angular_damping(CHASSIS_DAMPING)
            .ccd_enabled(true)
            .build();
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .mass(CHASSIS_MASS)
            .friction(DEFAULT_FRICTION)
            .build();
        let handle = self.insert(body, collider, BodyShape::Cuboid { half_extents });
        log::debug!("chassis created at {position:?} half extents {half_extents:?}");
        handle
    }

    /// Box body; `mass == 0` makes it static.
    pub fn create_body(&mut self, position: Vec3, half_extents: Vec3, mass: f32) -> RigidBodyHandle {
        let builder = if mass > 0.0 {
            RigidBodyBuilder::dynamic()
        } else {
            RigidBodyBuilder::fixed()
        };
        let body = builder
            .pose(Pose::from_translation(position).iso())
            .linear_damping(PROP_LINEAR_DAMPING)
            .angular_damping(PROP_ANGULAR_DAMPING)
            .build();
        let mut collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .friction(DEFAULT_FRICTION);
        if mass > 0.0 {
            collider = collider.mass(mass);
        }
        self.insert(body, collider.build(), BodyShape::Cuboid { half_extents })
    }

    /// Y-aligned cylinder with a fixed initial spin.
    pub fn create_cylinder_body(
        &mut self,
        position: Vec3,
        radius: f32,
        height: f32,
        segments: u32,
        mass: f32,
    ) -> RigidBodyHandle {
        let builder = if mass > 0.0 {
            RigidBodyBuilder::dynamic().angvel(vector![CYLINDER_SPIN, CYLINDER_SPIN, CYLINDER_SPIN])
        } else {
            RigidBodyBuilder::fixed()
        };
        let body = builder
            .pose(Pose::from_translation(position).iso())
            .linear_damping(PROP_LINEAR_DAMPING)
            .angular_damping(PROP_ANGULAR_DAMPING)
            .build();
        let mut collider = ColliderBuilder::cylinder(height * 0.5, radius).friction(DEFAULT_FRICTION);
        if mass > 0.0 {
            collider = collider.mass(mass);
        }
        self.insert(
            body,
            collider.build(),
            BodyShape::Cylinder {
                radius,
                height,
                segments,
            },
        )
    }

    /// Static thin slab under the street, oriented from the visual ground plane.
    pub fn create_ground_plane(&mut self, visual_rotation: Quat) -> (ContactMaterial, RigidBodyHandle) {
        let material = ContactMaterial::default();
        let rotation = mirrored_ground_rotation(visual_rotation);
        let body = RigidBodyBuilder::fixed()
            .pose(Pose::new(Vec3::zeros(), rotation).iso())
            .build();
        let half_extents = Vec3::new(GROUND_HALF_EXTENT, GROUND_HALF_EXTENT, GROUND_HALF_THICKNESS);
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .friction(material.friction)
            .build();
        let handle = self.insert(body, collider, BodyShape::Cuboid { half_extents });
        self.ground_material = Some(material);
        (material, handle)
    }

    /// Advance the world by `dt`, updating the ray-cast vehicle first when present.
    pub fn step(&mut self, dt: f32, vehicle: Option<&mut DynamicRayCastVehicleController>) {
        self.params.dt = dt;

        if let Some(controller) = vehicle {
            let chassis = controller.chassis;
            controller.update_vehicle(
                dt,
                self.broad_phase.as_query_pipeline_mut(
                    self.narrow_phase.query_dispatcher(),
                    &mut self.bodies,
                    &mut self.colliders,
                    QueryFilter::exclude_dynamic().exclude_rigid_body(chassis),
                ),
            );
        }

        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            &(),
            &(),
        );
    }

    /// World pose of a body, `None` for an unknown handle.
    pub fn pose(&self, handle: RigidBodyHandle) -> Option<Pose> {
        self.bodies
            .get(handle)
            .map(|rb| Pose::new(*rb.translation(), *rb.rotation()))
    }

    /// Teleport a body and clear its velocities.
    pub fn set_pose(&mut self, handle: RigidBodyHandle, pose: Pose) -> bool {
        let Some(rb) = self.bodies.get_mut(handle) else {
            return false;
        };
        rb.set_translation(pose.translation, true);
        rb.set_rotation(pose.rotation, true);
        rb.set_linvel(Vector::zeros(), true);
        rb.set_angvel(Vector::zeros(), true);
        true
    }

    /// Reorient a body in place, keeping its velocities.
    pub fn set_rotation(&mut self, handle: RigidBodyHandle, rotation: Quat) -> bool {
        let Some(rb) = self.bodies.get_mut(handle) else {
            return false;
        };
        rb.set_rotation(rotation, true);
        true
    }

    pub fn shape(&self, handle: RigidBodyHandle) -> Option<BodyShape> {
        self.shapes
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, shape)| *shape)
    }

    pub fn ground_material(&self) -> Option<ContactMaterial> {
        self.ground_material
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn translation(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.bodies.get(handle).map(|rb| *rb.translation())
    }

    pub fn is_dynamic(&self, handle: RigidBodyHandle) -> bool {
        self.bodies.get(handle).is_some_and(RigidBody::is_dynamic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_n(world: &mut PhysicsWorld, n: usize) {
        for _ in 0..n {
            world.step(FIXED_TIMESTEP, None);
        }
    }

    #[test]
    fn mirrored_rotation_flips_x_only() {
        let visual = Quat::from_euler_angles(std::f32::consts::FRAC_PI_2, 0.0, 0.0);
        let mirrored = mirrored_ground_rotation(visual);
        let v = visual.into_inner().coords;
        let m = mirrored.into_inner().coords;
        assert!((m.x + v.x).abs() < 1.0e-6);
        assert!((m.y - v.y).abs() < 1.0e-6);
        assert!((m.z - v.z).abs() < 1.0e-6);
        assert!((m.w - v.w).abs() < 1.0e-6);
    }

    #[test]
    fn zero_mass_box_is_static() {
        let mut world = PhysicsWorld::new();
        let h = world.create_body(Vec3::new(0.0, 5.0, 0.0), Vec3::new(1.0, 1.0, 1.0), 0.0);
        step_n(&mut world, 30);
        assert!(!world.is_dynamic(h));
        assert_eq!(world.translation(h), Some(Vec3::new(0.0, 5.0, 0.0)));
    }

    #[test]
    fn dynamic_box_falls_under_gravity() {
        let mut world = PhysicsWorld::new();
        let h = world.create_body(Vec3::new(0.0, 20.0, 0.0), Vec3::new(0.5, 0.5, 0.5), 1.0);
        step_n(&mut world, 30);
        let y = world.translation(h).map(|t| t.y).unwrap_or_default();
        assert!(y < 20.0);
    }

    #[test]
    fn box_rests_on_ground() {
        let mut world = PhysicsWorld::new();
        let (material, _) = world.create_ground_plane(crate::settings::visual_ground_rotation());
        assert_eq!(material.friction, CONTACT_FRICTION);
        let h = world.create_body(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.5, 0.5, 0.5), 1.0);
        step_n(&mut world, 240);
        let y = world.translation(h).map(|t| t.y).unwrap_or_default();
        assert!(y > 0.0 && y < 1.0, "box settled at {y}");
    }

    #[test]
    fn ground_collider_takes_material_friction_but_no_bounce() {
        let mut world = PhysicsWorld::new();
        let (material, ground) = world.create_ground_plane(crate::settings::visual_ground_rotation());
        assert_eq!(material.restitution, CONTACT_RESTITUTION);
        assert_eq!(world.ground_material(), Some(material));

        let collider = world
            .colliders
            .iter()
            .map(|(_, c)| c)
            .find(|c| c.parent() == Some(ground))
            .unwrap();
        assert_eq!(collider.friction(), CONTACT_FRICTION);
        assert_eq!(collider.restitution(), 0.0);

        // a dropped box lands and stays down instead of rebounding
        let h = world.create_body(Vec3::new(0.0, 3.0, 0.0), Vec3::new(0.5, 0.5, 0.5), 1.0);
        step_n(&mut world, 90);
        let landed = world.translation(h).map(|t| t.y).unwrap_or_default();
        step_n(&mut world, 30);
        let later = world.translation(h).map(|t| t.y).unwrap_or_default();
        assert!(later <= landed + 0.05, "box rebounded from {landed} to {later}");
    }

    #[test]
    fn chassis_spawns_with_quarter_turn_yaw() {
        let mut world = PhysicsWorld::new();
        let h = world.create_vehicle_chassis(Vec3::new(-45.0, 0.6, -0.15), Vec3::new(2.0, 0.1, 1.0));
        let pose = world.pose(h).unwrap();
        let (axis, angle) = pose.rotation.axis_angle().unwrap();
        assert!((angle - CHASSIS_YAW).abs() < 1.0e-4);
        assert!((axis.y - 1.0).abs() < 1.0e-4);
    }

    #[test]
    fn set_pose_clears_motion() {
        let mut world = PhysicsWorld::new();
        let h = world.create_cylinder_body(Vec3::new(0.0, 5.0, 0.0), 0.7, 1.5, 14, 2.0);
        step_n(&mut world, 10);
        assert!(world.set_pose(h, Pose::from_translation(Vec3::new(1.0, 2.0, 3.0))));
        assert_eq!(world.translation(h), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(
            world.shape(h),
            Some(BodyShape::Cylinder {
                radius: 0.7,
                height: 1.5,
                segments: 14
            })
        );
    }
}
