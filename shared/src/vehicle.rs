/*!
Vehicle rig and keyboard controller.

The rig is a dynamic box chassis with four ray-cast wheels provided by rapier's
`DynamicRayCastVehicleController`. Wheel indices are fixed:

| index | wheel       | connection point (chassis space) |
|-------|-------------|----------------------------------|
| 0     | front-left  | (+0.7, 0.5, -1.0)                |
| 1     | front-right | (-0.7, 0.5, -1.0)                |
| 2     | rear-left   | (+0.7, 0.5,  0.75)               |
| 3     | rear-right  | (-0.7, 0.5,  0.75)               |

Only the rear axle (2, 3) is driven. Steering geometry exists but no input is
bound to it; see [`MAX_STEER`].
*/

use rapier3d::control::{DynamicRayCastVehicleController, WheelTuning};
use rapier3d::prelude::*;

use crate::constants::{
    BRAKE_FORCE, CHASSIS_YAW, ENGINE_FORCE, MAX_STEER, RESPAWN_FLOOR_Y, SPAWN_POSITION,
    SUSPENSION_REST_LENGTH, WHEEL_RADIUS,
};
use crate::physics::PhysicsWorld;
use crate::types::{Bounds, Pose, Quat, Vec3};

pub const WHEEL_COUNT: usize = 4;

/// Wheels that receive engine force and release brakes.
pub const DRIVE_WHEELS: [usize; 2] = [2, 3];

const AXLE_HALF_WIDTH: f32 = 0.7;
const CONNECTION_HEIGHT: f32 = 0.5;
const FRONT_Z: f32 = -1.0;
const REAR_Z: f32 = 0.75;

fn wheel_tuning() -> WheelTuning {
    WheelTuning {
        suspension_stiffness: 15.0,
        suspension_compression: 5.0,
        suspension_damping: 2.3,
        max_suspension_travel: 0.3,
        friction_slip: 5.0,
        max_suspension_force: 100_000.0,
        ..WheelTuning::default()
    }
}

/// Connection points in wheel-index order.
pub fn wheel_connection_points() -> [Vec3; WHEEL_COUNT] {
    [
        Vec3::new(AXLE_HALF_WIDTH, CONNECTION_HEIGHT, FRONT_Z),
        Vec3::new(-AXLE_HALF_WIDTH, CONNECTION_HEIGHT, FRONT_Z),
        Vec3::new(AXLE_HALF_WIDTH, CONNECTION_HEIGHT, REAR_Z),
        Vec3::new(-AXLE_HALF_WIDTH, CONNECTION_HEIGHT, REAR_Z),
    ]
}

pub fn spawn_pose() -> Pose {
    Pose::new(
        Vec3::from(SPAWN_POSITION),
        Quat::from_axis_angle(&Vector::y_axis(), CHASSIS_YAW),
    )
}

/// Chassis collider half extents derived from the vehicle model's bounding box size.
pub fn chassis_half_extents(model_size: Vec3) -> Vec3 {
    Vec3::new(model_size.x, model_size.y / 20.0, model_size.z / 2.0)
}

/// Per-wheel command surface of a vehicle.
///
/// Engine forces use the convention where a negative value drives the chassis
/// forward.
pub trait WheelCommands {
    fn wheel_count(&self) -> usize;
    fn set_brake(&mut self, wheel: usize, brake: f32);
    fn apply_engine_force(&mut self, wheel: usize, force: f32);
    fn set_steering(&mut self, wheel: usize, angle: f32);
    fn engine_force(&self, wheel: usize) -> f32;
    fn brake(&self, wheel: usize) -> f32;
}

// Rapier pushes along +forward for a positive force, the opposite sign of the
// trait convention, so forces are negated on the way in and out.
impl WheelCommands for DynamicRayCastVehicleController {
    fn wheel_count(&self) -> usize {
        self.wheels().len()
    }

    fn set_brake(&mut self, wheel: usize, brake: f32) {
        if let Some(w) = self.wheels_mut().get_mut(wheel) {
            w.brake = brake;
        }
    }

    fn apply_engine_force(&mut self, wheel: usize, force: f32) {
        if let Some(w) = self.wheels_mut().get_mut(wheel) {
            w.engine_force = -force;
        }
    }

    fn set_steering(&mut self, wheel: usize, angle: f32) {
        if let Some(w) = self.wheels_mut().get_mut(wheel) {
            w.steering = angle.clamp(-MAX_STEER, MAX_STEER);
        }
    }

    fn engine_force(&self, wheel: usize) -> f32 {
        self.wheels().get(wheel).map_or(0.0, |w| -w.engine_force)
    }

    fn brake(&self, wheel: usize) -> f32 {
        self.wheels().get(wheel).map_or(0.0, |w| w.brake)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriveKey {
    Accelerate,
    Reverse,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyEdge {
    Down,
    Up,
}

/// Maps drive key edges onto wheel commands.
#[derive(Debug, Default)]
pub struct VehicleController {
    hint_hidden: bool,
}

impl VehicleController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one key edge.
    ///
    /// Every event first releases all four brakes, so a missed key-up can never
    /// leave a wheel locked.
    pub fn handle(&mut self, key: DriveKey, edge: KeyEdge, wheels: &mut impl WheelCommands) {
        for i in 0..wheels.wheel_count() {
            wheels.set_brake(i, 0.0);
        }

        let force = match key {
            DriveKey::Accelerate => {
                if !self.hint_hidden {
                    log::debug!("controls hint dismissed");
                }
                self.hint_hidden = true;
                -ENGINE_FORCE
            }
            DriveKey::Reverse => ENGINE_FORCE,
        };

        for wheel in DRIVE_WHEELS {
            match edge {
                KeyEdge::Down => {
                    wheels.apply_engine_force(wheel, force);
                    wheels.set_brake(wheel, 0.0);
                }
                KeyEdge::Up => {
                    wheels.apply_engine_force(wheel, 0.0);
                    wheels.set_brake(wheel, BRAKE_FORCE);
                }
            }
        }
    }

    /// Whether the on-screen controls hint has been dismissed.
    pub fn hint_hidden(&self) -> bool {
        self.hint_hidden
    }
}

/// Chassis body plus its ray-cast wheels.
pub struct VehicleRig {
    chassis: RigidBodyHandle,
    controller: DynamicRayCastVehicleController,
    model_size: Vec3,
    stepped: bool,
}

impl VehicleRig {
    /// Create the chassis at the spawn pose and attach four wheels.
    pub fn new(world: &mut PhysicsWorld, model_size: Vec3) -> Self {
        let spawn = spawn_pose();
        let chassis =
            world.create_vehicle_chassis(spawn.translation, chassis_half_extents(model_size));

        let mut controller = DynamicRayCastVehicleController::new(chassis);
        controller.index_up_axis = 1;
        controller.index_forward_axis = 2;

        let tuning = wheel_tuning();
        for point in wheel_connection_points() {
            controller.add_wheel(
                point.into(),
                -Vector::y(),
                -Vector::x(),
                SUSPENSION_REST_LENGTH,
                WHEEL_RADIUS,
                &tuning,
            );
        }

        log::info!("vehicle rig ready, model size {model_size:?}");
        Self {
            chassis,
            controller,
            model_size,
            stepped: false,
        }
    }

    pub fn chassis(&self) -> RigidBodyHandle {
        self.chassis
    }

    pub fn model_size(&self) -> Vec3 {
        self.model_size
    }

    pub fn wheels(&self) -> &DynamicRayCastVehicleController {
        &self.controller
    }

    pub fn wheels_mut(&mut self) -> &mut DynamicRayCastVehicleController {
        &mut self.controller
    }

    /// Step the world with this vehicle's suspension and drive update.
    pub fn step(&mut self, world: &mut PhysicsWorld, dt: f32) {
        world.step(dt, Some(&mut self.controller));
        self.stepped = true;
    }

    /// World pose of each wheel, in wheel-index order.
    ///
    /// Before the first step the wheels hang at suspension rest length.
    pub fn wheel_poses(&self, chassis: &Pose) -> [Pose; WHEEL_COUNT] {
        let iso = chassis.iso();
        let mut out = [Pose::identity(); WHEEL_COUNT];
        for (i, wheel) in self.controller.wheels().iter().enumerate().take(WHEEL_COUNT) {
            let translation = if self.stepped {
                wheel.center().coords
            } else {
                let local = wheel.chassis_connection_point_cs.coords - Vector::y() * SUSPENSION_REST_LENGTH;
                iso.transform_point(&local.into()).coords
            };
            let steer = Quat::from_axis_angle(&Vector::y_axis(), wheel.steering);
            let spin = Quat::from_axis_angle(&Vector::x_axis(), -wheel.rotation);
            out[i] = Pose::new(translation, chassis.rotation * steer * spin);
        }
        out
    }

    /// Debug proxy mirroring the chassis: full model width and height, half its depth.
    pub fn proxy(&self, chassis: &Pose) -> Bounds {
        Bounds::new(
            chassis.translation,
            Vec3::new(self.model_size.x, self.model_size.y, self.model_size.z / 2.0),
        )
    }

    /// Reset the chassis to spawn when it has dropped below the floor threshold.
    pub fn respawn_if_fallen(&mut self, world: &mut PhysicsWorld) -> bool {
        let fallen = world
            .translation(self.chassis)
            .is_some_and(|t| t.y <= RESPAWN_FLOOR_Y);
        if fallen {
            world.set_pose(self.chassis, spawn_pose());
            log::info!("vehicle fell below {RESPAWN_FLOOR_Y}, respawned");
        }
        fallen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> (PhysicsWorld, VehicleRig) {
        let mut world = PhysicsWorld::new();
        let rig = VehicleRig::new(&mut world, Vec3::new(2.0, 1.5, 4.0));
        (world, rig)
    }

    #[test]
    fn rig_has_four_wheels() {
        let (_, rig) = rig();
        assert_eq!(rig.wheels().wheel_count(), WHEEL_COUNT);
    }

    #[test]
    fn press_then_release_accelerate_brakes_rear_axle() {
        let (_, mut rig) = rig();
        let mut controller = VehicleController::new();
        controller.handle(DriveKey::Accelerate, KeyEdge::Down, rig.wheels_mut());
        assert_eq!(rig.wheels().engine_force(2), -ENGINE_FORCE);
        assert_eq!(rig.wheels().engine_force(3), -ENGINE_FORCE);

        controller.handle(DriveKey::Accelerate, KeyEdge::Up, rig.wheels_mut());
        for wheel in DRIVE_WHEELS {
            assert_eq!(rig.wheels().engine_force(wheel), 0.0);
            assert_eq!(rig.wheels().brake(wheel), BRAKE_FORCE);
        }
        for wheel in [0, 1] {
            assert_eq!(rig.wheels().engine_force(wheel), 0.0);
            assert_eq!(rig.wheels().brake(wheel), 0.0);
        }
    }

    #[test]
    fn reverse_applies_positive_force() {
        let (_, mut rig) = rig();
        let mut controller = VehicleController::new();
        controller.handle(DriveKey::Reverse, KeyEdge::Down, rig.wheels_mut());
        assert_eq!(rig.wheels().engine_force(2), ENGINE_FORCE);
        assert!(!controller.hint_hidden());
    }

    #[test]
    fn any_event_clears_stale_brakes() {
        let (_, mut rig) = rig();
        let mut controller = VehicleController::new();
        controller.handle(DriveKey::Reverse, KeyEdge::Up, rig.wheels_mut());
        rig.wheels_mut().set_brake(0, 5.0);
        controller.handle(DriveKey::Accelerate, KeyEdge::Down, rig.wheels_mut());
        for wheel in 0..WHEEL_COUNT {
            assert_eq!(rig.wheels().brake(wheel), 0.0);
        }
        assert!(controller.hint_hidden());
    }

    #[test]
    fn steering_is_clamped() {
        let (_, mut rig) = rig();
        rig.wheels_mut().set_steering(0, 2.0);
        assert_eq!(rig.wheels().wheels()[0].steering, MAX_STEER);
    }

    #[test]
    fn fallen_vehicle_respawns_at_spawn_pose() {
        let (mut world, mut rig) = rig();
        world.set_pose(
            rig.chassis(),
            Pose::from_translation(Vec3::new(3.0, -6.0, 2.0)),
        );
        assert!(rig.respawn_if_fallen(&mut world));
        let pose = world.pose(rig.chassis()).unwrap();
        assert_eq!(pose.translation, Vec3::from(SPAWN_POSITION));
        assert!(pose.rotation.angle_to(&spawn_pose().rotation) < 1.0e-5);
        assert!(!rig.respawn_if_fallen(&mut world));
    }

    #[test]
    fn resting_wheels_hang_below_connection_points() {
        let (world, rig) = rig();
        let chassis = world.pose(rig.chassis()).unwrap();
        let poses = rig.wheel_poses(&chassis);
        for pose in poses {
            assert!(pose.translation.y < chassis.translation.y + CONNECTION_HEIGHT);
        }
    }
}
