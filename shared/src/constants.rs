use std::time::Duration;

/// Fixed simulation step in seconds.
///
/// Physics, playback drivers and tweens all advance by this amount per tick,
/// independently of the render delta.
pub const FIXED_TIMESTEP: f32 = 1.0 / 60.0;

/// World gravity (m/s^2), applied along -Y.
pub const GRAVITY_Y: f32 = -9.8;

/// Friction used by every collider that does not opt into the ground contact material.
pub const DEFAULT_FRICTION: f32 = 0.3;

/// Ground/wheel contact material: friction coefficient.
pub const CONTACT_FRICTION: f32 = 0.4;

/// Ground/wheel contact material: restitution.
pub const CONTACT_RESTITUTION: f32 = 1.0;

/// Ground collider half thickness (meters). Kept thin so wheels sit at y ~= 0.
pub const GROUND_HALF_THICKNESS: f32 = 0.01;

/// Ground collider half extent along X and Z (meters).
pub const GROUND_HALF_EXTENT: f32 = 60.0;

/// Chassis mass (kg).
pub const CHASSIS_MASS: f32 = 150.0;

/// Chassis linear and angular damping.
pub const CHASSIS_DAMPING: f32 = 0.6;

/// Initial chassis yaw (radians) applied at creation and on respawn.
pub const CHASSIS_YAW: f32 = std::f32::consts::FRAC_PI_2;

/// Linear damping for generic dynamic box props.
pub const PROP_LINEAR_DAMPING: f32 = 0.3;

/// Angular damping for generic dynamic box props.
pub const PROP_ANGULAR_DAMPING: f32 = 0.4;

/// Initial spin (rad/s on each axis) given to cylinder props.
pub const CYLINDER_SPIN: f32 = 4.0;

/// Vehicle spawn position (meters).
pub const SPAWN_POSITION: [f32; 3] = [-45.0, 0.6, -0.15];

/// Below this height the vehicle is respawned.
pub const RESPAWN_FLOOR_Y: f32 = -5.0;

/// Engine force magnitude applied to the drive axle.
///
/// Accelerate applies `-ENGINE_FORCE`, reverse applies `+ENGINE_FORCE`.
pub const ENGINE_FORCE: f32 = 800.0;

/// Brake force applied to the drive axle when a drive key is released.
pub const BRAKE_FORCE: f32 = 8.0;

/// Maximum steering angle (radians).
///
/// Wheel geometry supports steering but no control is bound to it.
pub const MAX_STEER: f32 = 0.3;

/// Wheel radius (meters).
pub const WHEEL_RADIUS: f32 = 0.5;

/// Suspension rest length (meters).
pub const SUSPENSION_REST_LENGTH: f32 = 0.5;

/// Procedural wheel fallback: visual radius.
pub const FALLBACK_WHEEL_RADIUS: f32 = 0.4;

/// Procedural wheel fallback: visual height.
pub const FALLBACK_WHEEL_HEIGHT: f32 = 0.3;

/// Procedural wheel fallback: radial segments.
pub const FALLBACK_WHEEL_SEGMENTS: u32 = 20;

/// Total duration of the shutter blink effect.
pub const BLINK_TOTAL: Duration = Duration::from_millis(850);

/// Interval between shutter blink toggles.
pub const BLINK_INTERVAL: Duration = Duration::from_millis(100);

/// Shop playback time after which the indicator lights are hidden (seconds).
pub const INDICATOR_HIDE_TIME: f32 = 0.75;

/// Camera move-to-target duration (seconds).
pub const CAMERA_MOVE_DURATION: f32 = 1.5;

/// Container/content move duration (seconds).
pub const PAIR_MOVE_DURATION: f32 = 1.0;

/// Lid open/close duration (seconds).
pub const LID_MOVE_DURATION: f32 = 1.0;

/// Content reading-orientation tween duration (seconds).
pub const CONTENT_ROTATE_DURATION: f32 = 1.0;

/// Slow tumble applied to a selected pair each tick (radians per tick, XYZ).
pub const TUMBLE_STEP: [f32; 3] = [0.001, 0.003, 0.001];

/// Camera Z must be at or below this value before a container can be picked.
pub const PICK_MAX_CAMERA_Z: f32 = -1.0;

/// Positional tolerance when deciding an object reached its tween target (meters).
pub const SETTLE_EPS: f32 = 1.0e-3;
