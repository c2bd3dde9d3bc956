//! Camera rig: chase placement behind the vehicle and timed moves to a shop front.

use crate::constants::CAMERA_MOVE_DURATION;
use crate::settings::CHASE_OFFSET;
use crate::tween::Tween;
use crate::types::Vec3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraMove {
    tween: Tween<Vec3>,
    look_at: Vec3,
}

impl CameraMove {
    pub fn destination(&self) -> Vec3 {
        self.tween.target()
    }

    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }
}

#[derive(Clone, Debug)]
pub struct CameraRig {
    pub position: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,
    pub orbit_enabled: bool,
    transition: Option<CameraMove>,
    /// Last position a move arrived at; inspection slots hang off this point.
    anchor: Vec3,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 3.0, 18.0),
            target: Vec3::zeros(),
            orbit_enabled: true,
            transition: None,
            anchor: Vec3::zeros(),
        }
    }
}

impl CameraRig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start moving towards `destination`, aiming at `look_at` on every tick.
    ///
    /// Restarting towards the destination already in flight, or already reached,
    /// keeps the camera where it is.
    pub fn move_to(&mut self, destination: Vec3, look_at: Vec3) {
        if self
            .transition
            .is_some_and(|m| m.destination() == destination && m.look_at == look_at)
        {
            return;
        }
        self.orbit_enabled = false;
        if self.transition.is_none() && self.position == destination && self.target == look_at {
            return;
        }
        self.transition = Some(CameraMove {
            tween: Tween::new(self.position, destination, CAMERA_MOVE_DURATION),
            look_at,
        });
        log::debug!("camera moving to {destination:?}");
    }

    /// Advance a running move.
    pub fn tick(&mut self, dt: f32) {
        let Some(mv) = self.transition.as_mut() else {
            return;
        };
        self.position = mv.tween.advance(dt);
        self.target = mv.look_at;
        if mv.tween.is_finished() {
            self.anchor = mv.tween.target();
            self.transition = None;
        }
    }

    /// Place the camera behind and above the vehicle, looking at it.
    pub fn follow(&mut self, vehicle: Vec3) {
        self.transition = None;
        self.position = Vec3::new(
            vehicle.x + CHASE_OFFSET[0],
            CHASE_OFFSET[1],
            vehicle.z + CHASE_OFFSET[2],
        );
        self.target = vehicle;
    }

    pub fn is_moving(&self) -> bool {
        self.transition.is_some()
    }

    pub fn transition(&self) -> Option<&CameraMove> {
        self.transition.as_ref()
    }

    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }
}
