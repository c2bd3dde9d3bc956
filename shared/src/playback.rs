//! Keyframe playback driver.
//!
//! Plays a single clip once and clamps on the last (or first, when running
//! backwards) frame. Elapsed time survives pause and direction changes.

#[derive(Clone, Debug, PartialEq)]
pub struct Playback {
    duration: f32,
    time: f32,
    time_scale: f32,
    paused: bool,
    enabled: bool,
}

impl Playback {
    /// New driver, paused at time zero.
    pub fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(0.0),
            time: 0.0,
            time_scale: 1.0,
            paused: true,
            enabled: false,
        }
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale;
    }

    /// Schedule the clip. Does not reset the current time.
    pub fn play(&mut self) {
        self.enabled = true;
        self.paused = false;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Rewind to the start with forward playback.
    pub fn reset(&mut self) {
        self.time = 0.0;
        self.time_scale = 1.0;
        self.paused = false;
        self.enabled = true;
    }

    pub fn seek(&mut self, time: f32) {
        self.time = time.clamp(0.0, self.duration);
    }

    /// Advance by `dt` seconds, scaled by the time scale, clamping at both ends.
    pub fn advance(&mut self, dt: f32) {
        if !self.enabled || self.paused {
            return;
        }
        self.time = (self.time + dt * self.time_scale).clamp(0.0, self.duration);
    }

    /// Clip reached the end it is heading towards.
    pub fn is_at_end(&self) -> bool {
        if self.time_scale >= 0.0 {
            self.time >= self.duration
        } else {
            self.time <= 0.0
        }
    }
}
