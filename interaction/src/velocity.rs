use crate::types::Vec3;

/// Single-sample finite-difference velocity of a tracked point (a controller held position).
///
/// `velocity = (current - last) / dt`, once per frame, no smoothing. The estimate is noisy but
/// it is exactly what a throw imparts on release.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VelocityTracker {
    last_position: Vec3,
    velocity: Vec3,
}

impl VelocityTracker {
    /// Start tracking from `position` with a zero estimate.
    pub fn new(position: Vec3) -> Self {
        Self {
            last_position: position,
            velocity: Vec3::zeros(),
        }
    }

    /// Feed this frame's position and the time since the previous frame (seconds).
    ///
    /// A zero, negative or non-finite `dt` (first frame, paused clock) yields a zero estimate
    /// instead of an infinite or NaN one. The sample is stored either way.
    pub fn sample(&mut self, position: Vec3, dt: f32) -> Vec3 {
        self.velocity = if dt.is_finite() && dt > 0.0 {
            let v = (position - self.last_position) / dt;
            if v.iter().all(|c| c.is_finite()) {
                v
            } else {
                Vec3::zeros()
            }
        } else {
            Vec3::zeros()
        };
        self.last_position = position;
        self.velocity
    }

    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    #[inline]
    pub fn last_position(&self) -> Vec3 {
        self.last_position
    }
}
