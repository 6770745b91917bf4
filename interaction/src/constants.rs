use crate::types::Vec3;

/// Fixed physics timestep in seconds.
///
/// 72 Hz matches the lowest common refresh rate of standalone headsets, so a 72 Hz display
/// advances exactly one step per frame and 90 Hz displays occasionally skip a step.
pub const FIXED_TIMESTEP: f32 = 1.0 / 72.0;

/// Maximum number of fixed steps consumed in a single rendered frame.
///
/// Any frame time left over after this many steps is dropped rather than carried forward,
/// which keeps a long hitch (e.g. a headset being taken off) from queueing a burst of steps.
pub const MAX_SUBSTEPS: u32 = 4;

/// Slack applied when comparing accumulated frame time against [`FIXED_TIMESTEP`] (seconds).
///
/// A frame lasting exactly one step would otherwise round down to zero steps now and then.
pub const STEP_EPSILON: f32 = 1.0e-6;

/// Gravity magnitude in meters per second squared (positive value).
pub const GRAVITY_MPS2: f32 = 9.81;

/// Default gravity vector (meters per second squared), pointing down -Y.
#[inline]
pub fn default_gravity() -> Vec3 {
    Vec3::new(0.0, -GRAVITY_MPS2, 0.0)
}

/// Local axis a controller points along.
///
/// XR runtimes use -Z as the "forward" of a tracked pointer pose.
#[inline]
pub fn default_controller_forward() -> Vec3 {
    Vec3::new(0.0, 0.0, -1.0)
}

/// Maximum distance (meters) of the controller grab ray. Unbounded by default.
pub const GRAB_RANGE: f32 = f32::MAX;

/// Tolerance used when comparing world transforms across a re-parent (meters / quaternion units).
pub const TRANSFORM_EPS: f32 = 1.0e-5;
