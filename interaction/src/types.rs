/*!
Core math aliases and the two transform value types exchanged across the crate.

Visual nodes and physics bodies never share a pose type:
- [`Transform`] is the scene-graph pose (translation + rotation, no scale).
- [`Iso`] is the physics body pose (a nalgebra isometry, as Rapier stores it).

Conversion happens only through [`Transform::from_body_pose`] and
[`Transform::to_body_pose`], which the frame synchronizer calls at its two sync points.
*/

use nalgebra as na;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// A rigid transform (position + orientation) of a scene node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    #[inline]
    pub fn identity() -> Self {
        Self {
            translation: Vec3::zeros(),
            rotation: Quat::identity(),
        }
    }

    #[inline]
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::identity(),
        }
    }

    #[inline]
    fn iso(&self) -> Iso {
        Iso::from_parts(na::Translation3::from(self.translation), self.rotation)
    }

    #[inline]
    fn from_iso(iso: &Iso) -> Self {
        Self {
            translation: iso.translation.vector,
            rotation: iso.rotation,
        }
    }

    /// Read a physics body pose into a scene-graph transform.
    #[inline]
    pub fn from_body_pose(pose: &Iso) -> Self {
        Self::from_iso(pose)
    }

    /// Express this scene-graph transform as a physics body pose.
    #[inline]
    pub fn to_body_pose(&self) -> Iso {
        self.iso()
    }

    /// `self * child`: place a transform expressed in this frame into the parent frame.
    #[inline]
    pub fn compose(&self, child: &Transform) -> Transform {
        Self::from_iso(&(self.iso() * child.iso()))
    }

    #[inline]
    pub fn inverse(&self) -> Transform {
        Self::from_iso(&self.iso().inverse())
    }

    /// Rotate a local direction into this frame.
    #[inline]
    pub fn rotate(&self, dir: &Vec3) -> Vec3 {
        self.rotation * dir
    }

    /// True if both translation and rotation agree within `eps`.
    ///
    /// Rotations are compared component-wise with `q` and `-q` treated as equal.
    pub fn approx_eq(&self, other: &Transform, eps: f32) -> bool {
        let a = self.rotation.coords;
        let b = other.rotation.coords;
        (self.translation - other.translation).norm() <= eps
            && ((a - b).norm() <= eps || (a + b).norm() <= eps)
    }
}

/// A half-line in world space used for grab picking.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction.
    pub dir: Vec3,
}

impl Ray {
    /// Build a ray; `dir` is normalized. Returns `None` for a degenerate direction.
    pub fn new(origin: Vec3, dir: Vec3) -> Option<Self> {
        let len = dir.norm();
        if !len.is_finite() || len <= f32::EPSILON {
            return None;
        }
        Some(Self {
            origin,
            dir: dir / len,
        })
    }

    /// The ray a controller points along: from its world position, along `rotation * forward`.
    pub fn from_pointer(pose: &Transform, forward: &Vec3) -> Option<Self> {
        Self::new(pose.translation, pose.rotate(forward))
    }

    #[inline]
    pub fn point_at(&self, toi: f32) -> Vec3 {
        self.origin + self.dir * toi
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn compose_then_inverse_recovers_child() {
        let parent = Transform::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_axis_angle(&Vec3::y_axis(), FRAC_PI_2),
        );
        let child = Transform::new(
            Vec3::new(0.5, -1.0, 0.0),
            Quat::from_axis_angle(&Vec3::x_axis(), 0.3),
        );

        let world = parent.compose(&child);
        let back = parent.inverse().compose(&world);

        assert!(back.approx_eq(&child, 1.0e-5));
    }

    #[test]
    fn body_pose_conversion_is_exact() {
        let t = Transform::new(
            Vec3::new(-4.0, 0.25, 9.5),
            Quat::from_euler_angles(0.1, 0.2, 0.3),
        );
        let back = Transform::from_body_pose(&t.to_body_pose());
        assert_eq!(back, t);
    }

    #[test]
    fn pointer_ray_follows_rotation() {
        let pose = Transform::new(
            Vec3::new(0.0, 1.0, 0.0),
            Quat::from_axis_angle(&Vec3::y_axis(), FRAC_PI_2),
        );
        let ray = Ray::from_pointer(&pose, &Vec3::new(0.0, 0.0, -1.0)).unwrap();

        // Yawing +90 degrees turns -Z into -X.
        assert!((ray.dir - Vec3::new(-1.0, 0.0, 0.0)).norm() < 1.0e-6);
        assert_eq!(ray.origin, pose.translation);
    }

    #[test]
    fn degenerate_ray_is_rejected() {
        assert!(Ray::new(Vec3::zeros(), Vec3::zeros()).is_none());
        assert!(Ray::new(Vec3::zeros(), Vec3::new(f32::NAN, 0.0, 0.0)).is_none());
    }
}
