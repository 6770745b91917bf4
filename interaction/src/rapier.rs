use rapier3d::prelude::*;

use crate::types::{Quat, Transform, Vec3};

/// Collider/pick shape parameters, expressed in the owning node's (or body's) local frame.
///
/// The same definition feeds both the physics collider of a body and the pick shape the
/// scene graph ray-casts against, so what you can grab is what collides.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeDef {
    /// Infinite plane (half-space) whose outward normal is the local +Y axis.
    ///
    /// In Rapier a half-space is infinite. Any visible "floor size" is purely a rendering concern.
    Plane {
        /// Offset along the plane normal (meters).
        offset_along_normal: f32,
    },

    /// Oriented cuboid with given half-extents (meters).
    Cuboid { half_extents: Vec3 },

    /// Sphere/ball (meters).
    Sphere { radius: f32 },

    /// Y-aligned capsule (meters).
    CapsuleY { radius: f32, half_height: f32 },

    /// Y-aligned cylinder (meters).
    CylinderY { radius: f32, half_height: f32 },

    /// Y-aligned cone (meters).
    ConeY { radius: f32, half_height: f32 },

    /// Rounded cuboid (meters).
    ///
    /// `border_radius` rounds all edges/corners.
    RoundCuboid {
        half_extents: Vec3,
        border_radius: f32,
    },

    /// Y-aligned rounded cylinder (meters).
    RoundCylinderY {
        radius: f32,
        half_height: f32,
        border_radius: f32,
    },

    /// Y-aligned rounded cone (meters).
    RoundConeY {
        radius: f32,
        half_height: f32,
        border_radius: f32,
    },
}

impl ShapeDef {
    /// Cuboid from a full bounding size, the usual output of a model's bounding box.
    pub fn from_extent(size: Vec3) -> Self {
        ShapeDef::Cuboid {
            half_extents: size * 0.5,
        }
    }

    /// Build the Parry shape for this definition.
    ///
    /// For [`ShapeDef::Plane`] the offset is not part of the shape; see [`ShapeDef::local_offset`].
    pub fn shared_shape(&self) -> SharedShape {
        match self {
            ShapeDef::Plane { .. } => SharedShape::halfspace(Vector::y_axis()),
            ShapeDef::Cuboid { half_extents } => {
                SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            ShapeDef::Sphere { radius } => SharedShape::ball(*radius),
            ShapeDef::CapsuleY {
                radius,
                half_height,
            } => SharedShape::capsule_y(*half_height, *radius),
            ShapeDef::CylinderY {
                radius,
                half_height,
            } => SharedShape::cylinder(*half_height, *radius),
            ShapeDef::ConeY {
                radius,
                half_height,
            } => SharedShape::cone(*half_height, *radius),
            ShapeDef::RoundCuboid {
                half_extents,
                border_radius,
            } => SharedShape::round_cuboid(
                half_extents.x,
                half_extents.y,
                half_extents.z,
                *border_radius,
            ),
            ShapeDef::RoundCylinderY {
                radius,
                half_height,
                border_radius,
            } => SharedShape::round_cylinder(*half_height, *radius, *border_radius),
            ShapeDef::RoundConeY {
                radius,
                half_height,
                border_radius,
            } => SharedShape::round_cone(*half_height, *radius, *border_radius),
        }
    }

    /// Local translation of the shape relative to its owner. Non-zero only for planes.
    pub fn local_offset(&self) -> Vec3 {
        match self {
            ShapeDef::Plane {
                offset_along_normal,
            } => Vec3::new(0.0, *offset_along_normal, 0.0),
            _ => Vec3::zeros(),
        }
    }
}

/// Everything needed to create the dynamic body of one grabbable entity.
#[derive(Clone, Debug)]
pub struct BodyDef {
    /// Initial world pose; normally the entity's world transform at load time.
    pub pose: Transform,
    pub shape: ShapeDef,
    /// Collider density (kg/m^3). Rapier derives mass and inertia from it.
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
}

impl BodyDef {
    pub fn new(pose: Transform, shape: ShapeDef) -> Self {
        Self {
            pose,
            shape,
            density: 1.0,
            friction: 0.7,
            restitution: 0.1,
        }
    }
}

/// Canonical definition of an immutable world collider (floor, walls, tables).
#[derive(Clone, Debug)]
pub struct WorldStaticDef {
    /// Stable unique identifier used to ensure deterministic insertion order.
    pub id: u32,
    /// World-space translation.
    pub translation: Vec3,
    /// World-space rotation (unit quaternion).
    pub rotation: Quat,
    pub shape: ShapeDef,
}

impl WorldStaticDef {
    /// A horizontal floor at height `y`.
    pub fn floor(id: u32, y: f32) -> Self {
        Self {
            id,
            translation: Vec3::new(0.0, y, 0.0),
            rotation: Quat::identity(),
            shape: ShapeDef::Plane {
                offset_along_normal: 0.0,
            },
        }
    }
}

/// Build a Rapier collider from a shape definition.
///
/// The collider is attached to a rigid body, so the body's pose is its parent transform and
/// only the shape's own local offset ends up on the collider.
pub fn collider_from_shape(shape: &ShapeDef) -> ColliderBuilder {
    ColliderBuilder::new(shape.shared_shape()).translation(shape.local_offset())
}
