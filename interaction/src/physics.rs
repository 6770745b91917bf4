//! Rigid-body simulation seam and its Rapier implementation.
//!
//! The grab logic only needs a narrow slice of a physics engine: switch a body between
//! dynamic and kinematic, read/write its pose and velocities, wake it, and step the world.
//! [`PhysicsWorld`] captures exactly that; [`RapierPhysics`] provides it on top of `rapier3d`.
//!
//! Conventions
//! - Units are meters, seconds, radians.
//! - A kinematic body is Rapier's position-based kinematic body. Writing its pose teleports it,
//!   so after [`PhysicsWorld::set_pose`] it sits exactly at the written pose until the next write.

use std::{fmt::Debug, hash::Hash};

use log::warn;
use nalgebra as na;
use rapier3d::prelude::*;

use crate::{
    constants::default_gravity,
    rapier::{BodyDef, WorldStaticDef, collider_from_shape},
    types::{Iso, Vec3},
};

/// How the simulation treats a body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyMode {
    /// Integrated by the simulation: gravity, forces, collision response.
    Dynamic,
    /// Pose is written from outside every frame; ignores forces but still pushes dynamic bodies.
    Kinematic,
    /// Immovable world geometry. Never used for grabbable entities.
    Fixed,
}

/// The physics operations the interaction core consumes.
pub trait PhysicsWorld {
    /// Stable handle of a rigid body.
    type Body: Copy + Eq + Hash + Debug;

    /// Returns `None` if the handle does not refer to a live body.
    fn mode(&self, body: Self::Body) -> Option<BodyMode>;
    fn set_mode(&mut self, body: Self::Body, mode: BodyMode);

    fn pose(&self, body: Self::Body) -> Option<Iso>;
    fn set_pose(&mut self, body: Self::Body, pose: Iso);

    fn linvel(&self, body: Self::Body) -> Option<Vec3>;
    fn set_linvel(&mut self, body: Self::Body, linvel: Vec3);

    fn angvel(&self, body: Self::Body) -> Option<Vec3>;
    fn set_angvel(&mut self, body: Self::Body, angvel: Vec3);

    /// Make sure the body is simulated on the next step (leave the sleeping state).
    fn wake_up(&mut self, body: Self::Body);

    /// Advance the simulation by `dt` seconds.
    fn step(&mut self, dt: f32);
}

/// A self-contained Rapier world: dynamic props plus fixed world geometry.
pub struct RapierPhysics {
    pub gravity: Vector<f32>,
    pub integration_parameters: IntegrationParameters,
    pub pipeline: PhysicsPipeline,
    pub islands: IslandManager,
    pub broad_phase: BroadPhaseBvh,
    pub narrow_phase: NarrowPhase,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub impulse_joints: ImpulseJointSet,
    pub multibody_joints: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
}

impl Default for RapierPhysics {
    fn default() -> Self {
        Self::new(default_gravity())
    }
}

impl RapierPhysics {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity,
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
        }
    }

    /// Create the dynamic body of a grabbable entity, with one collider built from its shape.
    ///
    /// CCD is enabled: thrown props are small and fast, and would otherwise tunnel through
    /// thin world geometry.
    pub fn insert_body(&mut self, def: &BodyDef) -> RigidBodyHandle {
        let rb = RigidBodyBuilder::dynamic()
            .pose(def.pose.to_body_pose())
            .ccd_enabled(true)
            .build();
        let handle = self.bodies.insert(rb);

        let collider = collider_from_shape(&def.shape)
            .density(def.density)
            .friction(def.friction)
            .restitution(def.restitution)
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);

        handle
    }

    /// Insert immutable world geometry.
    ///
    /// Statics are inserted sorted by `id` so two worlds built from the same list are identical.
    pub fn insert_statics(&mut self, mut defs: Vec<WorldStaticDef>) -> Vec<RigidBodyHandle> {
        defs.sort_by_key(|d| d.id);

        defs.iter()
            .map(|def| {
                let iso = Iso::from_parts(na::Translation3::from(def.translation), def.rotation);
                let rb = RigidBodyBuilder::fixed().pose(iso).build();
                let handle = self.bodies.insert(rb);

                let collider = collider_from_shape(&def.shape).build();
                self.colliders
                    .insert_with_parent(collider, handle, &mut self.bodies);
                handle
            })
            .collect()
    }

    fn body_mut(&mut self, body: RigidBodyHandle) -> Option<&mut RigidBody> {
        let rb = self.bodies.get_mut(body);
        if rb.is_none() {
            warn!("physics: no rigid body for handle {body:?}");
        }
        rb
    }
}

impl PhysicsWorld for RapierPhysics {
    type Body = RigidBodyHandle;

    fn mode(&self, body: RigidBodyHandle) -> Option<BodyMode> {
        let rb = self.bodies.get(body)?;
        Some(match rb.body_type() {
            RigidBodyType::Dynamic => BodyMode::Dynamic,
            RigidBodyType::Fixed => BodyMode::Fixed,
            RigidBodyType::KinematicPositionBased | RigidBodyType::KinematicVelocityBased => {
                BodyMode::Kinematic
            }
        })
    }

    fn set_mode(&mut self, body: RigidBodyHandle, mode: BodyMode) {
        let Some(rb) = self.body_mut(body) else {
            return;
        };
        let ty = match mode {
            BodyMode::Dynamic => RigidBodyType::Dynamic,
            BodyMode::Kinematic => RigidBodyType::KinematicPositionBased,
            BodyMode::Fixed => RigidBodyType::Fixed,
        };
        rb.set_body_type(ty, true);
    }

    fn pose(&self, body: RigidBodyHandle) -> Option<Iso> {
        let rb = self.bodies.get(body)?;
        Some(Iso::from_parts(
            na::Translation3::from(*rb.translation()),
            *rb.rotation(),
        ))
    }

    fn set_pose(&mut self, body: RigidBodyHandle, pose: Iso) {
        let Some(rb) = self.body_mut(body) else {
            return;
        };
        rb.set_translation(pose.translation.vector, true);
        rb.set_rotation(pose.rotation, true);
    }

    fn linvel(&self, body: RigidBodyHandle) -> Option<Vec3> {
        self.bodies.get(body).map(|rb| *rb.linvel())
    }

    fn set_linvel(&mut self, body: RigidBodyHandle, linvel: Vec3) {
        if let Some(rb) = self.body_mut(body) {
            rb.set_linvel(linvel, true);
        }
    }

    fn angvel(&self, body: RigidBodyHandle) -> Option<Vec3> {
        self.bodies.get(body).map(|rb| *rb.angvel())
    }

    fn set_angvel(&mut self, body: RigidBodyHandle, angvel: Vec3) {
        if let Some(rb) = self.body_mut(body) {
            rb.set_angvel(angvel, true);
        }
    }

    fn wake_up(&mut self, body: RigidBodyHandle) {
        if let Some(rb) = self.body_mut(body) {
            rb.wake_up(true);
        }
    }

    fn step(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.integration_parameters.dt = dt;

        // Using default hooks/events (none).
        let hooks = ();
        let events = ();

        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &hooks,
            &events,
        );
    }
}
