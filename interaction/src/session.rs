//! The scene session: every piece of mutable interaction state, owned in one place.
//!
//! A [`SceneSession`] owns the scene graph, the physics world, the object registry, the list of
//! interactive entities (with their initial transforms), the controller bindings and the live
//! grab records. The grab state machine ([`crate::grab`]) and the per-frame pass
//! ([`crate::sync`]) both operate on a session passed to them explicitly.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::{
    constants::{
        FIXED_TIMESTEP, GRAB_RANGE, MAX_SUBSTEPS, default_controller_forward, default_gravity,
    },
    error::{RegistryError, SceneError},
    grab::{self, GrabEvent, GrabOutcome},
    physics::PhysicsWorld,
    registry::ObjectRegistry,
    resolver::IntersectionResolver,
    scene::SceneGraph,
    types::{Transform, Vec3},
    velocity::VelocityTracker,
};

/// Tunables for a session and its frame synchronizer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionConfig {
    /// Fixed physics step (seconds).
    pub fixed_timestep: f32,
    /// Upper bound on physics steps per rendered frame.
    pub max_substeps: u32,
    /// Gravity handed to the physics world when the host builds it.
    pub gravity: Vec3,
    /// Local pointing axis of every controller.
    pub controller_forward: Vec3,
    /// Maximum grab distance (meters).
    pub grab_range: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: FIXED_TIMESTEP,
            max_substeps: MAX_SUBSTEPS,
            gravity: default_gravity(),
            controller_forward: default_controller_forward(),
            grab_range: GRAB_RANGE,
        }
    }
}

/// Identifies one tracked input controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerId(pub u8);

impl ControllerId {
    pub const LEFT: ControllerId = ControllerId(0);
    pub const RIGHT: ControllerId = ControllerId(1);
}

/// A grabbable object: its scene node, its body, and where it started.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InteractiveEntity<N, B> {
    pub node: N,
    pub body: B,
    /// World transform captured when the entity was added; restored by a reset.
    pub initial: Transform,
}

/// The live association between a controller and what it holds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrabRecord<N, B> {
    pub entity: N,
    pub body: B,
    /// Controller position history used to compute the throw velocity.
    pub tracker: VelocityTracker,
}

pub type SessionGrabRecord<S, P> =
    GrabRecord<<S as SceneGraph>::Node, <P as PhysicsWorld>::Body>;

pub struct SceneSession<S: SceneGraph, P: PhysicsWorld> {
    pub(crate) scene: S,
    pub(crate) physics: P,
    pub(crate) registry: ObjectRegistry<S::Node, P::Body>,
    pub(crate) entities: Vec<InteractiveEntity<S::Node, P::Body>>,
    pub(crate) controllers: HashMap<ControllerId, S::Node>,
    pub(crate) grabs: HashMap<ControllerId, SessionGrabRecord<S, P>>,
    pub(crate) gated: HashSet<ControllerId>,
    /// Bodies released since the last physics step. Their visuals wait until they are stepped.
    pub(crate) pending_step: HashSet<P::Body>,
    pub(crate) resolver: IntersectionResolver,
    pub(crate) controller_forward: Vec3,
}

impl<S: SceneGraph, P: PhysicsWorld> SceneSession<S, P> {
    pub fn new(scene: S, physics: P, config: &SessionConfig) -> Self {
        Self {
            scene,
            physics,
            registry: ObjectRegistry::new(),
            entities: Vec::new(),
            controllers: HashMap::new(),
            grabs: HashMap::new(),
            gated: HashSet::new(),
            pending_step: HashSet::new(),
            resolver: IntersectionResolver::with_range(config.grab_range),
            controller_forward: config.controller_forward,
        }
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Mutable scene access for hosts that add decorations or animate non-interactive nodes.
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    pub fn registry(&self) -> &ObjectRegistry<S::Node, P::Body> {
        &self.registry
    }

    /// Interactive entities in the order they were added.
    pub fn entities(&self) -> &[InteractiveEntity<S::Node, P::Body>] {
        &self.entities
    }

    /// Make `node` (and its current sub-nodes) a grabbable entity driven by `body`.
    ///
    /// The node's current world transform becomes its initial transform snapshot.
    pub fn add_entity(
        &mut self,
        node: S::Node,
        body: P::Body,
    ) -> Result<(), RegistryError<S::Node>> {
        let initial = self
            .scene
            .world_transform(node)
            .ok_or(RegistryError::UnknownNode(node))?;
        self.registry.register(&self.scene, node, body)?;
        self.entities.push(InteractiveEntity {
            node,
            body,
            initial,
        });
        debug!("session: added entity {node:?} with body {body:?}");
        Ok(())
    }

    /// Bind a controller to the scene node that tracks its pose.
    pub fn attach_controller(
        &mut self,
        controller: ControllerId,
        node: S::Node,
    ) -> Result<(), SceneError<S::Node>> {
        if !self.scene.contains(node) {
            return Err(SceneError::UnknownNode(node));
        }
        self.controllers.insert(controller, node);
        Ok(())
    }

    pub fn controller_node(&self, controller: ControllerId) -> Option<S::Node> {
        self.controllers.get(&controller).copied()
    }

    /// Current world transform of a controller.
    pub fn controller_pose(&self, controller: ControllerId) -> Option<Transform> {
        self.scene.world_transform(self.controller_node(controller)?)
    }

    /// Write the tracked world pose of a controller, as reported by the input source this frame.
    ///
    /// Returns `false` if the controller is unknown or the scene rejected the write.
    pub fn set_controller_pose(&mut self, controller: ControllerId, pose: Transform) -> bool {
        let Some(node) = self.controller_node(controller) else {
            warn!("session: pose for unattached controller {controller:?}");
            return false;
        };
        match self.scene.set_world_transform(node, pose) {
            Ok(()) => true,
            Err(err) => {
                warn!("session: cannot move controller {controller:?}: {err}");
                false
            }
        }
    }

    /// Block or allow grabbing with one controller (e.g. while it aims a teleport).
    pub fn set_grab_gated(&mut self, controller: ControllerId, gated: bool) {
        if gated {
            self.gated.insert(controller);
        } else {
            self.gated.remove(&controller);
        }
    }

    pub fn is_grab_gated(&self, controller: ControllerId) -> bool {
        self.gated.contains(&controller)
    }

    pub fn grab_record(&self, controller: ControllerId) -> Option<&SessionGrabRecord<S, P>> {
        self.grabs.get(&controller)
    }

    pub fn is_holding(&self, controller: ControllerId) -> bool {
        self.grabs.contains_key(&controller)
    }

    /// Entity nodes currently held, with the controller holding each.
    pub fn held_entities(&self) -> impl Iterator<Item = (ControllerId, S::Node)> + '_ {
        self.grabs.iter().map(|(c, r)| (*c, r.entity))
    }

    /// The controller holding `body`, if any.
    ///
    /// # Panics
    /// If two controllers hold the same body. The grab transition makes that state
    /// unreachable; reaching it anyway is a programming error with no recovery.
    pub fn holder_of(&self, body: P::Body) -> Option<ControllerId> {
        let mut holders = self
            .grabs
            .iter()
            .filter(|(_, r)| r.body == body)
            .map(|(c, _)| *c);
        let holder = holders.next();
        assert!(
            holders.next().is_none(),
            "body {body:?} is held by more than one controller"
        );
        holder
    }

    /// Nodes of every interactive entity: the candidate set of the grab ray.
    pub(crate) fn entity_nodes(&self) -> Vec<S::Node> {
        self.entities.iter().map(|e| e.node).collect()
    }

    /// Feed one grab-start / grab-end message through the state machine.
    pub fn handle(&mut self, event: GrabEvent) -> GrabOutcome<S::Node, P::Body> {
        grab::apply_grab_event(self, event)
    }

    /// Drop everything and put every entity back where it started.
    pub fn reset(&mut self) -> usize {
        grab::reset(self)
    }
}
