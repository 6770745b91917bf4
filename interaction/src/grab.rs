//! Grab / release state machine, one instance per controller.
//!
//! A controller is either idle or holding exactly one entity; holding is represented by a
//! [`GrabRecord`] in the session. Every transition runs to completion before the next event
//! or frame is processed, so no intermediate state is ever observable.

use log::{debug, trace, warn};

use crate::{
    physics::{BodyMode, PhysicsWorld},
    scene::SceneGraph,
    session::{ControllerId, GrabRecord, SceneSession},
    types::{Ray, Vec3},
    velocity::VelocityTracker,
};

/// Input-layer message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrabEvent {
    /// Trigger / squeeze pressed.
    GrabStart { controller: ControllerId },
    /// Trigger / squeeze released.
    GrabEnd { controller: ControllerId },
}

impl GrabEvent {
    pub fn controller(&self) -> ControllerId {
        match *self {
            GrabEvent::GrabStart { controller } | GrabEvent::GrabEnd { controller } => controller,
        }
    }
}

/// Why an event left the session untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Grab start while already holding something.
    AlreadyHolding,
    /// Grab start while grabbing is gated off for this controller.
    Gated,
    /// The controller was never attached to a scene node.
    UnknownController,
    /// The pointer ray hit no interactive entity.
    NoTarget,
    /// The entity pointed at is held by the given controller.
    HeldElsewhere(ControllerId),
    /// The scene refused to attach the entity to the controller.
    AttachFailed,
    /// Grab end while idle.
    NotHolding,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GrabOutcome<N, B> {
    Grabbed {
        entity: N,
        body: B,
    },
    Released {
        entity: N,
        body: B,
        /// Linear velocity handed to the body.
        velocity: Vec3,
    },
    Ignored(IgnoreReason),
}

impl<N, B> GrabOutcome<N, B> {
    pub fn is_ignored(&self) -> bool {
        matches!(self, GrabOutcome::Ignored(_))
    }
}

pub fn apply_grab_event<S, P>(
    session: &mut SceneSession<S, P>,
    event: GrabEvent,
) -> GrabOutcome<S::Node, P::Body>
where
    S: SceneGraph,
    P: PhysicsWorld,
{
    let outcome = match event {
        GrabEvent::GrabStart { controller } => grab_start(session, controller),
        GrabEvent::GrabEnd { controller } => grab_end(session, controller),
    };
    if let GrabOutcome::Ignored(reason) = outcome {
        trace!("grab: {event:?} ignored ({reason:?})");
    }
    outcome
}

/// Idle -> Holding.
///
/// The entity under the controller's pointer ray is attached to the controller node (keeping
/// its world transform) and its body becomes kinematic with all motion cleared.
pub fn grab_start<S, P>(
    session: &mut SceneSession<S, P>,
    controller: ControllerId,
) -> GrabOutcome<S::Node, P::Body>
where
    S: SceneGraph,
    P: PhysicsWorld,
{
    if session.is_holding(controller) {
        return GrabOutcome::Ignored(IgnoreReason::AlreadyHolding);
    }
    if session.is_grab_gated(controller) {
        return GrabOutcome::Ignored(IgnoreReason::Gated);
    }

    let Some(controller_node) = session.controller_node(controller) else {
        return GrabOutcome::Ignored(IgnoreReason::UnknownController);
    };
    let Some(pose) = session.scene.world_transform(controller_node) else {
        return GrabOutcome::Ignored(IgnoreReason::UnknownController);
    };
    let Some(ray) = Ray::from_pointer(&pose, &session.controller_forward) else {
        return GrabOutcome::Ignored(IgnoreReason::NoTarget);
    };

    let candidates = session.entity_nodes();
    let Some(target) =
        session
            .resolver
            .resolve(&session.scene, &session.registry, &ray, &candidates)
    else {
        return GrabOutcome::Ignored(IgnoreReason::NoTarget);
    };

    if let Some(holder) = session.holder_of(target.body) {
        return GrabOutcome::Ignored(IgnoreReason::HeldElsewhere(holder));
    }

    // Reparent first: it is the only step that can fail, and nothing has changed yet.
    if let Err(err) = session
        .scene
        .reparent_preserving_world(target.entity, controller_node)
    {
        warn!(
            "grab: cannot attach {:?} to {controller:?}: {err}",
            target.entity
        );
        return GrabOutcome::Ignored(IgnoreReason::AttachFailed);
    }

    // Position-based kinematic bodies ignore velocity writes: clear motion while still dynamic.
    session.physics.set_linvel(target.body, Vec3::zeros());
    session.physics.set_angvel(target.body, Vec3::zeros());
    session.physics.set_mode(target.body, BodyMode::Kinematic);

    session.grabs.insert(
        controller,
        GrabRecord {
            entity: target.entity,
            body: target.body,
            tracker: VelocityTracker::new(pose.translation),
        },
    );

    debug!("grab: {controller:?} picked up {:?}", target.entity);
    GrabOutcome::Grabbed {
        entity: target.entity,
        body: target.body,
    }
}

/// Holding -> Idle.
///
/// The entity goes back under the scene root at its current world transform and its body
/// becomes dynamic again, carrying the controller's last tracked velocity. Angular velocity is
/// not transferred.
pub fn grab_end<S, P>(
    session: &mut SceneSession<S, P>,
    controller: ControllerId,
) -> GrabOutcome<S::Node, P::Body>
where
    S: SceneGraph,
    P: PhysicsWorld,
{
    let Some(record) = session.grabs.remove(&controller) else {
        return GrabOutcome::Ignored(IgnoreReason::NotHolding);
    };

    let root = session.scene.root();
    if let Err(err) = session.scene.reparent_preserving_world(record.entity, root) {
        // The body must still be released or it would stay frozen in place.
        warn!(
            "grab: cannot detach {:?} from {controller:?}: {err}",
            record.entity
        );
    }

    let velocity = record.tracker.velocity();
    session.physics.set_mode(record.body, BodyMode::Dynamic);
    session.physics.wake_up(record.body);
    session.physics.set_linvel(record.body, velocity);
    session.pending_step.insert(record.body);

    debug!(
        "grab: {controller:?} released {:?} at {:.2} m/s",
        record.entity,
        velocity.norm()
    );
    GrabOutcome::Released {
        entity: record.entity,
        body: record.body,
        velocity,
    }
}

/// Release every grab, then put every entity back at its initial transform, at rest and
/// dynamic. Returns how many grabs were released.
pub fn reset<S, P>(session: &mut SceneSession<S, P>) -> usize
where
    S: SceneGraph,
    P: PhysicsWorld,
{
    let mut holding: Vec<ControllerId> = session.grabs.keys().copied().collect();
    holding.sort();
    for controller in &holding {
        grab_end(session, *controller);
    }

    for entity in &session.entities {
        let body = entity.body;
        session.physics.set_mode(body, BodyMode::Dynamic);
        session.physics.set_pose(body, entity.initial.to_body_pose());
        session.physics.set_linvel(body, Vec3::zeros());
        session.physics.set_angvel(body, Vec3::zeros());
        session.physics.wake_up(body);
        session.pending_step.insert(body);

        if let Err(err) = session
            .scene
            .set_world_transform(entity.node, entity.initial)
        {
            warn!("reset: cannot restore {:?}: {err}", entity.node);
        }
    }
    session.grabs.clear();

    debug!(
        "reset: {} entities restored, {} grabs released",
        session.entities.len(),
        holding.len()
    );
    holding.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::TRANSFORM_EPS,
        test_support::{Props, aim_at, left_hand_rotation, props_session},
        types::{Quat, Transform},
    };

    const LEFT: ControllerId = ControllerId::LEFT;
    const RIGHT: ControllerId = ControllerId::RIGHT;

    fn start(controller: ControllerId) -> GrabEvent {
        GrabEvent::GrabStart { controller }
    }

    fn end(controller: ControllerId) -> GrabEvent {
        GrabEvent::GrabEnd { controller }
    }

    #[test]
    fn grab_attaches_entity_and_makes_body_kinematic() {
        let (mut session, props) = props_session();
        let before = session.scene().world_transform(props.left).unwrap();
        session
            .physics_mut()
            .set_linvel(props.left_body, Vec3::new(0.0, -3.0, 0.0));

        let outcome = session.handle(start(LEFT));

        assert_eq!(
            outcome,
            GrabOutcome::Grabbed {
                entity: props.left,
                body: props.left_body
            }
        );
        let left_node = session.controller_node(LEFT).unwrap();
        assert_eq!(session.scene().parent(props.left), Some(left_node));
        assert!(
            session
                .scene()
                .world_transform(props.left)
                .unwrap()
                .approx_eq(&before, TRANSFORM_EPS)
        );
        // The grip is rotated, so the attach offset has to undo that rotation.
        let local = session.scene().local_transform(props.left).unwrap();
        let undone = Transform::new(local.translation, left_hand_rotation().inverse());
        assert!(local.approx_eq(&undone, TRANSFORM_EPS));
        assert_eq!(
            session.physics().mode(props.left_body),
            Some(BodyMode::Kinematic)
        );
        assert_eq!(session.physics().linvel(props.left_body), Some(Vec3::zeros()));
        assert_eq!(session.physics().angvel(props.left_body), Some(Vec3::zeros()));
        assert_eq!(session.holder_of(props.left_body), Some(LEFT));
    }

    #[test]
    fn grab_with_nothing_under_the_ray_changes_nothing() {
        let (mut session, props) = props_session();
        let pointing_up = Transform::new(
            Vec3::new(-1.0, 1.0, 0.0),
            Quat::from_axis_angle(&Vec3::x_axis(), std::f32::consts::FRAC_PI_2),
        );
        session.set_controller_pose(LEFT, pointing_up);

        assert_eq!(
            session.handle(start(LEFT)),
            GrabOutcome::Ignored(IgnoreReason::NoTarget)
        );
        assert!(!session.is_holding(LEFT));
        assert_eq!(
            session.physics().mode(props.left_body),
            Some(BodyMode::Dynamic)
        );
        assert_eq!(session.scene().parent(props.left), Some(session.scene().root()));
    }

    #[test]
    fn second_grab_while_holding_is_ignored() {
        let (mut session, props) = props_session();
        session.handle(start(LEFT));
        aim_at(&mut session, LEFT, props.right);

        assert_eq!(
            session.handle(start(LEFT)),
            GrabOutcome::Ignored(IgnoreReason::AlreadyHolding)
        );
        assert_eq!(session.grab_record(LEFT).unwrap().entity, props.left);
        assert_eq!(
            session.physics().mode(props.right_body),
            Some(BodyMode::Dynamic)
        );
    }

    #[test]
    fn gated_controller_cannot_grab_but_can_release() {
        let (mut session, props) = props_session();
        session.set_grab_gated(LEFT, true);
        assert_eq!(
            session.handle(start(LEFT)),
            GrabOutcome::Ignored(IgnoreReason::Gated)
        );

        session.set_grab_gated(LEFT, false);
        assert!(!session.handle(start(LEFT)).is_ignored());

        session.set_grab_gated(LEFT, true);
        assert!(matches!(
            session.handle(end(LEFT)),
            GrabOutcome::Released { entity, .. } if entity == props.left
        ));
    }

    #[test]
    fn grab_end_while_idle_is_a_no_op() {
        let (mut session, _) = props_session();
        assert_eq!(
            session.handle(end(RIGHT)),
            GrabOutcome::Ignored(IgnoreReason::NotHolding)
        );
    }

    #[test]
    fn unattached_controller_is_ignored() {
        let (mut session, _) = props_session();
        assert_eq!(
            session.handle(start(ControllerId(7))),
            GrabOutcome::Ignored(IgnoreReason::UnknownController)
        );
    }

    #[test]
    fn an_entity_has_at_most_one_holder() {
        let (mut session, props) = props_session();
        assert!(!session.handle(start(LEFT)).is_ignored());

        aim_at(&mut session, RIGHT, props.left);
        assert_eq!(
            session.handle(start(RIGHT)),
            GrabOutcome::Ignored(IgnoreReason::HeldElsewhere(LEFT))
        );
        assert!(!session.is_holding(RIGHT));
        assert_eq!(
            session.scene().parent(props.left),
            session.controller_node(LEFT)
        );

        // Once the first hand lets go the second can take it.
        session.handle(end(LEFT));
        aim_at(&mut session, RIGHT, props.left);
        assert_eq!(
            session.handle(start(RIGHT)),
            GrabOutcome::Grabbed {
                entity: props.left,
                body: props.left_body
            }
        );
        assert_eq!(session.holder_of(props.left_body), Some(RIGHT));
    }

    #[test]
    fn release_returns_entity_to_root_as_dynamic() {
        let (mut session, props) = props_session();
        session.handle(start(LEFT));
        let held = session.scene().world_transform(props.left).unwrap();

        let outcome = session.handle(end(LEFT));

        assert_eq!(
            outcome,
            GrabOutcome::Released {
                entity: props.left,
                body: props.left_body,
                velocity: Vec3::zeros()
            }
        );
        assert_eq!(session.scene().parent(props.left), Some(session.scene().root()));
        assert!(
            session
                .scene()
                .world_transform(props.left)
                .unwrap()
                .approx_eq(&held, TRANSFORM_EPS)
        );
        assert_eq!(
            session.physics().mode(props.left_body),
            Some(BodyMode::Dynamic)
        );
        assert!(session.grab_record(LEFT).is_none());
        assert_eq!(session.holder_of(props.left_body), None);
    }

    #[test]
    fn moved_and_turned_hand_releases_where_the_entity_is_shown() {
        let (mut session, props) = props_session();
        session.handle(start(LEFT));
        let offset = session.scene().local_transform(props.left).unwrap();

        let yaw = Quat::from_axis_angle(&Vec3::y_axis(), 1.1);
        let roll = Quat::from_axis_angle(&Vec3::z_axis(), 0.7);
        let turned = Transform::new(Vec3::new(0.4, 2.0, -0.5), yaw * roll);
        session.set_controller_pose(LEFT, turned);
        let held = session.scene().world_transform(props.left).unwrap();
        assert!(held.approx_eq(&turned.compose(&offset), TRANSFORM_EPS));
        assert!(held.rotation.angle_to(&Quat::identity()) > 0.1);

        session.handle(end(LEFT));

        assert_eq!(session.scene().parent(props.left), Some(session.scene().root()));
        let released = session.scene().world_transform(props.left).unwrap();
        assert!(released.approx_eq(&held, TRANSFORM_EPS));
        assert!(
            session
                .scene()
                .local_transform(props.left)
                .unwrap()
                .approx_eq(&held, TRANSFORM_EPS)
        );
    }

    #[test]
    fn reset_releases_everything_and_restores_snapshots() {
        let (mut session, props) = props_session();
        let Props {
            left,
            left_body,
            right,
            right_body,
            ..
        } = props;
        session.handle(start(LEFT));
        session.handle(start(RIGHT));
        session.set_controller_pose(LEFT, Transform::from_translation(Vec3::new(-3.0, 2.0, 1.0)));
        let far_away = Transform::from_translation(Vec3::new(5.0, 5.0, 5.0));
        session
            .physics_mut()
            .set_pose(right_body, far_away.to_body_pose());

        assert_eq!(session.reset(), 2);

        assert_eq!(session.held_entities().count(), 0);
        for entity in session.entities() {
            let visual = session.scene().world_transform(entity.node).unwrap();
            let body = Transform::from_body_pose(&session.physics().pose(entity.body).unwrap());
            assert!(visual.approx_eq(&entity.initial, TRANSFORM_EPS), "{:?}", entity.node);
            assert!(body.approx_eq(&entity.initial, TRANSFORM_EPS), "{:?}", entity.node);
            assert_eq!(session.physics().mode(entity.body), Some(BodyMode::Dynamic));
            assert_eq!(session.physics().linvel(entity.body), Some(Vec3::zeros()));
            assert_eq!(session.physics().angvel(entity.body), Some(Vec3::zeros()));
        }
        for node in [left, right] {
            assert_eq!(session.scene().parent(node), Some(session.scene().root()));
        }
        assert_eq!(session.holder_of(left_body), None);
    }
}
