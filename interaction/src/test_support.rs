use rapier3d::prelude::RigidBodyHandle;

use crate::{
    physics::RapierPhysics,
    rapier::{BodyDef, ShapeDef},
    scene::{NodeId, SceneGraph, SceneTree},
    session::{ControllerId, SceneSession, SessionConfig},
    types::{Quat, Transform, Vec3},
};

pub(crate) type TestSession = SceneSession<SceneTree, RapierPhysics>;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Props {
    pub left: NodeId,
    pub left_body: RigidBodyHandle,
    pub right: NodeId,
    pub right_body: RigidBodyHandle,
    pub far: NodeId,
    pub far_body: RigidBodyHandle,
}

fn spawn_prop(
    scene: &mut SceneTree,
    physics: &mut RapierPhysics,
    name: &str,
    at: Vec3,
) -> (NodeId, RigidBodyHandle) {
    let root = scene.root();
    let shape = ShapeDef::from_extent(Vec3::repeat(0.5));
    let pose = Transform::from_translation(at);

    let node = scene.spawn(root, name, pose).unwrap();
    scene
        .spawn_with_shape(node, format!("{name}/mesh"), Transform::identity(), shape.clone())
        .unwrap();
    let body = physics.insert_body(&BodyDef::new(pose, shape));
    (node, body)
}

/// Yawed toward +X and pitched down so that from [`left_hand_pose`] it points at the left prop.
pub(crate) fn left_hand_rotation() -> Quat {
    Quat::from_axis_angle(&Vec3::y_axis(), -0.25) * Quat::from_axis_angle(&Vec3::x_axis(), -0.25)
}

pub(crate) fn left_hand_pose() -> Transform {
    Transform::new(Vec3::new(-1.5, 1.5, 0.0), left_hand_rotation())
}

/// No floor, default gravity. Each controller points at its own prop about two meters away:
/// the left one from above and to the side with a rotated grip, the right one straight down -Z.
/// A third prop sits out of both rays.
pub(crate) fn props_session() -> (TestSession, Props) {
    let mut scene = SceneTree::new();
    let mut physics = RapierPhysics::default();
    let root = scene.root();

    let left_hand = scene.spawn(root, "left_hand", left_hand_pose()).unwrap();
    let right_hand = scene
        .spawn(root, "right_hand", Transform::from_translation(Vec3::new(1.0, 1.0, 0.0)))
        .unwrap();

    let (left, left_body) =
        spawn_prop(&mut scene, &mut physics, "left_prop", Vec3::new(-1.0, 1.0, -2.0));
    let (right, right_body) =
        spawn_prop(&mut scene, &mut physics, "right_prop", Vec3::new(1.0, 1.0, -2.0));
    let (far, far_body) =
        spawn_prop(&mut scene, &mut physics, "far_prop", Vec3::new(0.0, 1.0, -4.0));

    let mut session = SceneSession::new(scene, physics, &SessionConfig::default());
    session.attach_controller(ControllerId::LEFT, left_hand).unwrap();
    session.attach_controller(ControllerId::RIGHT, right_hand).unwrap();
    for (node, body) in [(left, left_body), (right, right_body), (far, far_body)] {
        session.add_entity(node, body).unwrap();
    }

    (
        session,
        Props {
            left,
            left_body,
            right,
            right_body,
            far,
            far_body,
        },
    )
}

/// Put `controller` two meters in front of `node`, pointing at it.
pub(crate) fn aim_at(session: &mut TestSession, controller: ControllerId, node: NodeId) {
    let target = session.scene().world_transform(node).unwrap().translation;
    let pose = Transform::from_translation(target + Vec3::new(0.0, 0.0, 2.0));
    assert!(session.set_controller_pose(controller, pose));
}
