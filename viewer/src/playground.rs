//! The interaction session as a bevy resource, plus the scene it starts with.
//!
//! The session's scene graph is the source of truth for every pose. Bevy entities are flat
//! (no bevy hierarchy) and only mirror the world transform of the scene node they stand for.

use bevy::{platform::collections::HashMap, prelude::*};
use interaction::{
    BodyDef, ControllerId, FrameSynchronizer, NodeId, RapierPhysics, SceneGraph, SceneSession,
    SceneTree, SessionConfig, ShapeDef, WorldStaticDef,
};
use nalgebra as na;

use crate::hands::Hand;

pub(super) fn plugin(app: &mut App) {
    app.insert_resource(NodeEntityMapping::default());
    app.configure_sets(
        Update,
        (
            PlaygroundSet::Input,
            PlaygroundSet::Simulate,
            PlaygroundSet::Present,
        )
            .chain(),
    );
    app.add_systems(Startup, setup);
    app.add_systems(Update, step.in_set(PlaygroundSet::Simulate));
    app.add_systems(Update, mirror_transforms.in_set(PlaygroundSet::Present));
}

/// Per-frame ordering: controller input and grab events, then the frame pass, then visuals.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaygroundSet {
    Input,
    Simulate,
    Present,
}

pub type Session = SceneSession<SceneTree, RapierPhysics>;

#[derive(Resource)]
pub struct Playground {
    pub session: Session,
    pub sync: FrameSynchronizer,
}

/// Used to tie a scene node to the bevy entity that draws it.
#[derive(Resource, Default)]
pub struct NodeEntityMapping(pub HashMap<NodeId, Entity>);

/// Marks a bevy entity as the visual of a scene node; which node is kept in
/// [`NodeEntityMapping`].
#[derive(Component, Debug, Clone, Copy)]
pub struct SceneNode;

const HAND_HEIGHT: f32 = 1.2;
const HAND_SPREAD: f32 = 0.3;
/// Hands start tilted down (radians about +X) so their rays reach props resting on the floor.
const HAND_PITCH: f32 = -0.6;

struct PropDef {
    name: &'static str,
    at: [f32; 3],
    shape: ShapeDef,
    color: Color,
}

fn prop_defs() -> Vec<PropDef> {
    vec![
        PropDef {
            name: "crate",
            at: [-HAND_SPREAD, HAND_HEIGHT, -1.5],
            shape: ShapeDef::from_extent(na::Vector3::new(0.3, 0.3, 0.3)),
            color: Color::srgb_u8(181, 136, 84),
        },
        PropDef {
            name: "ball",
            at: [HAND_SPREAD, HAND_HEIGHT, -1.5],
            shape: ShapeDef::Sphere { radius: 0.15 },
            color: Color::srgb_u8(220, 70, 60),
        },
        PropDef {
            name: "can",
            at: [0.0, HAND_HEIGHT + 0.4, -2.0],
            shape: ShapeDef::CylinderY {
                radius: 0.08,
                half_height: 0.12,
            },
            color: Color::srgb_u8(124, 144, 255),
        },
        PropDef {
            name: "pill",
            at: [-HAND_SPREAD, HAND_HEIGHT + 0.4, -2.5],
            shape: ShapeDef::CapsuleY {
                radius: 0.07,
                half_height: 0.15,
            },
            color: Color::srgb_u8(240, 220, 90),
        },
    ]
}

/// Render mesh matching a pick/collider shape. Half-spaces have none.
fn mesh_for(shape: &ShapeDef) -> Option<Mesh> {
    let mesh = match shape {
        ShapeDef::Plane { .. } => return None,
        ShapeDef::Cuboid { half_extents }
        | ShapeDef::RoundCuboid { half_extents, .. } => Mesh::from(Cuboid::new(
            half_extents.x * 2.0,
            half_extents.y * 2.0,
            half_extents.z * 2.0,
        )),
        ShapeDef::Sphere { radius } => Mesh::from(Sphere::new(*radius)),
        ShapeDef::CapsuleY {
            radius,
            half_height,
        } => Mesh::from(Capsule3d::new(*radius, half_height * 2.0)),
        ShapeDef::CylinderY {
            radius,
            half_height,
        }
        | ShapeDef::RoundCylinderY {
            radius,
            half_height,
            ..
        } => Mesh::from(Cylinder::new(*radius, half_height * 2.0)),
        ShapeDef::ConeY {
            radius,
            half_height,
        }
        | ShapeDef::RoundConeY {
            radius,
            half_height,
            ..
        } => Mesh::from(Cone {
            radius: *radius,
            height: half_height * 2.0,
        }),
    };
    Some(mesh)
}

/// Scene-graph transform to a bevy `Transform` (unit scale).
pub fn to_bevy(t: &interaction::Transform) -> Transform {
    let q = t.rotation.quaternion();
    Transform {
        translation: Vec3::new(t.translation.x, t.translation.y, t.translation.z),
        rotation: Quat::from_xyzw(q.i, q.j, q.k, q.w),
        scale: Vec3::ONE,
    }
}

fn at(v: [f32; 3]) -> interaction::Transform {
    interaction::Transform::from_translation(na::Vector3::new(v[0], v[1], v[2]))
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut mapping: ResMut<NodeEntityMapping>,
) {
    let config = SessionConfig::default();
    let mut scene = SceneTree::new();
    let mut physics = RapierPhysics::new(config.gravity);
    physics.insert_statics(vec![WorldStaticDef::floor(0, 0.0)]);
    let root = scene.root();

    let mut entities = Vec::new();
    for def in prop_defs() {
        let pose = at(def.at);
        let Ok(node) = scene.spawn(root, def.name, pose) else {
            continue;
        };
        // The grabbable mesh sits one level below the entity, like a loaded model's mesh.
        let Ok(mesh_node) = scene.spawn_with_shape(
            node,
            format!("{}/mesh", def.name),
            interaction::Transform::identity(),
            def.shape.clone(),
        ) else {
            continue;
        };
        let body = physics.insert_body(&BodyDef::new(pose, def.shape.clone()));
        entities.push((node, body));

        if let Some(mesh) = mesh_for(&def.shape) {
            let visual = commands
                .spawn((
                    Name::new(def.name),
                    SceneNode,
                    Mesh3d(meshes.add(mesh)),
                    MeshMaterial3d(materials.add(def.color)),
                    to_bevy(&pose),
                ))
                .id();
            mapping.0.insert(mesh_node, visual);
        }
    }

    let mut hands = Vec::new();
    for (controller, x, color) in [
        (ControllerId::LEFT, -HAND_SPREAD, Color::srgb_u8(90, 200, 120)),
        (ControllerId::RIGHT, HAND_SPREAD, Color::srgb_u8(90, 160, 230)),
    ] {
        let pose = interaction::Transform::new(
            na::Vector3::new(x, HAND_HEIGHT, 0.0),
            na::UnitQuaternion::from_axis_angle(&na::Vector3::x_axis(), HAND_PITCH),
        );
        let Ok(hand) = scene.spawn(root, format!("hand/{}", controller.0), pose) else {
            continue;
        };
        // Pointer stub along the forward axis; no pick shape, it is never grabbed.
        let Ok(pointer) = scene.spawn(
            hand,
            format!("hand/{}/pointer", controller.0),
            at([0.0, 0.0, -0.1]),
        ) else {
            continue;
        };
        hands.push((controller, hand));

        let grip = commands
            .spawn((
                Name::new(format!("hand {}", controller.0)),
                Hand(controller),
                SceneNode,
                Mesh3d(meshes.add(Sphere::new(0.04))),
                MeshMaterial3d(materials.add(color)),
                to_bevy(&pose),
            ))
            .id();
        mapping.0.insert(hand, grip);

        let stub = commands
            .spawn((
                SceneNode,
                Mesh3d(meshes.add(Cuboid::new(0.01, 0.01, 0.2))),
                MeshMaterial3d(materials.add(color)),
                Transform::default(),
            ))
            .id();
        mapping.0.insert(pointer, stub);
    }

    let hand_count = hands.len();
    let mut session = SceneSession::new(scene, physics, &config);
    for (node, body) in entities {
        if let Err(err) = session.add_entity(node, body) {
            warn!("playground: {err}");
        }
    }
    for (controller, hand) in hands {
        if let Err(err) = session.attach_controller(controller, hand) {
            warn!("playground: {err}");
        }
    }

    info!(
        "playground: {} props, {hand_count} hands, {} visuals",
        session.entities().len(),
        mapping.0.len()
    );
    commands.insert_resource(Playground {
        session,
        sync: FrameSynchronizer::new(&config),
    });
}

fn step(time: Res<Time>, playground: Option<ResMut<Playground>>) {
    let Some(mut playground) = playground else {
        return;
    };
    let Playground { session, sync } = &mut *playground;
    sync.run(session, time.delta_secs());
}

fn mirror_transforms(
    playground: Option<Res<Playground>>,
    mapping: Res<NodeEntityMapping>,
    mut visuals: Query<&mut Transform, With<SceneNode>>,
) {
    let Some(playground) = playground else {
        return;
    };
    let scene = playground.session.scene();
    for (node, entity) in mapping.0.iter() {
        let Some(world) = scene.world_transform(*node) else {
            continue;
        };
        if let Ok(mut transform) = visuals.get_mut(*entity) {
            *transform = to_bevy(&world);
        }
    }
}
