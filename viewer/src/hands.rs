use bevy::prelude::*;
use interaction::{ControllerId, GrabEvent, GrabOutcome};
use leafwing_input_manager::prelude::ActionState;
use nalgebra as na;

use crate::{
    input::InputAction,
    playground::{Playground, PlaygroundSet},
};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        (move_hands, grab_buttons, session_buttons)
            .chain()
            .in_set(PlaygroundSet::Input),
    );
}

/// Marks the grip visual of a simulated controller.
#[derive(Component, Debug, Clone, Copy)]
pub struct Hand(pub ControllerId);

/// Hand travel speed (meters per second).
const HAND_SPEED: f32 = 1.5;

struct HandBindings {
    controller: ControllerId,
    planar: InputAction,
    lift: InputAction,
    grab: InputAction,
}

const HANDS: [HandBindings; 2] = [
    HandBindings {
        controller: ControllerId::LEFT,
        planar: InputAction::LeftHandMove,
        lift: InputAction::LeftHandLift,
        grab: InputAction::LeftGrab,
    },
    HandBindings {
        controller: ControllerId::RIGHT,
        planar: InputAction::RightHandMove,
        lift: InputAction::RightHandLift,
        grab: InputAction::RightGrab,
    },
];

/// Write this frame's controller poses, standing in for the XR runtime's tracked poses.
fn move_hands(
    actions: Res<ActionState<InputAction>>,
    time: Res<Time>,
    playground: Option<ResMut<Playground>>,
) {
    let Some(mut playground) = playground else {
        return;
    };
    let step = HAND_SPEED * time.delta_secs();

    for hand in &HANDS {
        let planar = actions.axis_pair(&hand.planar);
        let lift = actions.value(&hand.lift);
        if planar == Vec2::ZERO && lift == 0.0 {
            continue;
        }
        let Some(pose) = playground.session.controller_pose(hand.controller) else {
            continue;
        };

        // Screen up on the d-pad moves the hand away from the viewer (-Z).
        let delta = na::Vector3::new(planar.x, lift, -planar.y) * step;
        playground.session.set_controller_pose(
            hand.controller,
            interaction::Transform::new(pose.translation + delta, pose.rotation),
        );
    }
}

fn grab_buttons(actions: Res<ActionState<InputAction>>, playground: Option<ResMut<Playground>>) {
    let Some(mut playground) = playground else {
        return;
    };

    for hand in &HANDS {
        let controller = hand.controller;
        let event = if actions.just_pressed(&hand.grab) {
            GrabEvent::GrabStart { controller }
        } else if actions.just_released(&hand.grab) {
            GrabEvent::GrabEnd { controller }
        } else {
            continue;
        };

        match playground.session.handle(event) {
            GrabOutcome::Grabbed { entity, .. } => {
                let name = playground.session.scene().name(entity).unwrap_or("?");
                info!("{controller:?} grabbed {name}");
            }
            GrabOutcome::Released {
                entity, velocity, ..
            } => {
                let name = playground.session.scene().name(entity).unwrap_or("?");
                info!("{controller:?} threw {name} at {:.2} m/s", velocity.norm());
            }
            GrabOutcome::Ignored(reason) => {
                debug!("{controller:?}: {event:?} ignored ({reason:?})");
            }
        }
    }
}

fn session_buttons(
    actions: Res<ActionState<InputAction>>,
    playground: Option<ResMut<Playground>>,
) {
    let Some(mut playground) = playground else {
        return;
    };

    if actions.just_pressed(&InputAction::Reset) {
        let released = playground.session.reset();
        info!("reset: props restored, {released} grabs dropped");
    }

    if actions.just_pressed(&InputAction::ToggleLeftGate) {
        let gated = !playground.session.is_grab_gated(ControllerId::LEFT);
        playground
            .session
            .set_grab_gated(ControllerId::LEFT, gated);
        info!("left hand grabbing {}", if gated { "blocked" } else { "allowed" });
    }
}
