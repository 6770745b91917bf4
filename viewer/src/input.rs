use bevy::prelude::*;
use leafwing_input_manager::prelude::*;

/// Keyboard stand-ins for two tracked controllers.
#[derive(Reflect, Actionlike, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputAction {
    #[actionlike(DualAxis)]
    LeftHandMove,
    #[actionlike(Axis)]
    LeftHandLift,
    LeftGrab,
    #[actionlike(DualAxis)]
    RightHandMove,
    #[actionlike(Axis)]
    RightHandLift,
    RightGrab,
    /// Put every prop back where it started.
    Reset,
    /// Block / unblock grabbing with the left hand, as a teleport-aim mode would.
    ToggleLeftGate,
}

pub(super) fn plugin(app: &mut App) {
    app.add_plugins(InputManagerPlugin::<InputAction>::default());

    app.register_type::<InputAction>();

    let mut input_map = InputMap::<InputAction>::default();
    input_map.insert_dual_axis(InputAction::LeftHandMove, VirtualDPad::wasd());
    input_map.insert_axis(
        InputAction::LeftHandLift,
        VirtualAxis::new(KeyCode::KeyQ, KeyCode::KeyE),
    );
    input_map.insert(InputAction::LeftGrab, KeyCode::KeyF);
    input_map.insert_dual_axis(InputAction::RightHandMove, VirtualDPad::arrow_keys());
    input_map.insert_axis(
        InputAction::RightHandLift,
        VirtualAxis::new(KeyCode::PageDown, KeyCode::PageUp),
    );
    input_map.insert(InputAction::RightGrab, KeyCode::Enter);
    input_map.insert(InputAction::Reset, KeyCode::KeyR);
    input_map.insert(InputAction::ToggleLeftGate, KeyCode::KeyG);
    app.insert_resource(input_map);
    app.insert_resource(ActionState::<InputAction>::default());
}
