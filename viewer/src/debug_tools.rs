//! Debug/performance tooling for native dev builds.
//!
//! Besides the perf overlay, shows what each hand holds and whether its grab is gated.

use bevy::diagnostic::{
    EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin, SystemInformationDiagnosticsPlugin,
};
use bevy::prelude::*;
use bevy::render::diagnostic::RenderDiagnosticsPlugin;
use interaction::ControllerId;
use iyes_perf_ui::prelude::*;

use crate::playground::{NodeEntityMapping, Playground, PlaygroundSet};

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        FrameTimeDiagnosticsPlugin::default(),
        EntityCountDiagnosticsPlugin::default(),
        SystemInformationDiagnosticsPlugin::default(),
        RenderDiagnosticsPlugin,
        PerfUiPlugin,
    ));

    app.add_systems(Startup, (spawn_perf_ui, spawn_grab_status));
    app.add_systems(Update, update_grab_status.after(PlaygroundSet::Present));
}

#[derive(Component)]
struct GrabStatusText;

fn spawn_perf_ui(mut commands: Commands) {
    commands.spawn(PerfUiAllEntries::default());
}

fn spawn_grab_status(mut commands: Commands) {
    commands.spawn((
        GrabStatusText,
        Text::new(""),
        Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(8.0),
            left: Val::Px(8.0),
            ..default()
        },
    ));
}

fn update_grab_status(
    playground: Option<Res<Playground>>,
    mapping: Res<NodeEntityMapping>,
    mut text: Single<&mut Text, With<GrabStatusText>>,
) {
    let Some(playground) = playground else {
        return;
    };
    let session = &playground.session;

    let mut lines = Vec::new();
    for (label, controller) in [("left", ControllerId::LEFT), ("right", ControllerId::RIGHT)] {
        let holding = session
            .grab_record(controller)
            .and_then(|r| session.scene().name(r.entity))
            .unwrap_or("-");
        let gate = if session.is_grab_gated(controller) {
            " [gated]"
        } else {
            ""
        };
        lines.push(format!("{label}: {holding}{gate}"));
    }
    lines.push(format!("visuals: {}", mapping.0.len()));

    text.0 = lines.join("\n");
}
