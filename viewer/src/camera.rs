use crate::{hands::Hand, playground::PlaygroundSet};
use bevy::{camera::Exposure, prelude::*};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, add_camera);
    app.add_systems(Update, follow_hands.after(PlaygroundSet::Present));
}

/// Camera position relative to the midpoint between the two hands: the viewer's head.
const CAMERA_OFFSET: Vec3 = Vec3::new(0.0, 0.45, 0.9);
const CAMERA_DECAY_RATE: f32 = 6.0;

fn add_camera(mut commands: Commands) {
    commands.spawn((
        Exposure { ev100: 9.0 },
        bevy::core_pipeline::tonemapping::Tonemapping::AcesFitted,
        Camera3d::default(),
        Transform::from_translation(Vec3::new(0.0, 1.2, 0.0) + CAMERA_OFFSET)
            .looking_at(Vec3::new(0.0, 0.4, -2.0), Vec3::Y),
        DistanceFog {
            color: Color::srgba(0.35, 0.48, 0.66, 1.0),
            directional_light_color: Color::srgba(1.0, 0.95, 0.85, 0.5),
            directional_light_exponent: 30.0,
            falloff: FogFalloff::from_visibility_colors(
                60.0, // Fog distance
                Color::srgb(0.35, 0.5, 0.66),
                Color::srgb(0.8, 0.8, 0.7),
            ),
        },
    ));
}

/// Keep the head loosely centered behind the hands; orientation stays fixed.
fn follow_hands(
    mut camera: Single<&mut Transform, With<Camera3d>>,
    hands: Query<&Transform, (With<Hand>, Without<Camera3d>)>,
    time: Res<Time>,
) {
    let (sum, count) = hands
        .iter()
        .fold((Vec3::ZERO, 0.0), |(sum, n), t| (sum + t.translation, n + 1.0));
    if count == 0.0 {
        return;
    }

    let target = sum / count + CAMERA_OFFSET;
    camera
        .translation
        .smooth_nudge(&target, CAMERA_DECAY_RATE, time.delta_secs());
}
