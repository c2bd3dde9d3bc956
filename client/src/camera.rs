use bevy::{camera::Exposure, prelude::*, transform::TransformSystems};

use crate::{convert::to_bevy_vec, simulation::Session};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, add_camera);
    app.add_systems(PostUpdate, follow_rig.before(TransformSystems::Propagate));
}

fn add_camera(mut commands: Commands, session: Res<Session>) {
    let rig = session.camera();
    let position = to_bevy_vec(&rig.position);
    let target = to_bevy_vec(&rig.target);

    commands.spawn((
        Exposure { ev100: 13.0 },
        bevy::core_pipeline::tonemapping::Tonemapping::AcesFitted,
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: 45f32.to_radians(),
            ..default()
        }),
        Transform::from_translation(position).looking_at(target, Vec3::Y),
        DistanceFog {
            color: Color::srgba(0.72, 0.8, 0.9, 1.0),
            directional_light_color: Color::srgba(1.0, 0.95, 0.85, 0.5),
            directional_light_exponent: 30.0,
            falloff: FogFalloff::from_visibility_colors(
                300.0,
                Color::srgb(0.7, 0.78, 0.88),
                Color::srgb(0.9, 0.88, 0.8),
            ),
        },
    ));
}

/// The core rig owns position and target; the Bevy camera only mirrors them.
fn follow_rig(mut camera: Single<&mut Transform, With<Camera3d>>, session: Res<Session>) {
    let rig = session.camera();
    let position = to_bevy_vec(&rig.position);
    let target = to_bevy_vec(&rig.target);
    if position == target {
        return;
    }
    **camera = Transform::from_translation(position).looking_at(target, Vec3::Y);
}
