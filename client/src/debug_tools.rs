//! Debug/performance tooling for native dev builds.
//!
//! This plugin is compiled/used only when the caller gates it behind `dev_native`
//! (recommended: `#[cfg(feature = "dev_native")] mod debug_tools;` in `main.rs`).

use bevy::diagnostic::{
    EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin, SystemInformationDiagnosticsPlugin,
};
use bevy::prelude::*;
use bevy::render::diagnostic::RenderDiagnosticsPlugin;
use iyes_perf_ui::prelude::*;

use crate::{convert::to_bevy_vec, simulation::LatestFrame};

/// Add debug/perf tooling (intended for `dev_native` builds only).
pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        FrameTimeDiagnosticsPlugin::default(),
        EntityCountDiagnosticsPlugin::default(),
        SystemInformationDiagnosticsPlugin::default(),
        RenderDiagnosticsPlugin,
        PerfUiPlugin,
    ));

    app.add_systems(Startup, spawn_perf_ui);
    app.add_systems(Update, draw_proximity_bounds);
}

fn spawn_perf_ui(mut commands: Commands) {
    commands.spawn(PerfUiAllEntries::default());
}

/// Outlines the axis-aligned bounds the proximity test runs on.
fn draw_proximity_bounds(latest: Res<LatestFrame>, mut gizmos: Gizmos) {
    let Some(report) = latest.0.as_ref() else {
        return;
    };
    for bounds in &report.proxies {
        gizmos.cuboid(
            Transform::from_translation(to_bevy_vec(&bounds.center))
                .with_scale(to_bevy_vec(&bounds.size)),
            Color::srgb(1.0, 0.85, 0.1),
        );
    }
}
