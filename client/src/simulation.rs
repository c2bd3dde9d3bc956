//! Owns the core scene session and runs its frame loop on the fixed timestep.

use bevy::prelude::*;
use shopfront::{FrameReport, SceneSession};

use crate::config::read_config_from_cli_env;

#[derive(Resource, Deref, DerefMut)]
pub struct Session(pub SceneSession);

/// Report of the most recent core tick.
#[derive(Resource, Default)]
pub struct LatestFrame(pub Option<FrameReport>);

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct CoreTick;

pub(super) fn plugin(app: &mut App) {
    let config = read_config_from_cli_env();
    info!(
        "Scene config: seed {:#x}, debug proxies {}",
        config.decoration_seed, config.debug_proxies
    );

    app.insert_resource(Time::<Fixed>::from_seconds(config.timestep as f64));
    app.insert_resource(Session(SceneSession::new(config)));
    app.init_resource::<LatestFrame>();
    app.add_systems(FixedUpdate, tick_session.in_set(CoreTick));
}

fn tick_session(mut session: ResMut<Session>, mut latest: ResMut<LatestFrame>) {
    let report = session.tick();
    if report.respawned {
        info!("Vehicle respawned at tick {}", report.tick);
    }
    latest.0 = Some(report);
}
