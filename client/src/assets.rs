//! Fulfils the core's load plan through the `AssetServer`.
//!
//! Every request is loaded as a glTF. Once the glTF and its dependencies are
//! ready the model is measured (bounds at the requested scale, named nodes,
//! first clip length) and handed back to the session with its ticket.

use bevy::{
    asset::RecursiveDependencyLoadState,
    camera::primitives::MeshAabb,
    gltf::{Gltf, GltfMesh},
    platform::collections::HashMap,
    prelude::*,
};
use shopfront::{LoadError, LoadedModel};

use crate::{convert::to_core_vec, simulation::Session};

const MODEL_DIR: &str = "models";

struct PendingLoad {
    ticket: u32,
    path: String,
    scale: f32,
    handle: Handle<Gltf>,
}

#[derive(Resource, Default)]
struct PendingLoads(Vec<PendingLoad>);

/// glTF handles by model path, shared by every node that uses the model.
#[derive(Resource, Default)]
pub struct ModelHandles(pub HashMap<String, Handle<Gltf>>);

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<PendingLoads>();
    app.init_resource::<ModelHandles>();
    app.add_systems(Startup, issue_loads);
    app.add_systems(PreUpdate, poll_loads);
}

pub fn model_path(path: &str) -> String {
    format!("{MODEL_DIR}/{path}")
}

fn issue_loads(
    asset_server: Res<AssetServer>,
    session: Res<Session>,
    mut pending: ResMut<PendingLoads>,
    mut handles: ResMut<ModelHandles>,
) {
    for request in session.plan() {
        let handle = handles
            .0
            .entry(request.path.clone())
            .or_insert_with(|| asset_server.load::<Gltf>(model_path(&request.path)))
            .clone();
        pending.0.push(PendingLoad {
            ticket: request.ticket,
            path: request.path.clone(),
            scale: request.scale,
            handle,
        });
    }
    info!("Issued {} model loads", pending.0.len());
}

fn poll_loads(
    asset_server: Res<AssetServer>,
    gltfs: Res<Assets<Gltf>>,
    gltf_meshes: Res<Assets<GltfMesh>>,
    meshes: Res<Assets<Mesh>>,
    clips: Res<Assets<AnimationClip>>,
    mut session: ResMut<Session>,
    mut pending: ResMut<PendingLoads>,
) {
    if pending.0.is_empty() {
        return;
    }

    let mut still_pending = Vec::with_capacity(pending.0.len());
    for load in pending.0.drain(..) {
        let result = match asset_server.get_recursive_dependency_load_state(&load.handle) {
            Some(RecursiveDependencyLoadState::Loaded) => match gltfs.get(&load.handle) {
                Some(gltf) => Ok(measure(gltf, load.scale, &gltf_meshes, &meshes, &clips)),
                None => Err(LoadError::Missing(load.path.clone())),
            },
            Some(RecursiveDependencyLoadState::Failed(err)) => Err(LoadError::Failed {
                path: load.path.clone(),
                reason: err.to_string(),
            }),
            _ => {
                still_pending.push(load);
                continue;
            }
        };

        if let Err(err) = &result {
            error!("Could not load model {}: {err}", load.path);
        }
        if let Err(err) = session.on_loaded(load.ticket, result) {
            warn!("Load ticket {} rejected: {err}", load.ticket);
        }
    }
    pending.0 = still_pending;
}

/// Size, named nodes and first clip length of a loaded glTF.
fn measure(
    gltf: &Gltf,
    scale: f32,
    gltf_meshes: &Assets<GltfMesh>,
    meshes: &Assets<Mesh>,
    clips: &Assets<AnimationClip>,
) -> LoadedModel {
    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(f32::MIN);
    for primitive in gltf
        .meshes
        .iter()
        .filter_map(|h| gltf_meshes.get(h))
        .flat_map(|m| m.primitives.iter())
    {
        if let Some(aabb) = meshes.get(&primitive.mesh).and_then(Mesh::compute_aabb) {
            min = min.min(aabb.min().into());
            max = max.max(aabb.max().into());
        }
    }
    let size = if min.x <= max.x {
        (max - min) * scale
    } else {
        Vec3::ZERO
    };

    LoadedModel {
        size: to_core_vec(size),
        parts: gltf.named_nodes.keys().map(|name| name.to_string()).collect(),
        clip_duration: gltf
            .animations
            .first()
            .and_then(|h| clips.get(h))
            .map(AnimationClip::duration),
    }
}
