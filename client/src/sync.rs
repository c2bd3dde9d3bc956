//! Mirrors the core scene graph onto Bevy entities.
//!
//! Every live [`NodeId`] owns one entity. Model nodes spawn their glTF scene,
//! procedural nodes (ground, fallback wheels, proxies) get simple meshes. After
//! each core tick the entity transforms, visibility, named parts, textures and
//! clip times are copied over.

use std::f32::consts::FRAC_PI_2;

use bevy::{gltf::Gltf, platform::collections::HashMap, prelude::*};
use shopfront::{NodeId, NodeKind, SceneNode};

use crate::{
    assets::ModelHandles,
    convert::{to_bevy_vec, to_transform},
    simulation::{CoreTick, Session},
};

const GROUND_SIZE: f32 = 120.0;
const WHEEL_RADIUS: f32 = 0.4;
const WHEEL_WIDTH: f32 = 0.3;
const WHEEL_RESOLUTION: u32 = 20;
const TEXTURE_DIR: &str = "tex";

/// Ties a core node to its Bevy entity.
#[derive(Resource, Default)]
pub struct NodeEntityMapping(pub HashMap<NodeId, Entity>);

#[derive(Component, Clone, Copy, Debug)]
pub struct SceneNodeRef(pub NodeId);

/// Texture that still has to be applied to the materials of a spawned scene.
#[derive(Component)]
struct PendingTexture(Handle<Image>);

/// Texture name the entity was last given; the core may assign one after spawn.
#[derive(Component, Default)]
struct AppliedTexture(Option<String>);

/// Clip of a node, bound once its scene has an `AnimationPlayer`.
#[derive(Component)]
struct ClipBinding {
    player: Entity,
    index: AnimationNodeIndex,
}

#[derive(Resource)]
struct ProceduralMeshes {
    ground: Handle<Mesh>,
    ground_material: Handle<StandardMaterial>,
    wheel: Handle<Mesh>,
    wheel_material: Handle<StandardMaterial>,
    proxy: Handle<Mesh>,
    proxy_material: Handle<StandardMaterial>,
}

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<NodeEntityMapping>();
    app.add_systems(Startup, create_procedural_meshes);
    app.add_systems(
        FixedUpdate,
        (despawn_removed_nodes, spawn_new_nodes, refresh_textures)
            .chain()
            .after(CoreTick),
    );
    app.add_systems(
        Update,
        (
            bind_clips,
            apply_textures,
            sync_transforms,
            sync_parts,
            sync_clips,
        ),
    );
}

fn create_procedural_meshes(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.insert_resource(ProceduralMeshes {
        ground: meshes.add(Rectangle::new(GROUND_SIZE, GROUND_SIZE)),
        ground_material: materials.add(StandardMaterial {
            base_color: Color::srgb(0.42, 0.39, 0.35),
            perceptual_roughness: 1.0,
            metallic: 0.0,
            double_sided: true,
            cull_mode: None,
            ..default()
        }),
        wheel: meshes.add(
            Cylinder::new(WHEEL_RADIUS, WHEEL_WIDTH)
                .mesh()
                .resolution(WHEEL_RESOLUTION),
        ),
        wheel_material: materials.add(Color::srgb(0.1, 0.1, 0.1)),
        proxy: meshes.add(Cuboid::new(1.0, 1.0, 1.0)),
        proxy_material: materials.add(StandardMaterial {
            base_color: Color::srgba(1.0, 0.2, 0.2, 0.25),
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            ..default()
        }),
    });
}

fn despawn_removed_nodes(
    mut commands: Commands,
    mut session: ResMut<Session>,
    mut mapping: ResMut<NodeEntityMapping>,
) {
    for id in session.take_removed() {
        if let Some(entity) = mapping.0.remove(&id) {
            commands.entity(entity).despawn();
        }
    }
}

fn spawn_new_nodes(
    mut commands: Commands,
    session: Res<Session>,
    handles: Res<ModelHandles>,
    gltfs: Res<Assets<Gltf>>,
    procedural: Option<Res<ProceduralMeshes>>,
    mut mapping: ResMut<NodeEntityMapping>,
) {
    let Some(procedural) = procedural else {
        return;
    };

    for (id, node) in session.graph().iter() {
        if node.removed || mapping.0.contains_key(&id) {
            continue;
        }

        let scene = match &node.asset {
            Some(path) => {
                let scene = handles
                    .0
                    .get(path)
                    .and_then(|h| gltfs.get(h))
                    .and_then(|gltf| {
                        gltf.default_scene
                            .clone()
                            .or_else(|| gltf.scenes.first().cloned())
                    });
                if scene.is_none() {
                    debug!("Scene for node {id:?} ({path}) not ready");
                    continue;
                }
                scene
            }
            None => None,
        };

        let mut entity = commands.spawn((
            SceneNodeRef(id),
            to_transform(&node.pose, &node.scale),
            visibility_of(node),
            Name::new(format!("{:?} {}", node.kind, id.0)),
        ));

        match scene {
            Some(scene) => {
                entity.insert((SceneRoot(scene), AppliedTexture::default()));
            }
            None => match node.kind {
                NodeKind::Ground => {
                    entity.insert((
                        Mesh3d(procedural.ground.clone()),
                        MeshMaterial3d(procedural.ground_material.clone()),
                    ));
                }
                NodeKind::Wheel => {
                    // the cylinder axis is Y, wheels spin about X
                    entity.with_child((
                        Mesh3d(procedural.wheel.clone()),
                        MeshMaterial3d(procedural.wheel_material.clone()),
                        Transform::from_rotation(Quat::from_rotation_z(FRAC_PI_2)),
                    ));
                }
                NodeKind::ShopProxy | NodeKind::VehicleProxy => {
                    entity.insert((
                        Mesh3d(procedural.proxy.clone()),
                        MeshMaterial3d(procedural.proxy_material.clone()),
                    ));
                }
                kind => debug!("Node {id:?} of kind {kind:?} has no procedural geometry"),
            },
        }

        mapping.0.insert(id, entity.id());
    }
}

fn texture_path(name: &str) -> String {
    format!("{TEXTURE_DIR}/{name}.png")
}

/// Texture to apply when the node's assigned texture differs from the applied one.
fn texture_change<'a>(assigned: Option<&'a str>, applied: Option<&str>) -> Option<&'a str> {
    assigned.filter(|name| applied != Some(*name))
}

fn refresh_textures(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    session: Res<Session>,
    mut nodes: Query<(Entity, &SceneNodeRef, &mut AppliedTexture)>,
) {
    let graph = session.graph();
    for (entity, node_ref, mut applied) in &mut nodes {
        let Some(node) = graph.get(node_ref.0) else {
            continue;
        };
        let Some(name) = texture_change(node.texture.as_deref(), applied.0.as_deref()) else {
            continue;
        };
        debug!("Texturing node {:?} with {name}", node_ref.0);
        commands
            .entity(entity)
            .insert(PendingTexture(asset_server.load(texture_path(name))));
        applied.0 = Some(name.to_owned());
    }
}

fn visibility_of(node: &SceneNode) -> Visibility {
    if node.visible {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    }
}

fn sync_transforms(
    session: Res<Session>,
    mut nodes: Query<(&SceneNodeRef, &mut Transform, &mut Visibility)>,
) {
    let graph = session.graph();
    for (node_ref, mut transform, mut visibility) in &mut nodes {
        let Some(node) = graph.get(node_ref.0) else {
            continue;
        };
        *transform = to_transform(&node.pose, &node.scale);
        visibility.set_if_neq(visibility_of(node));
    }
}

/// Named sub-objects: visibility always, local pose once the core drives it.
fn sync_parts(
    session: Res<Session>,
    nodes: Query<(Entity, &SceneNodeRef)>,
    children: Query<&Children>,
    mut parts: Query<(&Name, &mut Transform, &mut Visibility), Without<SceneNodeRef>>,
) {
    let graph = session.graph();
    for (entity, node_ref) in &nodes {
        let Some(node) = graph.get(node_ref.0) else {
            continue;
        };
        if node.parts.is_empty() {
            continue;
        }
        for descendant in children.iter_descendants(entity) {
            let Ok((name, mut transform, mut visibility)) = parts.get_mut(descendant) else {
                continue;
            };
            let Some(state) = node.parts.get(name.as_str()) else {
                continue;
            };
            visibility.set_if_neq(if state.visible {
                Visibility::Inherited
            } else {
                Visibility::Hidden
            });
            if state.pose_driven {
                // x/y offset and roll; depth and the authored tilt stay
                let offset = to_bevy_vec(&state.pose.translation);
                let (rx, ry, _) = transform.rotation.to_euler(EulerRot::XYZ);
                let roll = state.pose.euler().z;
                transform.translation.x = offset.x;
                transform.translation.y = offset.y;
                transform.rotation = Quat::from_euler(EulerRot::XYZ, rx, ry, roll);
            }
        }
    }
}

fn apply_textures(
    mut commands: Commands,
    nodes: Query<(Entity, &PendingTexture)>,
    children: Query<&Children>,
    mesh_materials: Query<&MeshMaterial3d<StandardMaterial>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for (entity, pending) in &nodes {
        let mut applied = false;
        for descendant in children.iter_descendants(entity) {
            let Ok(handle) = mesh_materials.get(descendant) else {
                continue;
            };
            let Some(material) = materials.get(&handle.0) else {
                continue;
            };
            let mut textured = material.clone();
            textured.base_color_texture = Some(pending.0.clone());
            let textured = materials.add(textured);
            commands.entity(descendant).insert(MeshMaterial3d(textured));
            applied = true;
        }
        // scene instances spawn a frame or more after the root
        if applied {
            commands.entity(entity).remove::<PendingTexture>();
        }
    }
}

fn bind_clips(
    mut commands: Commands,
    session: Res<Session>,
    handles: Res<ModelHandles>,
    gltfs: Res<Assets<Gltf>>,
    mut graphs: ResMut<Assets<AnimationGraph>>,
    mut players: Query<(Entity, &mut AnimationPlayer), Added<AnimationPlayer>>,
    ancestors: Query<&ChildOf>,
    nodes: Query<&SceneNodeRef>,
) {
    for (player_entity, mut player) in &mut players {
        let Some((node_entity, node_ref)) = ancestors
            .iter_ancestors(player_entity)
            .find_map(|e| nodes.get(e).ok().map(|n| (e, *n)))
        else {
            continue;
        };
        let Some(node) = session.graph().get(node_ref.0) else {
            continue;
        };
        let Some(clip) = node
            .asset
            .as_ref()
            .and_then(|path| handles.0.get(path))
            .and_then(|h| gltfs.get(h))
            .and_then(|gltf| gltf.animations.first().cloned())
        else {
            continue;
        };
        let Some(time) = node.clip_time else {
            continue;
        };

        let (graph, index) = AnimationGraph::from_clip(clip);
        player.play(index).seek_to(time).pause();
        commands
            .entity(player_entity)
            .insert(AnimationGraphHandle(graphs.add(graph)));
        commands.entity(node_entity).insert(ClipBinding {
            player: player_entity,
            index,
        });
    }
}

/// The core owns playback time; players only display it.
fn sync_clips(
    session: Res<Session>,
    nodes: Query<(&SceneNodeRef, &ClipBinding)>,
    mut players: Query<&mut AnimationPlayer>,
) {
    let graph = session.graph();
    for (node_ref, binding) in &nodes {
        let Some(time) = graph.get(node_ref.0).and_then(|n| n.clip_time) else {
            continue;
        };
        let Ok(mut player) = players.get_mut(binding.player) else {
            continue;
        };
        if let Some(active) = player.animation_mut(binding.index) {
            active.seek_to(time);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_assigned_after_spawn_is_picked_up_once() {
        // spawned before the emit pass: nothing to apply yet
        assert_eq!(texture_change(None, None), None);
        // the emit pass assigns a texture to an existing entity
        assert_eq!(texture_change(Some("scroll_tex4"), None), Some("scroll_tex4"));
        // already applied
        assert_eq!(texture_change(Some("scroll_tex4"), Some("scroll_tex4")), None);
        assert_eq!(texture_change(Some("scroll_tex6"), Some("scroll_tex4")), Some("scroll_tex6"));
        assert_eq!(texture_path("scroll_tex4"), "tex/scroll_tex4.png");
    }
}
