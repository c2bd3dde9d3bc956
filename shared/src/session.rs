/*!
Scene session: the single owner of every piece of mutable scene state.

The host drives a session with three kinds of calls:
- [`SceneSession::on_loaded`] whenever an asset from [`SceneSession::plan`] resolves,
- input calls ([`SceneSession::handle_key`], [`SceneSession::handle_click`],
  [`SceneSession::handle_hover`], [`SceneSession::toggle_shop`]) between ticks,
- [`SceneSession::tick`] once per fixed step.

A tick runs, in order:
1. the one-time texture and emit pass once every pair is loaded,
2. the physics step (with the vehicle update when the vehicle exists),
3. shop and content playback,
4. body to node transform copy (ground, vehicle, wheels, shops, barrels),
5. vehicle respawn below the floor,
6. container interaction transitions,
7. proximity and focus,
8. the camera move.

Loads that never arrive simply leave their part of the scene absent.
*/

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rapier3d::prelude::RigidBodyHandle;

use crate::camera::CameraRig;
use crate::interaction::{
    ClickOutcome, Interaction, LoadedContainer, LoadedContent, PairId, PickRay, pair_up,
};
use crate::loading::{
    JoinOutcome, LoadError, LoadJoin, LoadKind, LoadPlan, LoadProgress, LoadRequest, LoadedModel,
    PartialPolicy, Population,
};
use crate::physics::PhysicsWorld;
use crate::playback::Playback;
use crate::proximity::{
    Prompt, ProximityInput, ProximityMachine, ProximityOutcome, ProximityPhase, ShopEntry,
};
use crate::scene::{NodeId, NodeKind, SceneGraph, SceneNode};
use crate::settings::{
    self, BARREL_HEIGHT, BARREL_RADIUS, BARREL_SEGMENTS, BARRELS, DECORATION_VARIANTS, EMIT_SET,
    LID_PART, PAIR_COUNT, SHOP_COLLIDER_SHRINK, SHOP_COUNT,
    SHOP_INDICATOR_PARTS, SceneConfig,
};
use crate::types::{Bounds, Pose, Vec3};
use crate::vehicle::{DriveKey, KeyEdge, VehicleController, VehicleRig, WHEEL_COUNT};

/// What the host needs to present after a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    pub tick: u64,
    pub prompt: Prompt,
    pub phase: ProximityPhase,
    pub focused_shop: Option<usize>,
    pub camera_position: Vec3,
    pub camera_target: Vec3,
    pub orbit_enabled: bool,
    pub hint_hidden: bool,
    /// Loading percentage, 0 to 100.
    pub progress: u8,
    pub respawned: bool,
    /// Vehicle and shop debug proxies; empty unless enabled in [`SceneConfig`].
    pub proxies: Vec<Bounds>,
}

struct VehicleSlot {
    rig: VehicleRig,
    node: NodeId,
    proxy: NodeId,
}

struct BarrelSlot {
    body: RigidBodyHandle,
    node: Option<NodeId>,
}

pub struct SceneSession {
    config: SceneConfig,
    world: PhysicsWorld,
    graph: SceneGraph,
    camera: CameraRig,
    plan: LoadPlan,
    progress: LoadProgress,
    ground: (NodeId, RigidBodyHandle),
    vehicle: Option<VehicleSlot>,
    controller: VehicleController,
    wheel_join: LoadJoin<NodeId>,
    /// Wheel visuals in wheel-index order: loaded models or procedural fallbacks.
    wheel_nodes: Vec<NodeId>,
    wheels_loaded: bool,
    shops: Vec<Option<ShopEntry>>,
    barrels: Vec<BarrelSlot>,
    containers: Population<LoadedContainer>,
    contents: Population<LoadedContent>,
    interaction: Interaction,
    proximity: ProximityMachine,
    emit_done: bool,
    /// Container positions of the emitted pairs, in emit-set order.
    emit_positions: Vec<Vec3>,
    decoration_join: LoadJoin<NodeId>,
    decorations: Option<Vec<NodeId>>,
    decorations_placed: bool,
    ticks: u64,
}

impl SceneSession {
    /// Build the physics world, the static parts of the scene and the load plan.
    pub fn new(config: SceneConfig) -> Self {
        let mut world = PhysicsWorld::new();
        let mut graph = SceneGraph::new();

        let visual_ground = settings::visual_ground_rotation();
        let (material, ground_body) = world.create_ground_plane(visual_ground);
        let ground_node = graph.add(SceneNode::new(
            NodeKind::Ground,
            None,
            Pose::new(Vec3::zeros(), visual_ground),
            1.0,
        ));
        log::debug!("ground contact material {material:?}");

        let barrels = BARRELS
            .iter()
            .map(|def| {
                let body = world.create_cylinder_body(
                    Vec3::from(def.position),
                    BARREL_RADIUS,
                    BARREL_HEIGHT,
                    BARREL_SEGMENTS,
                    def.mass,
                );
                if let Some(rotation) = def.rotation() {
                    world.set_rotation(body, rotation);
                }
                BarrelSlot { body, node: None }
            })
            .collect();

        let plan = LoadPlan::startup();
        let progress = LoadProgress::new(plan.len());
        log::info!("scene session created, {} loads planned", plan.len());

        Self {
            world,
            graph,
            camera: CameraRig::new(),
            plan,
            progress,
            ground: (ground_node, ground_body),
            vehicle: None,
            controller: VehicleController::new(),
            wheel_join: LoadJoin::new(WHEEL_COUNT),
            wheel_nodes: Vec::new(),
            wheels_loaded: false,
            shops: (0..SHOP_COUNT).map(|_| None).collect(),
            barrels,
            containers: Population::new(PAIR_COUNT),
            contents: Population::new(PAIR_COUNT),
            interaction: Interaction::new(),
            proximity: ProximityMachine::new(),
            emit_done: false,
            emit_positions: Vec::new(),
            decoration_join: LoadJoin::new(DECORATION_VARIANTS.len()),
            decorations: None,
            decorations_placed: false,
            ticks: 0,
            config,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Every load the host must fulfil.
    pub fn plan(&self) -> &[LoadRequest] {
        self.plan.requests()
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Nodes removed since the last call; the host disposes their entities.
    pub fn take_removed(&mut self) -> Vec<NodeId> {
        self.graph.drain_removed()
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn proximity(&self) -> &ProximityMachine {
        &self.proximity
    }

    pub fn progress(&self) -> LoadProgress {
        self.progress
    }

    pub fn shops(&self) -> &[Option<ShopEntry>] {
        &self.shops
    }

    pub fn wheel_nodes(&self) -> &[NodeId] {
        &self.wheel_nodes
    }

    pub fn wheels_loaded(&self) -> bool {
        self.wheels_loaded
    }

    pub fn vehicle_chassis(&self) -> Option<RigidBodyHandle> {
        self.vehicle.as_ref().map(|v| v.rig.chassis())
    }

    pub fn vehicle_node(&self) -> Option<NodeId> {
        self.vehicle.as_ref().map(|v| v.node)
    }

    pub fn ground_node(&self) -> NodeId {
        self.ground.0
    }

    pub fn barrel_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.barrels.iter().filter_map(|b| b.node)
    }

    pub fn decorations_placed(&self) -> bool {
        self.decorations_placed
    }

    pub fn emit_done(&self) -> bool {
        self.emit_done
    }

    /// Route one resolved load.
    ///
    /// Only ticket bookkeeping errors are returned. A failed asset is logged
    /// and leaves its part of the scene absent.
    pub fn on_loaded(
        &mut self,
        ticket: u32,
        result: Result<LoadedModel, LoadError>,
    ) -> Result<(), LoadError> {
        let request = self.plan.resolve(ticket)?.clone();
        self.progress.settle(result.is_ok());

        match result {
            Ok(model) => self.place(&request, model),
            Err(err) => {
                log::error!("could not load `{}`: {err}", request.path);
                match request.kind {
                    LoadKind::Wheel(i) => {
                        self.complete_join(JoinTarget::Wheels, i, Err(err));
                    }
                    LoadKind::Decoration(i) => {
                        self.complete_join(JoinTarget::Decorations, i, Err(err));
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn place(&mut self, request: &LoadRequest, model: LoadedModel) {
        let asset = Some(request.path.clone());
        match request.kind {
            LoadKind::Vehicle => self.place_vehicle(asset, &model),
            LoadKind::Wheel(i) => {
                let mut node = SceneNode::new(NodeKind::Wheel, asset, Pose::identity(), request.scale);
                node.visible = false;
                let id = self.graph.add(node);
                self.complete_join(JoinTarget::Wheels, i, Ok(id));
            }
            LoadKind::Shop(i) => self.place_shop(i, asset, request.scale, &model),
            LoadKind::Container(slot) => {
                let position = settings::pair_rest_position(slot);
                let has_lid = model.has_part(LID_PART);
                if !has_lid {
                    log::warn!("container for slot {slot} has no `{LID_PART}` part");
                }
                let mut node = SceneNode::new(
                    NodeKind::Container,
                    asset,
                    Pose::from_translation(position),
                    request.scale,
                );
                if has_lid {
                    node = node.with_parts([LID_PART]);
                }
                let node = self.graph.add(node);
                self.containers.push(LoadedContainer {
                    slot,
                    node,
                    position,
                    size: model.size,
                    has_lid,
                });
                self.try_pair();
            }
            LoadKind::Content(slot) => {
                let position = settings::pair_rest_position(slot);
                let clip_duration = model.clip_duration.unwrap_or_else(|| {
                    log::warn!("content for slot {slot} has no animation clip");
                    0.0
                });
                let mut node = SceneNode::new(
                    NodeKind::Content,
                    asset,
                    Pose::from_translation(position),
                    request.scale,
                );
                node.clip_time = Some(0.0);
                let node = self.graph.add(node);
                self.contents.push(LoadedContent {
                    slot,
                    node,
                    position,
                    size: model.size,
                    clip_duration,
                });
                self.try_pair();
            }
            LoadKind::Barrel(i) => {
                let Some(slot) = self.barrels.get_mut(i) else {
                    log::warn!("no barrel body for index {i}");
                    return;
                };
                let pose = self.world.pose(slot.body).unwrap_or_default();
                slot.node = Some(self.graph.add(SceneNode::new(
                    NodeKind::Barrel,
                    asset,
                    pose,
                    request.scale,
                )));
            }
            LoadKind::Decoration(i) => {
                let mut node = SceneNode::new(
                    NodeKind::Decoration,
                    asset,
                    Pose::from_translation(Vec3::new(2.0 * i as f32, 0.0, 0.0)),
                    request.scale,
                );
                node.visible = false;
                let id = self.graph.add(node);
                self.complete_join(JoinTarget::Decorations, i, Ok(id));
            }
            LoadKind::Board(i) => {
                let Some((_, pose)) = settings::boards().get(i).copied() else {
                    return;
                };
                self.graph
                    .add(SceneNode::new(NodeKind::Board, asset, pose, request.scale));
            }
        }
    }

    fn place_vehicle(&mut self, asset: Option<String>, model: &LoadedModel) {
        if self.vehicle.is_some() {
            log::warn!("vehicle already placed, ignoring second load");
            return;
        }
        let rig = VehicleRig::new(&mut self.world, model.size);
        let pose = self.world.pose(rig.chassis()).unwrap_or_default();
        let node = self
            .graph
            .add(SceneNode::new(NodeKind::Vehicle, asset, pose, 1.0));
        let bounds = rig.proxy(&pose);
        let mut proxy = SceneNode::new(NodeKind::VehicleProxy, None, pose, 1.0);
        proxy.scale = bounds.size;
        proxy.visible = self.config.debug_proxies;
        let proxy = self.graph.add(proxy);

        if !self.wheels_loaded {
            self.wheel_nodes = (0..WHEEL_COUNT)
                .map(|_| {
                    self.graph
                        .add(SceneNode::new(NodeKind::Wheel, None, pose, 1.0))
                })
                .collect();
            log::debug!("wheel models pending, using procedural wheels");
        }
        self.vehicle = Some(VehicleSlot { rig, node, proxy });
    }

    fn place_shop(&mut self, i: usize, asset: Option<String>, scale: f32, model: &LoadedModel) {
        let Some(entry_slot) = self.shops.get(i) else {
            log::warn!("shop index {i} out of range");
            return;
        };
        if entry_slot.is_some() {
            log::warn!("shop {i} already placed");
            return;
        }

        let position = settings::shop_position(i);
        let shrink = Vec3::from(SHOP_COLLIDER_SHRINK);
        let half_extents = (model.size - shrink).map(|v| v.max(0.01));
        let body = self.world.create_body(position, half_extents, 0.0);
        let proxy_size = Vec3::new(
            half_extents.x + shrink.x,
            half_extents.y,
            half_extents.z + shrink.z,
        );

        let indicators: Vec<&'static str> = SHOP_INDICATOR_PARTS
            .iter()
            .copied()
            .filter(|name| model.has_part(name))
            .collect();
        if indicators.len() < SHOP_INDICATOR_PARTS.len() {
            log::warn!(
                "shop {i} has {} of {} indicator parts",
                indicators.len(),
                SHOP_INDICATOR_PARTS.len()
            );
        }

        let pose = Pose::from_translation(position);
        let mut node = SceneNode::new(NodeKind::Shop, asset, pose, scale)
            .with_parts(indicators.iter().copied());
        node.clip_time = Some(0.0);
        let node = self.graph.add(node);
        let mut proxy = SceneNode::new(NodeKind::ShopProxy, None, pose, 1.0);
        proxy.scale = proxy_size;
        proxy.visible = self.config.debug_proxies;
        let proxy = self.graph.add(proxy);

        self.shops[i] = Some(ShopEntry {
            node,
            body,
            proxy,
            bbox: model.size,
            proxy_size,
            playback: Playback::new(model.clip_duration.unwrap_or(0.0)),
            closed: false,
            indicators,
        });
        log::debug!("shop {i} placed at {position:?}");
    }

    fn complete_join(&mut self, target: JoinTarget, slot: usize, result: Result<NodeId, LoadError>) {
        let join = match target {
            JoinTarget::Wheels => &mut self.wheel_join,
            JoinTarget::Decorations => &mut self.decoration_join,
        };
        if let Err(err) = join.complete(slot, result) {
            log::warn!("{target:?} join: {err}");
            return;
        }
        match target {
            JoinTarget::Wheels => self.finish_wheels(),
            JoinTarget::Decorations => self.finish_decorations(),
        }
    }

    fn finish_wheels(&mut self) {
        match self.wheel_join.take(PartialPolicy::RequireAll) {
            JoinOutcome::Pending => {}
            JoinOutcome::Ready(models) => {
                for fallback in std::mem::replace(&mut self.wheel_nodes, models) {
                    self.graph.remove(fallback);
                }
                for &id in &self.wheel_nodes {
                    if let Some(node) = self.graph.get_mut(id) {
                        node.visible = true;
                    }
                }
                self.wheels_loaded = true;
                log::info!("wheel models loaded");
            }
            JoinOutcome::Rejected(errors) => {
                log::warn!("{} wheel models failed, keeping procedural wheels", errors.len());
            }
            JoinOutcome::Partial { loaded, failed } => {
                for id in loaded {
                    self.graph.remove(id);
                }
                log::warn!("{} wheel models failed", failed.len());
            }
        }
    }

    fn finish_decorations(&mut self) {
        let nodes = match self.decoration_join.take(PartialPolicy::AcceptPartial) {
            JoinOutcome::Pending => return,
            JoinOutcome::Ready(nodes) => nodes,
            JoinOutcome::Partial { loaded, failed } => {
                log::warn!("{} shelf decorations failed to load", failed.len());
                loaded
            }
            JoinOutcome::Rejected(errors) => {
                log::error!("all {} shelf decorations failed to load", errors.len());
                Vec::new()
            }
        };
        self.decorations = Some(nodes);
        self.place_decorations();
    }

    fn try_pair(&mut self) {
        if self.interaction.is_paired() || !self.containers.is_full() || !self.contents.is_full() {
            return;
        }
        let containers = std::mem::replace(&mut self.containers, Population::new(0)).into_items();
        let contents = std::mem::replace(&mut self.contents, Population::new(0)).into_items();
        match pair_up(containers, contents, PAIR_COUNT) {
            Ok(pairs) => self.interaction = Interaction::with_pairs(pairs),
            Err(err) => log::error!("could not pair containers with contents: {err}"),
        }
    }

    /// Texture the contents and retire the emit set. Runs once, after pairing.
    fn run_emit_pass(&mut self) {
        if self.emit_done || !self.interaction.is_paired() {
            return;
        }
        for i in settings::textured_slots() {
            let Some(content) = self.interaction.pair(PairId(i)).map(|p| p.content) else {
                continue;
            };
            if let Some(node) = self.graph.get_mut(content) {
                node.texture = Some(settings::scroll_texture(i));
            }
        }

        for &i in &EMIT_SET {
            let id = PairId(i);
            let Some(pair) = self.interaction.pair(id) else {
                continue;
            };
            let (container, content) = (pair.container, pair.content);
            if let Some(position) = self.graph.translation(container) {
                self.emit_positions.push(position);
            }
            self.graph.remove(container);
            self.graph.remove(content);
            self.interaction.emit(id);
        }

        self.emit_done = true;
        log::info!("retired {} pairs as shelf decorations", EMIT_SET.len());
        self.place_decorations();
    }

    /// Put the shuffled decorations where the emitted containers stood.
    fn place_decorations(&mut self) {
        if self.decorations_placed || !self.emit_done {
            return;
        }
        let Some(pool) = self.decorations.as_mut() else {
            return;
        };
        let mut rng = StdRng::seed_from_u64(self.config.decoration_seed);
        pool.shuffle(&mut rng);

        for (&id, &origin) in pool.iter().zip(&self.emit_positions) {
            let mut position = origin;
            if origin.y >= 3.0 {
                position.y += 0.1;
            }
            position.y -= 0.3;
            position.z -= 0.2;
            if let Some(node) = self.graph.get_mut(id) {
                node.pose.translation = position;
                node.visible = true;
            }
        }
        self.decorations_placed = true;
        log::debug!("placed {} shelf decorations", pool.len().min(self.emit_positions.len()));
    }

    /// Keyboard drive input. Ignored until the vehicle exists.
    pub fn handle_key(&mut self, key: DriveKey, edge: KeyEdge) -> bool {
        let Some(vehicle) = self.vehicle.as_mut() else {
            return false;
        };
        self.controller.handle(key, edge, vehicle.rig.wheels_mut());
        true
    }

    pub fn handle_click(&mut self, ray: PickRay) -> ClickOutcome {
        self.interaction.on_click(&ray, &self.camera, &self.graph)
    }

    pub fn handle_hover(&mut self, ray: PickRay) -> Option<PairId> {
        self.interaction.hover(&ray, &self.graph)
    }

    /// The enter/exit prompt was activated. Only honoured while the prompt is
    /// showing or a shop is being entered.
    pub fn toggle_shop(&mut self) -> bool {
        if !self.proximity.prompt().visible && !self.proximity.enter_intent() {
            return false;
        }
        self.proximity.toggle_intent();
        true
    }

    pub fn tick(&mut self) -> FrameReport {
        let dt = self.config.timestep;

        self.run_emit_pass();

        match self.vehicle.as_mut() {
            Some(vehicle) => vehicle.rig.step(&mut self.world, dt),
            None => self.world.step(dt, None),
        }

        for shop in self.shops.iter_mut().flatten() {
            shop.playback.advance(dt);
            if let Some(node) = self.graph.get_mut(shop.node) {
                node.clip_time = Some(shop.playback.time());
            }
        }
        self.interaction.advance_playback(dt, &mut self.graph);

        self.sync_transforms();

        let respawned = self
            .vehicle
            .as_mut()
            .is_some_and(|v| v.rig.respawn_if_fallen(&mut self.world));
        if respawned {
            self.sync_vehicle();
        }

        self.interaction.update(dt, &self.camera, &mut self.graph);

        let vehicle_pose = self
            .vehicle
            .as_ref()
            .and_then(|v| self.world.pose(v.rig.chassis()).map(|p| (v, p)));
        let vehicle_proxy = vehicle_pose.map(|(v, pose)| v.rig.proxy(&pose));
        let vehicle_position = vehicle_pose.map(|(_, pose)| pose.translation);
        let outcome = self.proximity.update(
            &mut self.shops,
            ProximityInput {
                vehicle_proxy,
                vehicle_position,
                pairs_at_rest: self.interaction.selection_at_rest(),
                dt,
                graph: &mut self.graph,
                camera: &mut self.camera,
            },
        );

        self.camera.tick(dt);
        self.ticks += 1;
        self.report(outcome, respawned, vehicle_proxy)
    }

    fn sync_transforms(&mut self) {
        let (ground_node, ground_body) = self.ground;
        if let Some(pose) = self.world.pose(ground_body) {
            self.graph.set_pose(ground_node, pose);
        }

        self.sync_vehicle();

        for shop in self.shops.iter().flatten() {
            if let Some(pose) = self.world.pose(shop.body) {
                self.graph.set_pose(shop.node, pose);
                self.graph.set_pose(shop.proxy, pose);
            }
        }

        for barrel in &self.barrels {
            if let Some(node) = barrel.node
                && let Some(pose) = self.world.pose(barrel.body)
            {
                self.graph.set_pose(node, pose);
            }
        }
    }

    fn sync_vehicle(&mut self) {
        let Some(vehicle) = self.vehicle.as_ref() else {
            return;
        };
        let Some(pose) = self.world.pose(vehicle.rig.chassis()) else {
            return;
        };
        self.graph.set_pose(vehicle.node, pose);
        self.graph.set_pose(vehicle.proxy, pose);

        let wheel_poses = vehicle.rig.wheel_poses(&pose);
        for (&node, wheel_pose) in self.wheel_nodes.iter().zip(wheel_poses) {
            self.graph.set_pose(node, wheel_pose);
        }
    }

    fn report(
        &self,
        outcome: ProximityOutcome,
        respawned: bool,
        vehicle_proxy: Option<Bounds>,
    ) -> FrameReport {
        let proxies = if self.config.debug_proxies {
            vehicle_proxy
                .into_iter()
                .chain(
                    self.shops
                        .iter()
                        .flatten()
                        .filter_map(|shop| shop.proxy_bounds(&self.graph)),
                )
                .collect()
        } else {
            Vec::new()
        };

        FrameReport {
            tick: self.ticks,
            prompt: self.proximity.prompt(),
            phase: outcome.phase,
            focused_shop: self.proximity.focused_shop(),
            camera_position: self.camera.position,
            camera_target: self.camera.target,
            orbit_enabled: self.camera.orbit_enabled,
            hint_hidden: self.controller.hint_hidden(),
            progress: self.progress.percent(),
            respawned,
            proxies,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum JoinTarget {
    Wheels,
    Decorations,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(size: Vec3) -> LoadedModel {
        LoadedModel {
            size,
            parts: Vec::new(),
            clip_duration: None,
        }
    }

    fn ticket_of(session: &SceneSession, kind: LoadKind) -> u32 {
        session
            .plan()
            .iter()
            .find(|r| r.kind == kind)
            .map(|r| r.ticket)
            .unwrap()
    }

    #[test]
    fn barrels_exist_before_any_load() {
        let session = SceneSession::new(SceneConfig::default());
        // ground plus seven barrels
        assert_eq!(session.world().body_count(), 1 + BARRELS.len());
        assert_eq!(session.progress().percent(), 0);
    }

    #[test]
    fn duplicate_and_unknown_tickets_are_rejected() {
        let mut session = SceneSession::new(SceneConfig::default());
        let ticket = ticket_of(&session, LoadKind::Board(0));
        session.on_loaded(ticket, Ok(model(Vec3::repeat(1.0)))).unwrap();
        assert_eq!(
            session.on_loaded(ticket, Ok(model(Vec3::repeat(1.0)))),
            Err(LoadError::AlreadyCompleted(ticket))
        );
        assert_eq!(
            session.on_loaded(9_999, Ok(model(Vec3::repeat(1.0)))),
            Err(LoadError::UnknownTicket(9_999))
        );
    }

    #[test]
    fn procedural_wheels_until_models_arrive() {
        let mut session = SceneSession::new(SceneConfig::default());
        let vehicle = ticket_of(&session, LoadKind::Vehicle);
        session
            .on_loaded(vehicle, Ok(model(Vec3::new(2.0, 1.5, 4.0))))
            .unwrap();
        let fallbacks = session.wheel_nodes().to_vec();
        assert_eq!(fallbacks.len(), WHEEL_COUNT);
        assert!(fallbacks.iter().all(|&id| session.graph().get(id).unwrap().asset.is_none()));

        for i in 0..WHEEL_COUNT {
            let t = ticket_of(&session, LoadKind::Wheel(i));
            session.on_loaded(t, Ok(model(Vec3::repeat(1.0)))).unwrap();
        }
        assert!(session.wheels_loaded());
        let removed = session.take_removed();
        assert_eq!(removed, fallbacks);
        assert!(session
            .wheel_nodes()
            .iter()
            .all(|&id| session.graph().get(id).unwrap().asset.is_some()));
    }

    #[test]
    fn one_failed_wheel_keeps_the_fallback() {
        let mut session = SceneSession::new(SceneConfig::default());
        let vehicle = ticket_of(&session, LoadKind::Vehicle);
        session
            .on_loaded(vehicle, Ok(model(Vec3::new(2.0, 1.5, 4.0))))
            .unwrap();
        for i in 0..WHEEL_COUNT {
            let t = ticket_of(&session, LoadKind::Wheel(i));
            let result = if i == 1 {
                Err(LoadError::Missing("wheell.glb".into()))
            } else {
                Ok(model(Vec3::repeat(1.0)))
            };
            session.on_loaded(t, result).unwrap();
        }
        assert!(!session.wheels_loaded());
        assert!(session
            .wheel_nodes()
            .iter()
            .all(|&id| session.graph().get(id).unwrap().asset.is_none()));
        assert_eq!(session.progress().failed(), 1);
    }

    #[test]
    fn keys_before_vehicle_are_ignored() {
        let mut session = SceneSession::new(SceneConfig::default());
        assert!(!session.handle_key(DriveKey::Accelerate, KeyEdge::Down));
        assert!(!session.tick().hint_hidden);
    }

    #[test]
    fn toggle_needs_a_visible_prompt() {
        let mut session = SceneSession::new(SceneConfig::default());
        assert!(!session.toggle_shop());
        assert!(!session.proximity().enter_intent());
    }
}
