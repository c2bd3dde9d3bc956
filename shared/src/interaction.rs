/*!
Container/content pick-and-inspect lifecycle.

Each [`Pair`] links a container (a vessel with a `lid` part) to the content
scroll inside it. At most one pair is selected at a time. A selected pair goes
through:

```text
AtRest -> MovingToSlot -> InSlotClosed -> Opening -> InSlotOpen -> Returning -> AtRest
                              |                                       ^
                              +------------- click container ---------+
```

- A click on a container at rest brings the pair to the inspection slot in
  front of the camera, tumbling slowly.
- Arrival opens the lid automatically; once the lid is open the content
  unrolls in a reading position and the container drops out of view.
- A click on the unrolled content sends both home, closes the lid and pauses
  the content where it was.

Lid state is tracked explicitly; the animated lid coordinates never feed back
into decisions.
*/

use rapier3d::parry::bounding_volume::Aabb;
use rapier3d::parry::query::{Ray, RayCast};
use thiserror::Error;

use crate::camera::CameraRig;
use crate::constants::{
    CONTENT_ROTATE_DURATION, LID_MOVE_DURATION, PAIR_MOVE_DURATION, PICK_MAX_CAMERA_Z, TUMBLE_STEP,
};
use crate::ordering::{PositionKey, sort_full_population};
use crate::playback::Playback;
use crate::scene::{NodeId, SceneGraph};
use crate::settings::LID_PART;
use crate::tween::Tween;
use crate::types::{Pose, Vec3};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PairingError {
    #[error("expected {expected} pairs, got {containers} containers and {contents} contents")]
    CountMismatch {
        expected: usize,
        containers: usize,
        contents: usize,
    },
    #[error("shelf slot {slot} has a container but no content")]
    Unmatched { slot: usize },
    #[error(transparent)]
    Ordering(#[from] crate::ordering::OrderingError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairId(pub usize);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LidState {
    #[default]
    Closed,
    Opening,
    Open,
    Closing,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PairPhase {
    #[default]
    AtRest,
    MovingToSlot,
    InSlotClosed,
    Opening,
    InSlotOpen,
    Returning,
}

/// Lid local placement: X/Y offset and roll about Z.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LidPose {
    pub x: f32,
    pub y: f32,
    pub rot_z: f32,
}

impl LidPose {
    /// Lid seated on the container.
    pub const CLOSED: Self = Self {
        x: -0.015,
        y: 0.56,
        rot_z: 0.03,
    };

    /// Lid swung off the container.
    pub const OPEN: Self = Self {
        x: 0.3,
        y: 0.7,
        rot_z: -2.5,
    };

    pub fn to_pose(self) -> Pose {
        Pose::from_euler(Vec3::new(self.x, self.y, 0.0), Vec3::new(0.0, 0.0, self.rot_z))
    }
}

#[derive(Clone, Copy, Debug)]
struct LidTween {
    offset: Tween<Vec3>,
    roll: Tween<f32>,
}

impl LidTween {
    fn new(from: LidPose, to: LidPose) -> Self {
        Self {
            offset: Tween::new(
                Vec3::new(from.x, from.y, 0.0),
                Vec3::new(to.x, to.y, 0.0),
                LID_MOVE_DURATION,
            ),
            roll: Tween::new(from.rot_z, to.rot_z, LID_MOVE_DURATION),
        }
    }

    fn advance(&mut self, dt: f32) -> LidPose {
        let offset = self.offset.advance(dt);
        let rot_z = self.roll.advance(dt);
        LidPose {
            x: offset.x,
            y: offset.y,
            rot_z,
        }
    }

    fn is_finished(&self) -> bool {
        self.offset.is_finished() && self.roll.is_finished()
    }
}

/// A container as it arrives from loading, keyed by its shelf slot.
#[derive(Clone, Debug)]
pub struct LoadedContainer {
    pub slot: usize,
    pub node: NodeId,
    pub position: Vec3,
    pub size: Vec3,
    pub has_lid: bool,
}

/// A content scroll as it arrives from loading, keyed by its shelf slot.
#[derive(Clone, Debug)]
pub struct LoadedContent {
    pub slot: usize,
    pub node: NodeId,
    pub position: Vec3,
    pub size: Vec3,
    pub clip_duration: f32,
}

impl PositionKey for LoadedContainer {
    fn position(&self) -> Vec3 {
        self.position
    }
}

impl PositionKey for LoadedContent {
    fn position(&self) -> Vec3 {
        self.position
    }
}

#[derive(Clone, Debug)]
pub struct Pair {
    pub slot: usize,
    pub container: NodeId,
    pub content: NodeId,
    pub container_size: Vec3,
    pub content_size: Vec3,
    pub has_lid: bool,
    pub playback: Playback,
    pub phase: PairPhase,
    pub lid: LidState,
    pub content_open: bool,
    pub saved_time: f32,
    /// Shelf position, captured the first time the pair is selected.
    pub initial_pos: Option<Vec3>,
    /// Converted to a decoration; never pickable again.
    pub emitted: bool,
    container_tumble: bool,
    content_tumble: bool,
    container_euler: Vec3,
    content_euler: Vec3,
    lid_pose: LidPose,
    container_move: Option<Tween<Vec3>>,
    content_move: Option<Tween<Vec3>>,
    container_turn: Option<Tween<Vec3>>,
    content_turn: Option<Tween<Vec3>>,
    lid_tween: Option<LidTween>,
}

impl Pair {
    pub fn new(container: LoadedContainer, content: LoadedContent) -> Self {
        Self {
            slot: container.slot,
            container: container.node,
            content: content.node,
            container_size: container.size,
            content_size: content.size,
            has_lid: container.has_lid,
            playback: Playback::new(content.clip_duration),
            phase: PairPhase::AtRest,
            lid: LidState::Closed,
            content_open: false,
            saved_time: 0.0,
            initial_pos: None,
            emitted: false,
            container_tumble: false,
            content_tumble: false,
            container_euler: Vec3::zeros(),
            content_euler: Vec3::zeros(),
            lid_pose: LidPose::CLOSED,
            container_move: None,
            content_move: None,
            container_turn: None,
            content_turn: None,
            lid_tween: None,
        }
    }

    pub fn is_at_rest(&self) -> bool {
        self.phase == PairPhase::AtRest
    }

    pub fn is_tumbling(&self) -> bool {
        self.container_tumble || self.content_tumble
    }

    pub fn lid_pose(&self) -> LidPose {
        self.lid_pose
    }

    fn is_moving(&self) -> bool {
        self.container_move.is_some() || self.content_move.is_some()
    }

    fn move_both(&mut self, graph: &SceneGraph, container_to: Vec3, content_to: Vec3) {
        if let Some(from) = graph.translation(self.container) {
            self.container_move = Some(Tween::new(from, container_to, PAIR_MOVE_DURATION));
        }
        if let Some(from) = graph.translation(self.content) {
            self.content_move = Some(Tween::new(from, content_to, PAIR_MOVE_DURATION));
        }
    }

    fn start_lid(&mut self, to: LidState) {
        let (target, moving) = match to {
            LidState::Open | LidState::Opening => (LidPose::OPEN, LidState::Opening),
            LidState::Closed | LidState::Closing => (LidPose::CLOSED, LidState::Closing),
        };
        if self.has_lid {
            self.lid_tween = Some(LidTween::new(self.lid_pose, target));
            self.lid = moving;
        } else {
            self.lid_pose = target;
            self.lid = match moving {
                LidState::Opening => LidState::Open,
                _ => LidState::Closed,
            };
        }
    }

    /// Stop tumbling and ease both objects back to their resting orientation.
    fn stop_tumble(&mut self) {
        self.container_tumble = false;
        self.content_tumble = false;
        self.container_turn = Some(Tween::new(
            self.container_euler,
            Vec3::zeros(),
            CONTENT_ROTATE_DURATION,
        ));
        self.content_turn = Some(Tween::new(
            self.content_euler,
            Vec3::new(0.0, 0.0, std::f32::consts::FRAC_PI_2),
            CONTENT_ROTATE_DURATION,
        ));
    }

    fn advance(&mut self, dt: f32, graph: &mut SceneGraph) {
        if let Some(tween) = self.container_move.as_mut() {
            graph.set_translation(self.container, tween.advance(dt));
            if tween.is_finished() {
                self.container_move = None;
            }
        }
        if let Some(tween) = self.content_move.as_mut() {
            graph.set_translation(self.content, tween.advance(dt));
            if tween.is_finished() {
                self.content_move = None;
            }
        }

        let step = Vec3::from(TUMBLE_STEP);
        if self.container_tumble {
            self.container_euler += step;
        } else if let Some(tween) = self.container_turn.as_mut() {
            self.container_euler = tween.advance(dt);
            if tween.is_finished() {
                self.container_turn = None;
            }
        }
        if self.content_tumble {
            self.content_euler += step;
        } else if let Some(tween) = self.content_turn.as_mut() {
            self.content_euler = tween.advance(dt);
            if tween.is_finished() {
                self.content_turn = None;
            }
        }
        if let Some(node) = graph.get_mut(self.container) {
            node.pose.set_euler(self.container_euler);
        }
        if let Some(node) = graph.get_mut(self.content) {
            node.pose.set_euler(self.content_euler);
        }

        if let Some(tween) = self.lid_tween.as_mut() {
            self.lid_pose = tween.advance(dt);
            if let Ok(part) = graph.part_mut(self.container, LID_PART) {
                part.pose = self.lid_pose.to_pose();
                part.pose_driven = true;
            }
            if tween.is_finished() {
                self.lid_tween = None;
                self.lid = match self.lid {
                    LidState::Opening => LidState::Open,
                    LidState::Closing => LidState::Closed,
                    settled => settled,
                };
            }
        }
    }
}

/// Pair containers and contents that finished loading in arbitrary order.
///
/// Both collections are sorted by position sum, then checked slot by slot.
/// A disagreement is logged and repaired by matching on slot ids.
pub fn pair_up(
    mut containers: Vec<LoadedContainer>,
    mut contents: Vec<LoadedContent>,
    expected: usize,
) -> Result<Vec<Pair>, PairingError> {
    if containers.len() != expected || contents.len() != expected {
        return Err(PairingError::CountMismatch {
            expected,
            containers: containers.len(),
            contents: contents.len(),
        });
    }
    sort_full_population(&mut containers, expected)?;
    sort_full_population(&mut contents, expected)?;

    let mismatched = containers
        .iter()
        .zip(&contents)
        .filter(|(a, b)| a.slot != b.slot)
        .count();

    if mismatched == 0 {
        log::info!("paired {expected} containers with their contents");
        return Ok(containers
            .into_iter()
            .zip(contents)
            .map(|(a, b)| Pair::new(a, b))
            .collect());
    }

    log::warn!("{mismatched} pairs disagree after ordering, matching by shelf slot");
    let mut pairs = Vec::with_capacity(expected);
    for container in containers {
        let idx = contents
            .iter()
            .position(|c| c.slot == container.slot)
            .ok_or(PairingError::Unmatched {
                slot: container.slot,
            })?;
        let content = contents.swap_remove(idx);
        pairs.push(Pair::new(container, content));
    }
    Ok(pairs)
}

/// Ray from the camera through the pointer, in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickRay {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl PickRay {
    fn to_ray(self) -> Ray {
        Ray::new(self.origin.into(), self.dir)
    }
}

/// World AABB of a node of the given size at its current pose.
fn node_aabb(graph: &SceneGraph, node: NodeId, size: Vec3) -> Option<Aabb> {
    let pose = graph.get(node)?.pose;
    let half = size * 0.5;
    Some(Aabb::new((-half).into(), half.into()).transform_by(&pose.iso()))
}

fn ray_hit(aabb: &Aabb, ray: &PickRay) -> Option<f32> {
    aabb.cast_local_ray(&ray.to_ray(), f32::MAX, true)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    Ignored,
    /// A pair was sent to the inspection slot.
    Selected(PairId),
    /// The unrolled content was dismissed.
    Closed(PairId),
}

/// Camera-relative placements, derived from the camera anchor.
pub fn inspection_slot(anchor: Vec3) -> Vec3 {
    Vec3::new(anchor.x, anchor.y - 0.2, anchor.z - 1.0)
}

pub fn reading_slot(anchor: Vec3) -> Vec3 {
    Vec3::new(anchor.x, anchor.y + 0.27, anchor.z - 1.06)
}

pub fn corner_slot(anchor: Vec3) -> Vec3 {
    Vec3::new(anchor.x, anchor.y - 2.0, anchor.z - 1.0)
}

/// Content orientation while being read.
pub fn reading_orientation() -> Vec3 {
    Vec3::new(std::f32::consts::FRAC_PI_2 - 0.15, 0.0, 0.0)
}

#[derive(Debug, Default)]
pub struct Interaction {
    pairs: Vec<Pair>,
    selected: Option<PairId>,
    hovered: Option<PairId>,
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pairs(pairs: Vec<Pair>) -> Self {
        Self {
            pairs,
            ..Self::default()
        }
    }

    pub fn is_paired(&self) -> bool {
        !self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    pub fn pair(&self, id: PairId) -> Option<&Pair> {
        self.pairs.get(id.0)
    }

    pub fn pair_mut(&mut self, id: PairId) -> Option<&mut Pair> {
        self.pairs.get_mut(id.0)
    }

    pub fn selected(&self) -> Option<PairId> {
        self.selected
    }

    pub fn hovered(&self) -> Option<PairId> {
        self.hovered
    }

    /// No pair selected, or the selected one is back on its shelf.
    pub fn selection_at_rest(&self) -> bool {
        self.selected
            .and_then(|id| self.pair(id))
            .is_none_or(Pair::is_at_rest)
    }

    /// Take a pair out of the pick lifecycle for good.
    pub fn emit(&mut self, id: PairId) {
        if let Some(pair) = self.pairs.get_mut(id.0) {
            pair.emitted = true;
        }
        if self.selected == Some(id) {
            self.selected = None;
        }
        if self.hovered == Some(id) {
            self.hovered = None;
        }
    }

    /// Nearest pickable container hit by `ray`.
    pub fn pick_container(&self, ray: &PickRay, graph: &SceneGraph) -> Option<PairId> {
        self.pairs
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.emitted && !graph.is_removed(p.container))
            .filter_map(|(i, p)| {
                let aabb = node_aabb(graph, p.container, p.container_size)?;
                ray_hit(&aabb, ray).map(|toi| (i, toi))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| PairId(i))
    }

    fn pick_content(&self, id: PairId, ray: &PickRay, graph: &SceneGraph) -> bool {
        self.pair(id)
            .and_then(|p| node_aabb(graph, p.content, p.content_size))
            .is_some_and(|aabb| ray_hit(&aabb, ray).is_some())
    }

    /// Pointer moved: highlight the container under it when one could be selected.
    pub fn hover(&mut self, ray: &PickRay, graph: &SceneGraph) -> Option<PairId> {
        self.hovered = if self.selection_at_rest() {
            self.pick_container(ray, graph)
        } else {
            None
        };
        self.hovered
    }

    pub fn on_click(&mut self, ray: &PickRay, camera: &CameraRig, graph: &SceneGraph) -> ClickOutcome {
        if let Some(id) = self.selected
            && self.pair(id).is_some_and(|p| p.phase == PairPhase::InSlotOpen)
        {
            if self.pick_content(id, ray, graph) {
                self.dismiss_content(id, graph);
                return ClickOutcome::Closed(id);
            }
            return ClickOutcome::Ignored;
        }

        let Some(hit) = self.pick_container(ray, graph) else {
            return ClickOutcome::Ignored;
        };

        let camera_close = camera.position.z <= PICK_MAX_CAMERA_Z;
        if camera_close && self.selection_at_rest() {
            self.selected = Some(hit);
        }
        let Some(id) = self.selected else {
            return ClickOutcome::Ignored;
        };
        let Some(pair) = self.pairs.get_mut(id.0) else {
            return ClickOutcome::Ignored;
        };

        match pair.phase {
            PairPhase::AtRest if camera_close => {
                let Some(rest) = pair
                    .initial_pos
                    .or_else(|| graph.translation(pair.container))
                else {
                    return ClickOutcome::Ignored;
                };
                pair.initial_pos.get_or_insert(rest);
                let slot = inspection_slot(camera.anchor());
                pair.move_both(graph, slot, slot);
                pair.container_tumble = true;
                pair.content_tumble = true;
                pair.container_turn = None;
                pair.content_turn = None;
                pair.phase = PairPhase::MovingToSlot;
                log::debug!("pair {id:?} moving to inspection slot");
                ClickOutcome::Selected(id)
            }
            // `update` opens the lid on the tick a pair reaches the slot, so an
            // arrived pair is only dismissed through its content
            _ => ClickOutcome::Ignored,
        }
    }

    fn dismiss_content(&mut self, id: PairId, graph: &SceneGraph) {
        let Some(pair) = self.pairs.get_mut(id.0) else {
            return;
        };
        let Some(rest) = pair.initial_pos else {
            return;
        };
        pair.saved_time = pair.playback.time();
        pair.stop_tumble();
        pair.move_both(graph, rest, rest);
        pair.start_lid(LidState::Closed);
        pair.content_open = false;
        pair.playback.reset();
        pair.playback.seek(pair.saved_time);
        pair.playback.pause();
        pair.phase = PairPhase::Returning;
        log::debug!("pair {id:?} dismissed at t={:.2}", pair.saved_time);
    }

    /// Advance every content clip and publish its time on the content node.
    pub fn advance_playback(&mut self, dt: f32, graph: &mut SceneGraph) {
        for pair in self.pairs.iter_mut().filter(|p| !p.emitted) {
            pair.playback.advance(dt);
            if let Some(node) = graph.get_mut(pair.content) {
                node.clip_time = Some(pair.playback.time());
            }
        }
    }

    /// Per-tick transitions: arrival, automatic lid opening, content reveal, return.
    pub fn update(&mut self, dt: f32, camera: &CameraRig, graph: &mut SceneGraph) {
        for pair in self.pairs.iter_mut().filter(|p| !p.emitted) {
            pair.advance(dt, graph);
        }

        let Some(id) = self.selected else {
            return;
        };
        let Some(pair) = self.pairs.get_mut(id.0) else {
            return;
        };

        match pair.phase {
            PairPhase::MovingToSlot if !pair.is_moving() => {
                pair.phase = PairPhase::InSlotClosed;
            }
            PairPhase::Returning if !pair.is_moving() && pair.lid_tween.is_none() => {
                pair.phase = PairPhase::AtRest;
                log::debug!("pair {id:?} back at rest");
            }
            _ => {}
        }

        if pair.phase == PairPhase::InSlotClosed && pair.lid == LidState::Closed && !pair.content_open {
            if !pair.has_lid {
                log::warn!("container for pair {id:?} has no `{LID_PART}` part, skipping lid animation");
            }
            pair.start_lid(LidState::Open);
            pair.phase = PairPhase::Opening;
        }

        if pair.phase == PairPhase::Opening && pair.lid == LidState::Open && !pair.content_open {
            let anchor = camera.anchor();
            pair.playback.play();
            pair.content_tumble = false;
            pair.content_open = true;
            pair.content_turn = Some(Tween::new(
                pair.content_euler,
                reading_orientation(),
                CONTENT_ROTATE_DURATION,
            ));
            if let Some(from) = graph.translation(pair.content) {
                pair.content_move = Some(Tween::new(from, reading_slot(anchor), PAIR_MOVE_DURATION));
            }
            if let Some(from) = graph.translation(pair.container) {
                pair.container_move = Some(Tween::new(from, corner_slot(anchor), PAIR_MOVE_DURATION));
            }
            pair.phase = PairPhase::InSlotOpen;
            log::debug!("pair {id:?} content revealed");
        }
    }
}
