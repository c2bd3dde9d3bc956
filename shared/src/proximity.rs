//! Proximity and focus state machine for the shop fronts.
//!
//! Evaluated once per tick. Level-triggered parts (prompt, chase camera, shop
//! playback direction) are recomputed every call; edge-triggered parts (camera
//! move, blink start, indicator reset) only fire on entering or leaving focus.

use std::time::Duration;

use rapier3d::prelude::RigidBodyHandle;

use crate::camera::CameraRig;
use crate::constants::{BLINK_INTERVAL, BLINK_TOTAL, INDICATOR_HIDE_TIME};
use crate::playback::Playback;
use crate::scene::{NodeId, SceneGraph};
use crate::settings::{SHOP_FOCUS_DISTANCE, SHOP_FOCUS_HEIGHT_DIVISOR, SHOP_LOOK_HEIGHT};
use crate::types::{Bounds, Vec3};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProximityPhase {
    #[default]
    Idle,
    InRange,
    Focused,
}

/// Inclusive X extent of a shop's debug proxy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShopSpan {
    pub min_x: f32,
    pub max_x: f32,
}

impl ShopSpan {
    pub fn from_proxy(proxy: &Bounds) -> Self {
        let (min_x, max_x) = proxy.span_x();
        Self { min_x, max_x }
    }
}

/// Midpoint X of the vehicle's debug proxy.
///
/// The proxy extends its full width ahead of the center and twice its depth
/// behind it; the midpoint is taken over that extent.
pub fn vehicle_midpoint_x(proxy: &Bounds) -> f32 {
    let max = proxy.center.x + proxy.size.x;
    let min = proxy.center.x - proxy.size.z * 2.0;
    (max - min) / 2.0 + min
}

pub fn in_range(mid_x: f32, span: ShopSpan) -> bool {
    mid_x >= span.min_x && mid_x <= span.max_x
}

/// One loaded shop front.
#[derive(Clone, Debug)]
pub struct ShopEntry {
    pub node: NodeId,
    pub body: RigidBodyHandle,
    pub proxy: NodeId,
    /// Bounding box size of the scaled model.
    pub bbox: Vec3,
    /// Debug proxy size: full bbox footprint, collider height.
    pub proxy_size: Vec3,
    pub playback: Playback,
    pub closed: bool,
    /// Indicator parts actually present on the model.
    pub indicators: Vec<&'static str>,
}

impl ShopEntry {
    pub fn proxy_bounds(&self, graph: &SceneGraph) -> Option<Bounds> {
        graph
            .translation(self.node)
            .map(|center| Bounds::new(center, self.proxy_size))
    }

    fn set_indicators(&self, graph: &mut SceneGraph, visible: bool) {
        for name in &self.indicators {
            if let Ok(part) = graph.part_mut(self.node, name) {
                part.visible = visible;
            }
        }
    }

    fn toggle_indicators(&self, graph: &mut SceneGraph) {
        for name in &self.indicators {
            if let Ok(part) = graph.part_mut(self.node, name) {
                part.visible = !part.visible;
            }
        }
    }
}

/// Indicator blink: toggles on a fixed interval, then settles fully visible.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Blink {
    shop: usize,
    since_toggle: Duration,
    toggles_done: u32,
    finished: bool,
}

impl Blink {
    pub fn toggle_count() -> u32 {
        (BLINK_TOTAL.as_millis() / (BLINK_INTERVAL.as_millis() * 2)) as u32
    }

    pub fn new(shop: usize) -> Self {
        Self {
            shop,
            since_toggle: Duration::ZERO,
            toggles_done: 0,
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn tick(&mut self, dt: Duration, entry: &ShopEntry, graph: &mut SceneGraph) {
        if self.finished {
            return;
        }
        self.since_toggle += dt;
        while self.since_toggle >= BLINK_INTERVAL && !self.finished {
            self.since_toggle -= BLINK_INTERVAL;
            if self.toggles_done < Self::toggle_count() {
                entry.toggle_indicators(graph);
                self.toggles_done += 1;
            } else {
                entry.set_indicators(graph, true);
                self.finished = true;
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PromptLabel {
    #[default]
    Enter,
    Exit,
}

/// The enter/exit shop prompt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Prompt {
    pub visible: bool,
    pub label: PromptLabel,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProximityOutcome {
    pub phase: ProximityPhase,
    pub shop: Option<usize>,
    pub entered_focus: bool,
    pub left_focus: bool,
}

/// Inputs the machine reads each tick.
pub struct ProximityInput<'a> {
    pub vehicle_proxy: Option<Bounds>,
    pub vehicle_position: Option<Vec3>,
    /// No pair is selected, or the selected pair is back at rest.
    pub pairs_at_rest: bool,
    pub dt: f32,
    pub graph: &'a mut SceneGraph,
    pub camera: &'a mut CameraRig,
}

#[derive(Debug, Default)]
pub struct ProximityMachine {
    phase: ProximityPhase,
    enter_intent: bool,
    focused: Option<usize>,
    /// Last shop that took focus; keeps driving its playback after focus ends.
    selected: Option<usize>,
    blink: Option<Blink>,
    prompt: Prompt,
}

impl ProximityMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ProximityPhase {
        self.phase
    }

    pub fn prompt(&self) -> Prompt {
        self.prompt
    }

    pub fn focused_shop(&self) -> Option<usize> {
        self.focused
    }

    pub fn selected_shop(&self) -> Option<usize> {
        self.selected
    }

    pub fn blink(&self) -> Option<&Blink> {
        self.blink.as_ref()
    }

    pub fn enter_intent(&self) -> bool {
        self.enter_intent
    }

    /// The enter/exit prompt was activated.
    pub fn toggle_intent(&mut self) {
        self.enter_intent = !self.enter_intent;
        self.prompt.label = if self.enter_intent {
            PromptLabel::Exit
        } else {
            PromptLabel::Enter
        };
        log::debug!("shop enter intent: {}", self.enter_intent);
    }

    /// Camera destination and aim point for a focused shop at `shop`.
    pub fn focus_target(shop: Vec3) -> (Vec3, Vec3) {
        let destination = Vec3::new(
            shop.x,
            shop.y + SHOP_FOCUS_DISTANCE / SHOP_FOCUS_HEIGHT_DIVISOR,
            shop.z + SHOP_FOCUS_DISTANCE,
        );
        let look_at = Vec3::new(shop.x, shop.y + SHOP_LOOK_HEIGHT, shop.z);
        (destination, look_at)
    }

    pub fn update(
        &mut self,
        shops: &mut [Option<ShopEntry>],
        input: ProximityInput<'_>,
    ) -> ProximityOutcome {
        let ProximityInput {
            vehicle_proxy,
            vehicle_position,
            pairs_at_rest,
            dt,
            graph,
            camera,
        } = input;

        let mid = vehicle_proxy.as_ref().map(vehicle_midpoint_x);
        let hit = mid.and_then(|mid| {
            shops.iter().enumerate().find_map(|(i, shop)| {
                let shop = shop.as_ref()?;
                let span = ShopSpan::from_proxy(&shop.proxy_bounds(graph)?);
                in_range(mid, span).then_some(i)
            })
        });

        let was_focused = self.focused;
        let mut outcome = ProximityOutcome::default();

        match hit {
            Some(i) => {
                self.prompt.visible = pairs_at_rest;
                outcome.shop = Some(i);
                outcome.phase = ProximityPhase::InRange;

                if self.enter_intent
                    && let Some(entry) = shops[i].as_ref()
                {
                    outcome.phase = ProximityPhase::Focused;
                    if let Some(shop_pos) = graph.translation(entry.node) {
                        let (dest, look) = Self::focus_target(shop_pos);
                        camera.move_to(dest, look);
                    }
                    if self.blink.is_none() {
                        self.blink = Some(Blink::new(i));
                    }
                    if entry.playback.time() >= INDICATOR_HIDE_TIME {
                        entry.set_indicators(graph, false);
                    }
                    self.focused = Some(i);
                    self.selected = Some(i);
                }
            }
            None => {
                self.prompt.visible = false;
            }
        }

        if outcome.phase != ProximityPhase::Focused {
            self.focused = None;
            if self.enter_intent {
                self.enter_intent = false;
                self.prompt.label = PromptLabel::Enter;
            }
            camera.orbit_enabled = true;
            if let Some(pos) = vehicle_position {
                camera.follow(pos);
            }
        }

        outcome.entered_focus = was_focused.is_none() && self.focused.is_some();
        outcome.left_focus = was_focused.is_some() && self.focused.is_none();

        if outcome.left_focus {
            for entry in shops.iter().flatten() {
                entry.set_indicators(graph, true);
            }
            self.blink = None;
            log::debug!("left shop focus");
        }
        if outcome.entered_focus {
            log::debug!("focused shop {:?}", self.focused);
        }

        if let Some(blink) = self.blink.as_mut()
            && let Some(Some(entry)) = shops.get(blink.shop)
        {
            blink.tick(Duration::from_secs_f32(dt.max(0.0)), entry, graph);
        }

        if let Some(Some(entry)) = self.selected.and_then(|i| shops.get_mut(i)) {
            if self.focused.is_some() {
                entry.playback.set_time_scale(1.0);
                entry.closed = false;
            } else {
                entry.playback.set_time_scale(-1.0);
                entry.closed = true;
            }
            entry.playback.play();
        }

        self.phase = outcome.phase;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{NodeKind, SceneNode};
    use crate::settings::SHOP_INDICATOR_PARTS;
    use crate::types::Pose;

    fn shop(graph: &mut SceneGraph, x: f32, width: f32) -> ShopEntry {
        let node = graph.add(
            SceneNode::new(
                NodeKind::Shop,
                None,
                Pose::from_translation(Vec3::new(x, 0.0, -9.5)),
                2.0,
            )
            .with_parts(SHOP_INDICATOR_PARTS),
        );
        let proxy = graph.add(SceneNode::new(
            NodeKind::ShopProxy,
            None,
            Pose::from_translation(Vec3::new(x, 0.0, -9.5)),
            1.0,
        ));
        ShopEntry {
            node,
            body: RigidBodyHandle::invalid(),
            proxy,
            bbox: Vec3::new(width, 6.0, 4.0),
            proxy_size: Vec3::new(width, 3.0, 4.0),
            playback: Playback::new(0.75),
            closed: true,
            indicators: SHOP_INDICATOR_PARTS.to_vec(),
        }
    }

    // A proxy whose midpoint lands exactly on `x`.
    fn vehicle_at(x: f32) -> Bounds {
        Bounds::new(Vec3::new(x, 0.6, 0.0), Vec3::new(2.0, 1.0, 1.0))
    }

    fn run(
        machine: &mut ProximityMachine,
        shops: &mut [Option<ShopEntry>],
        graph: &mut SceneGraph,
        camera: &mut CameraRig,
        x: f32,
    ) -> ProximityOutcome {
        machine.update(
            shops,
            ProximityInput {
                vehicle_proxy: Some(vehicle_at(x)),
                vehicle_position: Some(Vec3::new(x, 0.6, 0.0)),
                pairs_at_rest: true,
                dt: 1.0 / 60.0,
                graph,
                camera,
            },
        )
    }

    fn indicator_visible(graph: &SceneGraph, entry: &ShopEntry) -> Vec<bool> {
        entry
            .indicators
            .iter()
            .map(|n| graph.part(entry.node, n).map(|p| p.visible).unwrap_or(false))
            .collect()
    }

    #[test]
    fn midpoint_matches_proxy_extent() {
        let proxy = Bounds::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(4.0, 1.0, 1.5));
        // extent is [10 - 3, 10 + 4], midpoint 10.5
        assert!((vehicle_midpoint_x(&proxy) - 10.5).abs() < 1.0e-6);
    }

    #[test]
    fn span_contains_midpoint() {
        let span = ShopSpan {
            min_x: 8.0,
            max_x: 12.0,
        };
        assert!(in_range(10.0, span));
        assert!(!in_range(20.0, span));
        assert!(in_range(8.0, span));
    }

    #[test]
    fn vehicle_near_shop_shows_prompt_without_focus() {
        let mut graph = SceneGraph::new();
        let mut camera = CameraRig::new();
        let mut shops = vec![Some(shop(&mut graph, 10.0, 4.0))];
        let mut machine = ProximityMachine::new();

        let out = run(&mut machine, &mut shops, &mut graph, &mut camera, 10.0);
        assert_eq!(out.phase, ProximityPhase::InRange);
        assert!(machine.prompt().visible);

        let out = run(&mut machine, &mut shops, &mut graph, &mut camera, 20.0);
        assert_eq!(out.phase, ProximityPhase::Idle);
        assert!(!machine.prompt().visible);
    }

    #[test]
    fn the_last_shop_is_scanned_too() {
        let mut graph = SceneGraph::new();
        let mut camera = CameraRig::new();
        let mut shops = vec![
            Some(shop(&mut graph, -30.0, 4.0)),
            Some(shop(&mut graph, 30.0, 4.0)),
        ];
        let mut machine = ProximityMachine::new();
        let out = run(&mut machine, &mut shops, &mut graph, &mut camera, 30.0);
        assert_eq!(out.shop, Some(1));
    }

    #[test]
    fn absent_shops_are_skipped() {
        let mut graph = SceneGraph::new();
        let mut camera = CameraRig::new();
        let mut shops = vec![None, Some(shop(&mut graph, 10.0, 4.0))];
        let mut machine = ProximityMachine::new();
        let out = run(&mut machine, &mut shops, &mut graph, &mut camera, 10.0);
        assert_eq!(out.shop, Some(1));
    }

    #[test]
    fn focus_moves_camera_blinks_and_opens_shop() {
        let mut graph = SceneGraph::new();
        let mut camera = CameraRig::new();
        let mut shops = vec![Some(shop(&mut graph, 10.0, 4.0))];
        let mut machine = ProximityMachine::new();

        machine.toggle_intent();
        assert_eq!(machine.prompt().label, PromptLabel::Exit);
        let out = run(&mut machine, &mut shops, &mut graph, &mut camera, 10.0);
        assert!(out.entered_focus);
        assert_eq!(out.phase, ProximityPhase::Focused);
        assert!(camera.is_moving());
        assert!(!camera.orbit_enabled);
        assert!(machine.blink().is_some());

        let entry = shops[0].as_ref().unwrap();
        assert_eq!(entry.playback.time_scale(), 1.0);
        assert!(!entry.closed);
        assert!(!entry.playback.is_paused());
    }

    #[test]
    fn blink_toggles_four_times_then_settles_visible() {
        let mut graph = SceneGraph::new();
        let mut camera = CameraRig::new();
        let mut shops = vec![Some(shop(&mut graph, 10.0, 4.0))];
        let mut machine = ProximityMachine::new();
        machine.toggle_intent();

        assert_eq!(Blink::toggle_count(), 4);
        let mut seen_hidden = false;
        for _ in 0..120 {
            run(&mut machine, &mut shops, &mut graph, &mut camera, 10.0);
            let entry = shops[0].as_ref().unwrap();
            if indicator_visible(&graph, entry).iter().any(|v| !v) {
                seen_hidden = true;
            }
        }
        assert!(seen_hidden);
        assert!(machine.blink().is_some_and(Blink::is_finished));
    }

    #[test]
    fn indicators_hide_at_checkpoint_and_return_on_exit() {
        let mut graph = SceneGraph::new();
        let mut camera = CameraRig::new();
        let mut shops = vec![Some(shop(&mut graph, 10.0, 4.0))];
        let mut machine = ProximityMachine::new();
        machine.toggle_intent();

        for _ in 0..120 {
            run(&mut machine, &mut shops, &mut graph, &mut camera, 10.0);
            if let Some(entry) = shops[0].as_mut() {
                entry.playback.advance(1.0 / 60.0);
            }
        }
        run(&mut machine, &mut shops, &mut graph, &mut camera, 10.0);
        let entry = shops[0].as_ref().unwrap();
        assert_eq!(indicator_visible(&graph, entry), vec![false; 3]);

        machine.toggle_intent();
        let out = run(&mut machine, &mut shops, &mut graph, &mut camera, 10.0);
        assert!(out.left_focus);
        assert!(machine.blink().is_none());
        assert!(camera.orbit_enabled);
        assert_eq!(camera.position, Vec3::new(1.0, 3.0, 18.0));

        let entry = shops[0].as_ref().unwrap();
        assert_eq!(indicator_visible(&graph, entry), vec![true; 3]);
        assert_eq!(entry.playback.time_scale(), -1.0);
        assert!(entry.closed);
    }

    #[test]
    fn driving_away_clears_intent() {
        let mut graph = SceneGraph::new();
        let mut camera = CameraRig::new();
        let mut shops = vec![Some(shop(&mut graph, 10.0, 4.0))];
        let mut machine = ProximityMachine::new();
        machine.toggle_intent();
        run(&mut machine, &mut shops, &mut graph, &mut camera, 10.0);
        let out = run(&mut machine, &mut shops, &mut graph, &mut camera, 40.0);
        assert!(out.left_focus);
        assert!(!machine.enter_intent());
        assert_eq!(machine.prompt().label, PromptLabel::Enter);
    }
}
