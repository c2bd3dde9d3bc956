use shopfront::constants::SPAWN_POSITION;
use shopfront::interaction::{PairPhase, reading_slot};
use shopfront::loading::{LoadKind, LoadedModel};
use shopfront::proximity::ProximityMachine;
use shopfront::settings::{
    EMIT_SET, LID_PART, MAX_SCROLL_TEXTURE, SHOP_INDICATOR_PARTS, shop_position, textured_slots,
};
use shopfront::types::approx_eq;
use shopfront::{
    ClickOutcome, DriveKey, KeyEdge, LidState, NodeKind, PairId, PickRay, Pose, ProximityPhase,
    SceneConfig, SceneSession, Vec3,
};

fn model_for(kind: LoadKind) -> LoadedModel {
    match kind {
        LoadKind::Vehicle => LoadedModel {
            size: Vec3::new(2.0, 1.5, 4.0),
            ..LoadedModel::default()
        },
        LoadKind::Shop(_) => LoadedModel {
            size: Vec3::new(8.0, 6.0, 6.0),
            parts: SHOP_INDICATOR_PARTS.iter().map(|s| s.to_string()).collect(),
            clip_duration: Some(2.0),
        },
        LoadKind::Container(_) => LoadedModel {
            size: Vec3::new(0.4, 0.6, 0.4),
            parts: vec![LID_PART.to_string()],
            clip_duration: None,
        },
        LoadKind::Content(_) => LoadedModel {
            size: Vec3::new(0.3, 0.3, 0.3),
            parts: Vec::new(),
            clip_duration: Some(3.0),
        },
        _ => LoadedModel {
            size: Vec3::repeat(1.0),
            ..LoadedModel::default()
        },
    }
}

/// Fulfil every planned load, last issued first.
fn load_everything(session: &mut SceneSession) {
    let requests: Vec<_> = session.plan().to_vec();
    for request in requests.iter().rev() {
        session
            .on_loaded(request.ticket, Ok(model_for(request.kind)))
            .unwrap();
    }
}

/// Fulfil only the planned loads whose kind matches.
fn load_where(session: &mut SceneSession, pred: impl Fn(LoadKind) -> bool) {
    let requests: Vec<_> = session.plan().to_vec();
    for request in requests.iter().filter(|r| pred(r.kind)) {
        session
            .on_loaded(request.ticket, Ok(model_for(request.kind)))
            .unwrap();
    }
}

fn content_textures(session: &SceneSession) -> Vec<Option<String>> {
    session
        .graph()
        .iter()
        .filter(|(_, n)| n.kind == NodeKind::Content)
        .map(|(_, n)| n.texture.clone())
        .collect()
}

fn loaded_session(config: SceneConfig) -> SceneSession {
    let mut session = SceneSession::new(config);
    load_everything(&mut session);
    session
}

fn park_vehicle(session: &mut SceneSession, x: f32) {
    let chassis = session.vehicle_chassis().unwrap();
    let mut pose = shopfront::vehicle::spawn_pose();
    pose.translation.x = x;
    session.world_mut().set_pose(chassis, pose);
}

#[test]
fn full_load_pairs_every_slot_and_retires_the_emit_set() {
    let mut session = loaded_session(SceneConfig::default());
    assert_eq!(session.progress().percent(), 100);
    assert!(session.interaction().is_paired());

    session.tick();
    assert!(session.emit_done());
    assert!(session.decorations_placed());

    let removed = session.take_removed();
    assert_eq!(removed.len(), EMIT_SET.len() * 2);

    for (i, pair) in session.interaction().pairs().iter().enumerate() {
        let graph = session.graph();
        if EMIT_SET.contains(&i) {
            assert!(pair.emitted);
            assert!(graph.get(pair.container).is_none());
            assert!(graph.get(pair.content).is_none());
            continue;
        }
        // both halves of a pair share their shelf slot
        let container = graph.translation(pair.container).unwrap();
        let content = graph.translation(pair.content).unwrap();
        assert_eq!(container, content);

        let texture = graph.get(pair.content).unwrap().texture.clone();
        if i <= MAX_SCROLL_TEXTURE {
            assert_eq!(texture, Some(format!("scroll_tex{i}")));
        } else {
            assert_eq!(texture, None);
        }
    }
}

#[test]
fn scroll_textures_arrive_after_pairing_in_either_load_order() {
    let contents_first = |k: LoadKind| matches!(k, LoadKind::Content(_));
    let containers_first = |k: LoadKind| matches!(k, LoadKind::Container(_));

    for first in [&contents_first as &dyn Fn(LoadKind) -> bool, &containers_first] {
        let mut session = SceneSession::new(SceneConfig::default());
        load_where(&mut session, first);
        session.tick();
        assert!(!session.interaction().is_paired());
        assert!(content_textures(&session).iter().all(Option::is_none));

        load_where(&mut session, |k| !first(k));
        assert!(session.interaction().is_paired());
        // nodes that exist before the pass keep no texture until the tick runs it
        assert!(content_textures(&session).iter().all(Option::is_none));

        session.tick();
        for (i, pair) in session.interaction().pairs().iter().enumerate() {
            if pair.emitted {
                continue;
            }
            let texture = session.graph().get(pair.content).unwrap().texture.clone();
            let expected = textured_slots().any(|s| s == i).then(|| format!("scroll_tex{i}"));
            assert_eq!(texture, expected, "pair {i}");
        }
        assert_eq!(
            content_textures(&session).iter().flatten().count(),
            textured_slots().count()
        );
    }
}

#[test]
fn emitted_slots_never_resolve_to_a_container() {
    let mut session = loaded_session(SceneConfig::default());
    let former: Vec<Vec3> = EMIT_SET
        .iter()
        .map(|&i| {
            let pair = session.interaction().pair(PairId(i)).unwrap();
            session.graph().translation(pair.container).unwrap()
        })
        .collect();

    for _ in 0..3 {
        session.tick();
    }

    for position in former {
        let ray = PickRay {
            origin: Vec3::new(position.x, position.y, 5.0),
            dir: Vec3::new(0.0, 0.0, -1.0),
        };
        assert_eq!(
            session.interaction().pick_container(&ray, session.graph()),
            None
        );
        assert_eq!(session.handle_click(ray), ClickOutcome::Ignored);
    }
}

#[test]
fn decorations_follow_the_seed() {
    let placements = |seed| {
        let mut session = loaded_session(SceneConfig {
            decoration_seed: seed,
            ..SceneConfig::default()
        });
        session.tick();
        session
            .graph()
            .iter()
            .filter(|(_, n)| n.kind == NodeKind::Decoration)
            .map(|(id, n)| (id, n.pose.translation, n.visible))
            .collect::<Vec<_>>()
    };

    let a = placements(7);
    let b = placements(7);
    assert_eq!(a, b);
    assert_eq!(a.len(), EMIT_SET.len());
    assert!(a.iter().all(|(_, _, visible)| *visible));
    // decorations sit just below and in front of the retired containers
    assert!(a.iter().all(|(_, p, _)| approx_eq(
        Vec3::new(0.0, 0.0, p.z),
        Vec3::new(0.0, 0.0, -10.7),
        1.0e-4
    )));
}

#[test]
fn fallen_vehicle_respawns_on_the_next_tick() {
    let mut session = loaded_session(SceneConfig::default());
    let chassis = session.vehicle_chassis().unwrap();
    session
        .world_mut()
        .set_pose(chassis, Pose::from_translation(Vec3::new(3.0, -10.0, 2.0)));

    let report = session.tick();
    assert!(report.respawned);
    let pose = session.world().pose(chassis).unwrap();
    assert_eq!(pose.translation, Vec3::from(SPAWN_POSITION));
    let (axis, angle) = pose.rotation.axis_angle().unwrap();
    assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1.0e-5);
    assert!(axis.y > 0.999);

    let node = session.vehicle_node().unwrap();
    assert_eq!(session.graph().translation(node), Some(Vec3::from(SPAWN_POSITION)));
}

#[test]
fn first_accelerate_hides_the_controls_hint() {
    let mut session = loaded_session(SceneConfig::default());
    assert!(!session.tick().hint_hidden);
    assert!(session.handle_key(DriveKey::Accelerate, KeyEdge::Down));
    assert!(session.handle_key(DriveKey::Accelerate, KeyEdge::Up));
    assert!(session.tick().hint_hidden);
}

#[test]
fn debug_proxies_are_reported_only_when_enabled() {
    let mut quiet = loaded_session(SceneConfig::default());
    assert!(quiet.tick().proxies.is_empty());

    let mut debug = loaded_session(SceneConfig {
        debug_proxies: true,
        ..SceneConfig::default()
    });
    // vehicle plus four shops
    assert_eq!(debug.tick().proxies.len(), 5);
}

#[test]
fn shop_focus_then_inspect_a_pair() {
    let mut session = loaded_session(SceneConfig::default());
    let shop = shop_position(0);

    // midpoint of the vehicle proxy lands one unit behind its center
    park_vehicle(&mut session, shop.x + 1.0);
    let report = session.tick();
    assert_eq!(report.phase, ProximityPhase::InRange);
    assert!(report.prompt.visible);

    assert!(session.toggle_shop());
    let report = session.tick();
    assert_eq!(report.phase, ProximityPhase::Focused);
    assert!(!report.orbit_enabled);

    for _ in 0..100 {
        park_vehicle(&mut session, shop.x + 1.0);
        session.tick();
    }
    let (dest, look) = ProximityMachine::focus_target(shop);
    assert!(approx_eq(session.camera().position, dest, 1.0e-4));
    assert_eq!(session.camera().target, look);

    // pair 1 sits on the first shop's shelf and is not in the emit set
    let id = PairId(1);
    let pair = session.interaction().pair(id).unwrap();
    let rest = session.graph().translation(pair.container).unwrap();
    let ray = PickRay {
        origin: session.camera().position,
        dir: (rest - session.camera().position).normalize(),
    };
    assert_eq!(session.handle_click(ray), ClickOutcome::Selected(id));

    // hovering other containers is suppressed while a pair is out
    let other = session.interaction().pair(PairId(2)).unwrap();
    let other_pos = session.graph().translation(other.container).unwrap();
    let hover = PickRay {
        origin: session.camera().position,
        dir: (other_pos - session.camera().position).normalize(),
    };
    assert_eq!(session.handle_hover(hover), None);

    for _ in 0..190 {
        park_vehicle(&mut session, shop.x + 1.0);
        session.tick();
    }
    let pair = session.interaction().pair(id).unwrap();
    assert_eq!(pair.phase, PairPhase::InSlotOpen);
    assert_eq!(pair.lid, LidState::Open);
    let content = session.graph().translation(pair.content).unwrap();
    assert!(approx_eq(content, reading_slot(dest), 1.0e-4));
    let before = pair.playback.time();
    assert!(before > 0.0);

    let ray = PickRay {
        origin: session.camera().position,
        dir: (content - session.camera().position).normalize(),
    };
    assert_eq!(session.handle_click(ray), ClickOutcome::Closed(id));

    for _ in 0..90 {
        park_vehicle(&mut session, shop.x + 1.0);
        session.tick();
    }
    let pair = session.interaction().pair(id).unwrap();
    assert_eq!(pair.phase, PairPhase::AtRest);
    assert_eq!(pair.lid, LidState::Closed);
    assert_eq!(pair.playback.time(), before);
    assert_eq!(session.graph().translation(pair.container), Some(rest));
    assert!(session.interaction().selection_at_rest());
}

#[test]
fn driving_away_drops_focus_and_restores_the_chase_camera() {
    let mut session = loaded_session(SceneConfig::default());
    let shop = shop_position(1);
    park_vehicle(&mut session, shop.x + 1.0);
    session.tick();
    assert!(session.toggle_shop());
    session.tick();
    assert_eq!(session.proximity().focused_shop(), Some(1));

    park_vehicle(&mut session, shop.x + 12.0);
    let report = session.tick();
    assert_eq!(report.phase, ProximityPhase::Idle);
    assert!(!report.prompt.visible);
    assert!(report.orbit_enabled);
    assert!(!session.proximity().enter_intent());

    let entry = session.shops()[1].as_ref().unwrap();
    assert!(entry.closed);
    for part in SHOP_INDICATOR_PARTS {
        assert!(session.graph().part(entry.node, part).unwrap().visible);
    }
}
