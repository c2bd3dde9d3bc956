use bevy::{prelude::*, window::PrimaryWindow};
use leafwing_input_manager::prelude::*;
use shopfront::{ClickOutcome, DriveKey, KeyEdge, PickRay};

use crate::{convert::to_pick_ray, cursor::CurrentCursor, simulation::Session};

#[derive(Reflect, Actionlike, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputAction {
    Accelerate,
    Reverse,
    Select,
    ToggleShop,
}

pub(super) fn plugin(app: &mut App) {
    app.add_plugins(InputManagerPlugin::<InputAction>::default());

    app.register_type::<InputAction>();

    let mut input_map = InputMap::<InputAction>::default();
    input_map.insert(InputAction::Accelerate, KeyCode::Space);
    input_map.insert(InputAction::Reverse, KeyCode::Backspace);
    input_map.insert(InputAction::Select, MouseButton::Left);
    input_map.insert(InputAction::ToggleShop, KeyCode::KeyE);
    app.insert_resource(input_map);
    app.insert_resource(ActionState::<InputAction>::default());

    app.add_systems(Update, (handle_drive_keys, handle_toggle_shop, handle_pointer));
}

fn handle_drive_keys(actions: Res<ActionState<InputAction>>, mut session: ResMut<Session>) {
    for (action, key) in [
        (InputAction::Accelerate, DriveKey::Accelerate),
        (InputAction::Reverse, DriveKey::Reverse),
    ] {
        if actions.just_pressed(&action) {
            session.handle_key(key, KeyEdge::Down);
        }
        if actions.just_released(&action) {
            session.handle_key(key, KeyEdge::Up);
        }
    }
}

fn handle_toggle_shop(actions: Res<ActionState<InputAction>>, mut session: ResMut<Session>) {
    if actions.just_pressed(&InputAction::ToggleShop) && !session.toggle_shop() {
        debug!("No shop in range to toggle");
    }
}

fn cursor_ray(
    window: &Window,
    camera: &Camera,
    camera_transform: &GlobalTransform,
) -> Option<PickRay> {
    let cursor = window.cursor_position()?;
    camera
        .viewport_to_world(camera_transform, cursor)
        .ok()
        .map(to_pick_ray)
}

/// Hover feedback every frame, selection on click.
fn handle_pointer(
    actions: Res<ActionState<InputAction>>,
    window: Single<&Window, With<PrimaryWindow>>,
    camera: Single<(&Camera, &GlobalTransform), With<Camera3d>>,
    mut session: ResMut<Session>,
    mut cursor: ResMut<CurrentCursor>,
) {
    let (camera, camera_transform) = *camera;
    let Some(ray) = cursor_ray(&window, camera, camera_transform) else {
        cursor.set_if_neq(CurrentCursor::default());
        return;
    };

    let hovered = session.handle_hover(ray);
    cursor.set_if_neq(CurrentCursor::for_hover(hovered.is_some()));

    if !actions.just_pressed(&InputAction::Select) {
        return;
    }
    match session.handle_click(ray) {
        ClickOutcome::Ignored => {}
        outcome => info!("Click: {outcome:?}"),
    }
}
