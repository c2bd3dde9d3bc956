use bevy::{
    prelude::*,
    window::{
        CursorEntered, CursorIcon, PrimaryWindow, SystemCursorIcon, WindowFocused, WindowResized,
    },
};

/// Pointer shape the scene wants: a hand over pickable containers.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CurrentCursor {
    #[default]
    Default,
    Pick,
}

impl CurrentCursor {
    pub fn for_hover(over_pickable: bool) -> Self {
        if over_pickable {
            Self::Pick
        } else {
            Self::Default
        }
    }

    fn icon(self) -> CursorIcon {
        match self {
            Self::Default => SystemCursorIcon::Default.into(),
            Self::Pick => SystemCursorIcon::Pointer.into(),
        }
    }
}

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<CurrentCursor>();

    // Apply when our desired cursor changes
    app.add_systems(
        Update,
        apply_cursor.run_if(resource_changed::<CurrentCursor>),
    );

    // Re-apply on focus/enter to avoid OS/browser resets
    app.add_systems(
        Update,
        (reapply_on_focus, reapply_on_enter, reapply_on_resize),
    );
}

fn apply_cursor(
    mut commands: Commands,
    window: Single<(Entity, Option<&CursorIcon>), With<PrimaryWindow>>,
    current: Res<CurrentCursor>,
) {
    let (entity, existing) = *window;
    let desired = current.icon();
    // Only insert if missing or different
    if existing != Some(&desired) {
        commands.entity(entity).insert(desired);
    }
}

fn reapply_on_focus(
    mut commands: Commands,
    mut messages: MessageReader<WindowFocused>,
    window: Single<Entity, With<PrimaryWindow>>,
    current: Res<CurrentCursor>,
) {
    for message in messages.read() {
        if message.focused {
            commands.entity(*window).insert(current.icon());
        }
    }
}

fn reapply_on_resize(
    mut commands: Commands,
    mut messages: MessageReader<WindowResized>,
    window: Single<Entity, With<PrimaryWindow>>,
    current: Res<CurrentCursor>,
) {
    for _ in messages.read() {
        commands.entity(*window).insert(current.icon());
    }
}

fn reapply_on_enter(
    mut commands: Commands,
    mut messages: MessageReader<CursorEntered>,
    window: Single<Entity, With<PrimaryWindow>>,
    current: Res<CurrentCursor>,
) {
    for _ in messages.read() {
        commands.entity(*window).insert(current.icon());
    }
}
