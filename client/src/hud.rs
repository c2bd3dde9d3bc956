//! Screen overlays: loading percentage, the controls hint and the enter/exit
//! shop prompt.

use bevy::prelude::*;
use shopfront::{FrameReport, PromptLabel};

use crate::simulation::{LatestFrame, Session};

#[derive(Component)]
struct LoadingOverlay;

#[derive(Component)]
struct LoadingText;

#[derive(Component)]
struct ControlsHint;

#[derive(Component)]
struct ShopPromptButton;

#[derive(Component)]
struct ShopPromptText;

const PROMPT_IDLE: Color = Color::srgb(0.16, 0.14, 0.12);
const PROMPT_HOVERED: Color = Color::srgb(0.3, 0.26, 0.2);
const PROMPT_PRESSED: Color = Color::srgb(0.45, 0.36, 0.22);

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, spawn_hud);
    app.add_systems(
        Update,
        (
            update_loading,
            update_hint,
            update_prompt,
            prompt_button_interaction,
        ),
    );
}

fn prompt_text(label: PromptLabel) -> &'static str {
    match label {
        PromptLabel::Enter => "Enter shop",
        PromptLabel::Exit => "Exit shop",
    }
}

fn shown(visible: bool) -> Visibility {
    if visible {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    }
}

fn spawn_hud(mut commands: Commands) {
    commands
        .spawn((
            LoadingOverlay,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(Color::srgb(0.08, 0.07, 0.06)),
            GlobalZIndex(10),
        ))
        .with_child((
            LoadingText,
            Text::new("Loading 0%"),
            TextFont::from_font_size(28.0),
            TextColor(Color::WHITE),
        ));

    commands.spawn((
        ControlsHint,
        Text::new("Space: accelerate    Backspace: reverse    E: enter or exit a shop"),
        TextFont::from_font_size(16.0),
        TextColor(Color::srgba(1.0, 1.0, 1.0, 0.85)),
        Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(16.0),
            left: Val::Px(16.0),
            ..default()
        },
    ));

    commands
        .spawn((
            ShopPromptButton,
            Button,
            Node {
                position_type: PositionType::Absolute,
                bottom: Val::Px(48.0),
                left: Val::Percent(50.0),
                padding: UiRect::axes(Val::Px(18.0), Val::Px(10.0)),
                border: UiRect::all(Val::Px(2.0)),
                ..default()
            },
            BorderColor::all(Color::srgb(0.85, 0.7, 0.4)),
            BackgroundColor(PROMPT_IDLE),
            Visibility::Hidden,
        ))
        .with_child((
            ShopPromptText,
            Text::new(prompt_text(PromptLabel::Enter)),
            TextFont::from_font_size(20.0),
            TextColor(Color::WHITE),
        ));
}

fn update_loading(
    latest: Res<LatestFrame>,
    mut overlay: Single<&mut Visibility, With<LoadingOverlay>>,
    mut text: Single<&mut Text, With<LoadingText>>,
) {
    let Some(FrameReport { progress, .. }) = latest.0.as_ref() else {
        return;
    };
    text.0 = format!("Loading {progress}%");
    overlay.set_if_neq(shown(*progress < 100));
}

fn update_hint(latest: Res<LatestFrame>, mut hint: Single<&mut Visibility, With<ControlsHint>>) {
    let hidden = latest.0.as_ref().is_some_and(|r| r.hint_hidden);
    hint.set_if_neq(shown(!hidden));
}

fn update_prompt(
    latest: Res<LatestFrame>,
    mut button: Single<&mut Visibility, With<ShopPromptButton>>,
    mut text: Single<&mut Text, With<ShopPromptText>>,
) {
    let Some(report) = latest.0.as_ref() else {
        return;
    };
    button.set_if_neq(shown(report.prompt.visible));
    let label = prompt_text(report.prompt.label);
    if text.0 != label {
        text.0 = label.to_string();
    }
}

fn prompt_button_interaction(
    mut q: Query<
        (&Interaction, &mut BackgroundColor),
        (Changed<Interaction>, With<Button>, With<ShopPromptButton>),
    >,
    mut session: ResMut<Session>,
) {
    for (interaction, mut bg) in &mut q {
        match *interaction {
            Interaction::Pressed => {
                if session.toggle_shop() {
                    info!("Shop prompt pressed");
                }
                *bg = BackgroundColor(PROMPT_PRESSED);
            }
            Interaction::Hovered => *bg = BackgroundColor(PROMPT_HOVERED),
            Interaction::None => *bg = BackgroundColor(PROMPT_IDLE),
        }
    }
}
