//! Explore state machine and pointer-lock style cursor handling
//!
//! Left click locks the cursor and starts exploring. Escape releases it and
//! shows the instructions overlay again.

use bevy::prelude::*;
use bevy::window::{CursorGrabMode, CursorOptions, PrimaryWindow};

#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExploreState {
    /// Cursor free, simulation frozen, instructions visible.
    #[default]
    Paused,
    Exploring,
}

/// Marker for the instructions overlay root
#[derive(Component)]
pub struct InstructionsOverlay;

pub struct CursorLockPlugin;

impl Plugin for CursorLockPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_instructions);
        app.add_systems(Update, (lock_cursor_on_click, release_cursor_on_escape));
        app.add_systems(OnEnter(ExploreState::Exploring), hide_instructions);
        app.add_systems(OnEnter(ExploreState::Paused), show_instructions);
    }
}

fn spawn_instructions(mut commands: Commands) {
    commands
        .spawn((
            InstructionsOverlay,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                row_gap: Val::Px(12.0),
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.5)),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("Click to play"),
                TextFont {
                    font_size: 36.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));
            parent.spawn((
                Text::new("Move: WASD / Arrows    Jump: Space    Look: Mouse    Release: Esc"),
                TextFont {
                    font_size: 18.0,
                    ..default()
                },
                TextColor(Color::srgb(0.9, 0.9, 0.9)),
            ));
        });
}

fn set_cursor(cursor: &mut CursorOptions, locked: bool) {
    if locked {
        cursor.grab_mode = CursorGrabMode::Locked;
        cursor.visible = false;
    } else {
        cursor.grab_mode = CursorGrabMode::None;
        cursor.visible = true;
    }
}

/// Lock the cursor on left click
fn lock_cursor_on_click(
    windows: Query<Entity, With<PrimaryWindow>>,
    mut cursor_opts: Query<&mut CursorOptions>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    state: Res<State<ExploreState>>,
    mut next_state: ResMut<NextState<ExploreState>>,
) {
    if !mouse_button.just_pressed(MouseButton::Left) || *state.get() == ExploreState::Exploring {
        return;
    }
    let Ok(window_entity) = windows.single() else {
        return;
    };
    if let Ok(mut cursor) = cursor_opts.get_mut(window_entity) {
        set_cursor(&mut cursor, true);
    }
    next_state.set(ExploreState::Exploring);
}

/// Release the cursor on Escape
fn release_cursor_on_escape(
    windows: Query<Entity, With<PrimaryWindow>>,
    mut cursor_opts: Query<&mut CursorOptions>,
    keyboard: Res<ButtonInput<KeyCode>>,
    state: Res<State<ExploreState>>,
    mut next_state: ResMut<NextState<ExploreState>>,
) {
    if !keyboard.just_pressed(KeyCode::Escape) || *state.get() == ExploreState::Paused {
        return;
    }
    let Ok(window_entity) = windows.single() else {
        return;
    };
    if let Ok(mut cursor) = cursor_opts.get_mut(window_entity) {
        set_cursor(&mut cursor, false);
    }
    next_state.set(ExploreState::Paused);
}

fn hide_instructions(mut overlay: Query<&mut Visibility, With<InstructionsOverlay>>) {
    for mut visibility in &mut overlay {
        *visibility = Visibility::Hidden;
    }
}

fn show_instructions(mut overlay: Query<&mut Visibility, With<InstructionsOverlay>>) {
    for mut visibility in &mut overlay {
        *visibility = Visibility::Visible;
    }
}
