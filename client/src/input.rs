//! Player input handling
//!
//! Updated for Bevy 0.17

use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use world::{MoveIntent, WorldState};

/// Mouse sensitivity for look (radians per pixel)
const MOUSE_SENSITIVITY: f32 = 0.002;

/// Held movement keys -> movement intent
pub fn handle_keyboard_input(keyboard: Res<ButtonInput<KeyCode>>, mut world: ResMut<WorldState>) {
    let held = |a: KeyCode, b: KeyCode| keyboard.pressed(a) || keyboard.pressed(b);
    let intent = MoveIntent {
        forward: held(KeyCode::KeyW, KeyCode::ArrowUp),
        backward: held(KeyCode::KeyS, KeyCode::ArrowDown),
        left: held(KeyCode::KeyA, KeyCode::ArrowLeft),
        right: held(KeyCode::KeyD, KeyCode::ArrowRight),
    };
    world.set_intent(intent);
}

/// Mouse motion -> yaw/pitch
pub fn handle_mouse_input(mut mouse_motion: MessageReader<MouseMotion>, mut world: ResMut<WorldState>) {
    let mut delta = Vec2::ZERO;
    for motion in mouse_motion.read() {
        delta += motion.delta;
    }

    if delta != Vec2::ZERO {
        let player = world.player();
        let yaw = player.yaw - delta.x * MOUSE_SENSITIVITY;
        let pitch = player.pitch - delta.y * MOUSE_SENSITIVITY;
        world.set_look(yaw, pitch);
    }
}

/// Space press -> jump (edge triggered; holding does nothing more)
pub fn handle_jump(keyboard: Res<ButtonInput<KeyCode>>, mut world: ResMut<WorldState>) {
    if keyboard.just_pressed(KeyCode::Space) && world.jump() {
        debug!("Jump");
    }
}
