//! First-person camera
//!
//! The eye sits exactly at the simulated player position.

use bevy::prelude::*;
use world::WorldState;

/// Marker for the player's eye camera
#[derive(Component)]
pub struct PlayerCamera;

/// Update camera to follow the player
pub fn update_camera(
    world: Res<WorldState>,
    mut camera_query: Query<&mut Transform, With<PlayerCamera>>,
) {
    let Ok(mut camera_transform) = camera_query.single_mut() else {
        return;
    };

    let player = world.player();
    camera_transform.translation = player.position;
    camera_transform.rotation = player.rotation();
}
