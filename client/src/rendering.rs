//! Rendering setup
//!
//! Sky clear colour, distance fog, lights and the eye camera.

use bevy::pbr::{DistanceFog, FogFalloff};
use bevy::prelude::*;
use bevy::window::WindowResized;
use world::WorldState;

use crate::camera::PlayerCamera;

/// Sky colour (#87CEEB), also used for the fog.
const SKY_COLOR: Color = Color::srgb(0.529, 0.808, 0.922);

const FOG_START: f32 = 0.0;
const FOG_END: f32 = 750.0;

const CAMERA_FOV_DEGREES: f32 = 75.0;
const CAMERA_NEAR: f32 = 1.0;
const CAMERA_FAR: f32 = 1000.0;

pub struct RenderingPlugin;

impl Plugin for RenderingPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(SKY_COLOR));
        app.add_systems(Startup, setup_rendering);
        app.add_systems(Update, log_window_resize);
    }
}

/// One-time rendering setup.
pub fn setup_rendering(mut commands: Commands, world: Res<WorldState>) {
    // Sky-tinted fill light standing in for a hemisphere light.
    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.933, 0.933, 1.0),
        brightness: 600.0,
        ..default()
    });

    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(0.5, 1.0, 0.75).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let player = world.player();
    commands.spawn((
        PlayerCamera,
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: CAMERA_FOV_DEGREES.to_radians(),
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
            ..default()
        }),
        DistanceFog {
            color: SKY_COLOR,
            falloff: FogFalloff::Linear {
                start: FOG_START,
                end: FOG_END,
            },
            ..default()
        },
        Transform::from_translation(player.position).with_rotation(player.rotation()),
    ));

    info!("Rendering initialized");
}

/// Bevy resizes the surface and camera aspect itself; we only note it.
fn log_window_resize(mut resized: MessageReader<WindowResized>) {
    for event in resized.read() {
        debug!("Window resized to {}x{}", event.width, event.height);
    }
}
