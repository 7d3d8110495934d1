//! Terrain Explorer - walk an endless procedural landscape
//!
//! Updated for Bevy 0.17

mod camera;
mod input;
mod props;
mod rendering;
mod states;
mod terrain;

use std::path::{Path, PathBuf};

use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::window::WindowResolution;
use states::ExploreState;
use world::{WorldConfig, WorldState};

/// Configuration file, relative to the asset folder.
const CONFIG_FILE: &str = "explorer.ron";

/// Get the asset path - for bundled macOS apps, use path relative to executable
fn get_asset_path() -> String {
    // Try to find assets relative to executable (for .app bundles)
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let bundled_assets = exe_dir.join("assets");
            if bundled_assets.exists() {
                info!("Using bundled assets at: {:?}", bundled_assets);
                return bundled_assets.to_string_lossy().to_string();
            }
        }
    }
    // Fall back to default "assets" folder (for development)
    "assets".to_string()
}

/// Config file location. `cargo run` resolves assets next to this crate,
/// so fall back there when the working directory has none.
fn config_path(asset_path: &str) -> PathBuf {
    let direct = Path::new(asset_path).join(CONFIG_FILE);
    if direct.exists() {
        return direct;
    }
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join(asset_path)
        .join(CONFIG_FILE)
}

/// Read the world configuration, falling back to defaults on any error.
fn load_config(asset_path: &str) -> WorldConfig {
    let path = config_path(asset_path);
    match WorldConfig::load_from_file(&path) {
        Ok(config) => {
            info!("Loaded configuration from {:?}", path);
            config
        }
        Err(e) => {
            warn!("Using default configuration: {}", e);
            WorldConfig::default()
        }
    }
}

fn main() {
    let asset_path = get_asset_path();

    let mut app = App::new();

    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Terrain Explorer".to_string(),
                    resolution: WindowResolution::new(1280, 720),
                    ..default()
                }),
                ..default()
            })
            .set(AssetPlugin {
                file_path: asset_path.clone(),
                ..default()
            }),
    );

    // Logging is up once DefaultPlugins are built.
    let config = load_config(&asset_path);
    app.insert_resource(WorldState::new(config));

    app.init_state::<ExploreState>();

    app.add_plugins(rendering::RenderingPlugin);
    app.add_plugins(states::CursorLockPlugin);
    app.add_plugins(terrain::TerrainPlugin);
    app.add_plugins(props::PropsPlugin);

    // Input and simulation only while the cursor is locked.
    // ORDER MATTERS: input -> simulation -> camera.
    app.add_systems(
        Update,
        (
            input::handle_keyboard_input,
            input::handle_mouse_input,
            input::handle_jump,
            terrain::tick_world,
        )
            .chain()
            .run_if(in_state(ExploreState::Exploring)),
    );
    app.add_systems(
        Update,
        camera::update_camera.after(terrain::tick_world),
    );

    app.run();
}
