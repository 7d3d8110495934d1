//! Prop visuals
//!
//! Every prop starts as a primitive stand-in (cuboid, sphere or cylinder) and
//! is swapped for its archetype's glTF scene once that has loaded. A model
//! that fails to load is reported once and the primitive stays. Primitives
//! may carry a texture, and standalone scenery models are spawned once.

use bevy::asset::RecursiveDependencyLoadState;
use bevy::prelude::*;
use world::{PropShape, WorldState};

use crate::terrain::TerrainChunk;

/// Marker for a prop entity (child of its chunk)
#[derive(Component)]
pub struct PropVisual {
    pub archetype: usize,
}

/// Marker added once the glTF model has replaced the primitive
#[derive(Component)]
pub struct ModelAttached;

/// Render handles for one archetype
pub struct ArchetypeAssets {
    pub name: String,
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
    pub model: Option<Handle<Scene>>,
    pub model_scale: f32,
    pub texture: Option<Handle<Image>>,
    /// Model load failure already logged.
    pub failed: bool,
    pub texture_failed: bool,
}

/// Handles to prop assets, indexed like the configured archetype list
#[derive(Resource)]
pub struct PropAssets {
    pub archetypes: Vec<ArchetypeAssets>,
}

/// Plugin for prop visuals
pub struct PropsPlugin;

impl Plugin for PropsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (load_prop_assets, spawn_scenery));
        app.add_systems(
            Update,
            (spawn_chunk_props, attach_loaded_models, warn_failed_prop_textures).chain(),
        );
        app.add_systems(Update, warn_failed_scenery);
    }
}

/// Build primitive meshes and start loading models at startup
fn load_prop_assets(
    mut commands: Commands,
    world: Res<WorldState>,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let archetypes = world
        .config()
        .props
        .archetypes
        .iter()
        .map(|def| {
            let mesh = match def.shape {
                PropShape::Box { size } => meshes.add(Cuboid::new(size, size, size)),
                PropShape::Sphere { radius } => meshes.add(Sphere::new(radius)),
                PropShape::Cylinder { radius, height } => meshes.add(Cylinder::new(radius, height)),
            };
            let [r, g, b] = def.color;
            let texture: Option<Handle<Image>> =
                def.texture.as_ref().map(|path| asset_server.load(path.clone()));
            let material = materials.add(StandardMaterial {
                base_color: Color::srgb(r, g, b),
                base_color_texture: texture.clone(),
                perceptual_roughness: 0.8,
                ..default()
            });
            let model = def
                .model
                .as_ref()
                .map(|path| asset_server.load(format!("{path}#Scene0")));
            ArchetypeAssets {
                name: def.name.clone(),
                mesh,
                material,
                model,
                model_scale: def.model_scale,
                texture,
                failed: false,
                texture_failed: false,
            }
        })
        .collect();

    commands.insert_resource(PropAssets { archetypes });
}

/// Spawn the props of newly spawned chunks as children of the chunk entity
fn spawn_chunk_props(
    mut commands: Commands,
    world: Res<WorldState>,
    prop_assets: Res<PropAssets>,
    new_chunks: Query<(Entity, &TerrainChunk), Added<TerrainChunk>>,
) {
    for (chunk_entity, terrain_chunk) in &new_chunks {
        let Some(chunk) = world.cache().get(terrain_chunk.coord) else {
            continue;
        };

        for prop in &chunk.props {
            let Some(assets) = prop_assets.archetypes.get(prop.archetype) else {
                continue;
            };
            let prop_entity = commands
                .spawn((
                    PropVisual {
                        archetype: prop.archetype,
                    },
                    Mesh3d(assets.mesh.clone()),
                    MeshMaterial3d(assets.material.clone()),
                    Transform::from_translation(prop.local),
                ))
                .id();
            commands.entity(chunk_entity).add_child(prop_entity);
        }
    }
}

/// Swap primitives for glTF scenes whose load has finished
fn attach_loaded_models(
    mut commands: Commands,
    mut prop_assets: ResMut<PropAssets>,
    asset_server: Res<AssetServer>,
    mut props: Query<(Entity, &PropVisual, &mut Transform), Without<ModelAttached>>,
) {
    let mut ready = vec![false; prop_assets.archetypes.len()];
    for (i, assets) in prop_assets.archetypes.iter_mut().enumerate() {
        let Some(model) = &assets.model else {
            continue;
        };
        match asset_server.get_recursive_dependency_load_state(model) {
            Some(RecursiveDependencyLoadState::Loaded) => ready[i] = true,
            Some(RecursiveDependencyLoadState::Failed(e)) if !assets.failed => {
                warn!("Failed to load model for prop '{}': {}", assets.name, e);
                assets.failed = true;
            }
            _ => {}
        }
    }

    for (entity, visual, mut transform) in &mut props {
        if !ready.get(visual.archetype).copied().unwrap_or(false) {
            continue;
        }
        let assets = &prop_assets.archetypes[visual.archetype];
        let Some(model) = &assets.model else {
            continue;
        };
        transform.scale = Vec3::splat(assets.model_scale);
        commands
            .entity(entity)
            .remove::<(Mesh3d, MeshMaterial3d<StandardMaterial>)>()
            .insert((SceneRoot(model.clone()), ModelAttached));
    }
}

/// Report prop textures that failed to load; the primitive keeps its colour.
fn warn_failed_prop_textures(mut prop_assets: ResMut<PropAssets>, asset_server: Res<AssetServer>) {
    for assets in prop_assets.archetypes.iter_mut() {
        if assets.texture_failed {
            continue;
        }
        let Some(texture) = &assets.texture else {
            continue;
        };
        if let Some(RecursiveDependencyLoadState::Failed(e)) =
            asset_server.get_recursive_dependency_load_state(texture)
        {
            warn!("Failed to load texture for prop '{}': {}", assets.name, e);
            assets.texture_failed = true;
        }
    }
}

/// A standalone model from the configured scenery list
#[derive(Component)]
pub struct Scenery {
    pub path: String,
    pub handle: Handle<Scene>,
    /// Load failure already logged.
    pub failed: bool,
}

/// Spawn scenery models; each shows up whenever its scene finishes loading.
fn spawn_scenery(mut commands: Commands, world: Res<WorldState>, asset_server: Res<AssetServer>) {
    for model in &world.config().scenery {
        let handle: Handle<Scene> = asset_server.load(format!("{}#Scene0", model.path));
        commands.spawn((
            Scenery {
                path: model.path.clone(),
                handle: handle.clone(),
                failed: false,
            },
            SceneRoot(handle),
            model.transform(),
        ));
        info!("Placed scenery model {}", model.path);
    }
}

fn warn_failed_scenery(mut scenery: Query<&mut Scenery>, asset_server: Res<AssetServer>) {
    for mut model in &mut scenery {
        if model.failed {
            continue;
        }
        if let Some(RecursiveDependencyLoadState::Failed(e)) =
            asset_server.get_recursive_dependency_load_state(&model.handle)
        {
            warn!("Failed to load scenery model {}: {}", model.path, e);
            model.failed = true;
        }
    }
}
