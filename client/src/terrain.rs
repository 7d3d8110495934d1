//! Client-side terrain: drives the world simulation and mirrors its chunk
//! cache into render entities.
//!
//! Updated for Bevy 0.17

use std::collections::HashMap;
use std::sync::Arc;

use bevy::asset::{RecursiveDependencyLoadState, RenderAssetUsages};
use bevy::mesh::VertexAttributeValues;
use bevy::prelude::*;
use bevy::render::render_resource::PrimitiveTopology;
use bevy::tasks::{block_on, futures_lite::future, AsyncComputeTaskPool, Task};
use world::{Chunk, ChunkMesh, ChunkState, GridCoord, SurfacePaint, SurfaceStyle, WorldState};

/// Marker component for terrain chunk entities
#[derive(Component)]
pub struct TerrainChunk {
    pub coord: GridCoord,
}

/// Chunk entities currently spawned, by coordinate
#[derive(Resource, Default)]
pub struct SpawnedChunks {
    pub entities: HashMap<GridCoord, Entity>,
}

/// Terrain materials, built once at startup
#[derive(Resource)]
pub struct TerrainMaterials {
    /// White base so per-vertex colours show through.
    pub vertex_colored: Handle<StandardMaterial>,
    pub textured: Vec<Handle<StandardMaterial>>,
    pub textures: Vec<(String, Handle<Image>)>,
}

/// An in-flight chunk generation task on the compute pool.
pub struct ChunkTask {
    pub coord: GridCoord,
    pub task: Task<Chunk>,
}

#[derive(Resource, Default)]
pub struct ChunkTasks {
    pub tasks: Vec<ChunkTask>,
}

/// Plugin for terrain streaming and rendering
pub struct TerrainPlugin;

impl Plugin for TerrainPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SpawnedChunks>();
        app.init_resource::<ChunkTasks>();
        app.add_systems(Startup, (setup_terrain_materials, bootstrap_world));
        app.add_systems(
            Update,
            (
                (queue_chunk_tasks, collect_chunk_tasks).run_if(background_generation),
                sync_chunk_entities,
            )
                .chain()
                .after(tick_world),
        );
        app.add_systems(Update, warn_failed_textures);
    }
}

fn background_generation(world: Res<WorldState>) -> bool {
    world.config().streaming.background
}

fn setup_terrain_materials(
    mut commands: Commands,
    world: Res<WorldState>,
    asset_server: Res<AssetServer>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let vertex_colored = materials.add(StandardMaterial {
        base_color: Color::WHITE,
        perceptual_roughness: 0.9,
        metallic: 0.0,
        ..default()
    });

    let mut textures = Vec::new();
    let mut textured = Vec::new();
    if let SurfaceStyle::Textures { paths } = &world.config().surface {
        for path in paths {
            let image: Handle<Image> = asset_server.load(path.clone());
            textured.push(materials.add(StandardMaterial {
                base_color_texture: Some(image.clone()),
                perceptual_roughness: 0.9,
                metallic: 0.0,
                ..default()
            }));
            textures.push((path.clone(), image));
        }
    }

    commands.insert_resource(TerrainMaterials {
        vertex_colored,
        textured,
        textures,
    });
}

/// Generate the spawn area before the first frame.
fn bootstrap_world(mut world: ResMut<WorldState>) {
    world.bootstrap();
}

/// Advance the player and stream chunks around it
pub fn tick_world(time: Res<Time>, mut world: ResMut<WorldState>) {
    let report = world.tick(time.delta_secs());
    if !report.is_empty() {
        debug!(
            "Streaming around {}: {} created, {} evicted",
            report.center,
            report.created.len(),
            report.evicted.len()
        );
    }
}

/// Start generation tasks for every absent chunk around the player
fn queue_chunk_tasks(mut world: ResMut<WorldState>, mut tasks: ResMut<ChunkTasks>) {
    let pool = AsyncComputeTaskPool::get();
    for coord in world.missing_chunks() {
        if !world.mark_pending(coord) {
            continue;
        }
        let generator = world.generator().clone();
        let task = pool.spawn(async move { generator.generate(coord) });
        tasks.tasks.push(ChunkTask { coord, task });
    }
}

/// Hand finished chunks to the world. Results for chunks evicted while they
/// were generating are dropped.
fn collect_chunk_tasks(mut world: ResMut<WorldState>, mut tasks: ResMut<ChunkTasks>) {
    tasks.tasks.retain_mut(|pending| {
        let Some(chunk) = block_on(future::poll_once(&mut pending.task)) else {
            return true;
        };
        if world.cache().state(pending.coord) == ChunkState::Pending {
            world.insert_chunk(Arc::new(chunk));
        } else {
            debug!("Dropping stale chunk {}", pending.coord);
        }
        false
    });
}

/// Spawn entities for new chunks and despawn the ones no longer cached
fn sync_chunk_entities(
    world: Res<WorldState>,
    mut spawned: ResMut<SpawnedChunks>,
    terrain_materials: Res<TerrainMaterials>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut commands: Commands,
) {
    spawned.entities.retain(|coord, entity| {
        if world.cache().contains(*coord) {
            return true;
        }
        commands.entity(*entity).despawn();
        false
    });

    for chunk in world.cache().chunks() {
        if spawned.entities.contains_key(&chunk.coord) {
            continue;
        }

        let material = match &chunk.mesh.paint {
            SurfacePaint::VertexColors(_) => terrain_materials.vertex_colored.clone(),
            SurfacePaint::Texture(index) => terrain_materials
                .textured
                .get(*index)
                .cloned()
                .unwrap_or_else(|| terrain_materials.vertex_colored.clone()),
        };

        let entity = commands
            .spawn((
                Mesh3d(meshes.add(build_render_mesh(&chunk.mesh))),
                MeshMaterial3d(material),
                Transform::from_translation(chunk.origin),
                TerrainChunk { coord: chunk.coord },
            ))
            .id();
        spawned.entities.insert(chunk.coord, entity);
    }
}

/// Triangle soup -> non-indexed render mesh
fn build_render_mesh(chunk_mesh: &ChunkMesh) -> Mesh {
    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );

    mesh.insert_attribute(
        Mesh::ATTRIBUTE_POSITION,
        VertexAttributeValues::Float32x3(chunk_mesh.positions.clone()),
    );
    mesh.insert_attribute(
        Mesh::ATTRIBUTE_NORMAL,
        VertexAttributeValues::Float32x3(chunk_mesh.normals.clone()),
    );
    mesh.insert_attribute(
        Mesh::ATTRIBUTE_UV_0,
        VertexAttributeValues::Float32x2(chunk_mesh.uvs.clone()),
    );
    if let SurfacePaint::VertexColors(colors) = &chunk_mesh.paint {
        mesh.insert_attribute(
            Mesh::ATTRIBUTE_COLOR,
            VertexAttributeValues::Float32x4(colors.clone()),
        );
    }
    mesh
}

/// Report texture load failures once; the chunk keeps its untextured material.
fn warn_failed_textures(
    terrain_materials: Option<Res<TerrainMaterials>>,
    asset_server: Res<AssetServer>,
    mut reported: Local<Vec<bool>>,
) {
    let Some(terrain_materials) = terrain_materials else {
        return;
    };
    reported.resize(terrain_materials.textures.len(), false);

    for (i, (path, handle)) in terrain_materials.textures.iter().enumerate() {
        if reported[i] {
            continue;
        }
        if let Some(RecursiveDependencyLoadState::Failed(e)) =
            asset_server.get_recursive_dependency_load_state(handle)
        {
            warn!("Failed to load terrain texture {}: {}", path, e);
            reported[i] = true;
        }
    }
}
