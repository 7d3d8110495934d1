//! Procedural terrain world: noise-driven heightfield chunks, prop placement,
//! ray queries, chunk streaming and the first-person player controller.
//!
//! Nothing in here renders or loads assets. The client crate turns the data
//! produced here into Bevy meshes and scenes.

pub mod bvh;
pub mod cache;
pub mod chunk;
pub mod collision;
pub mod config;
pub mod heightfield;
pub mod mesh;
pub mod noise_field;
pub mod player;
pub mod props;
pub mod ray;
pub mod state;
pub mod streaming;

pub use cache::{ChunkCache, ChunkState};
pub use chunk::{Chunk, ChunkGenerator, GridCoord};
pub use collision::{Collider, ColliderId, CollisionList, CollisionSet};
pub use config::{
    PlayerTuning, ProbeMode, PropArchetype, PropPlacement, PropShape, SceneModel, SnapTarget,
    StreamingConfig, SurfaceStyle, WorldConfig,
};
pub use mesh::{ChunkMesh, SurfacePaint};
pub use noise_field::{FlatField, HeightSource, NoiseField};
pub use player::{MoveIntent, PlayerState};
pub use props::Prop;
pub use ray::{HitMode, Hittable, Ray, RayHit};
pub use state::WorldState;
pub use streaming::StreamReport;
