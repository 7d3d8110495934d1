//! Chunk coordinates, chunk contents and the chunk generator

use std::time::Instant;

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::WorldConfig;
use crate::mesh::ChunkMesh;
use crate::noise_field::{HeightSource, NoiseField};
use crate::props::{place_props, Prop};
use crate::ray::{Hittable, Ray, RayHit};

/// Chunk coordinate in the world grid.
///
/// Chunk `(x, z)` is centred on world `(x * S, 0, z * S)` where `S` is the
/// configured floor size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct GridCoord {
    pub x: i32,
    pub z: i32,
}

impl GridCoord {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing a world position. Halfway points round up.
    pub fn from_world_pos(pos: Vec3, size: f32) -> Self {
        Self {
            x: (pos.x / size + 0.5).floor() as i32,
            z: (pos.z / size + 0.5).floor() as i32,
        }
    }

    /// World position of the chunk centre.
    pub fn origin(&self, size: f32) -> Vec3 {
        Vec3::new(self.x as f32 * size, 0.0, self.z as f32 * size)
    }

    /// This chunk and every chunk within `radius` (Chebyshev), row by row.
    pub fn neighborhood(&self, radius: i32) -> Vec<GridCoord> {
        let mut coords = Vec::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                coords.push(GridCoord::new(self.x + dx, self.z + dz));
            }
        }
        coords
    }

    pub fn chebyshev_distance(&self, other: GridCoord) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }
}

impl std::fmt::Display for GridCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// One generated terrain cell and the props standing on it.
///
/// Immutable once built; shared as `Arc<Chunk>`.
pub struct Chunk {
    pub coord: GridCoord,
    /// World position of the chunk centre; mesh and props are relative to it.
    pub origin: Vec3,
    pub mesh: ChunkMesh,
    pub props: Vec<Prop>,
}

/// Terrain ray queries in world space.
impl Hittable for Chunk {
    fn intersect(&self, ray: &Ray) -> Option<RayHit> {
        self.mesh
            .intersect(&ray.translated(-self.origin))
            .map(|hit| hit.translated(self.origin))
    }

    fn intersect_all(&self, ray: &Ray, out: &mut Vec<RayHit>) {
        let start = out.len();
        self.mesh.intersect_all(&ray.translated(-self.origin), out);
        for hit in &mut out[start..] {
            *hit = hit.translated(self.origin);
        }
    }
}

/// Builds chunks from a height source. Immutable and shareable across threads.
pub struct ChunkGenerator {
    config: WorldConfig,
    source: Box<dyn HeightSource>,
    seed: u32,
}

impl ChunkGenerator {
    /// Generator over seeded simplex noise.
    pub fn new(config: WorldConfig, seed: u32) -> Self {
        Self::with_source(config, seed, Box::new(NoiseField::new(seed)))
    }

    pub fn with_source(config: WorldConfig, seed: u32, source: Box<dyn HeightSource>) -> Self {
        Self {
            config,
            source,
            seed,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn height_source(&self) -> &dyn HeightSource {
        self.source.as_ref()
    }

    /// Build the mesh and place the props of one chunk.
    ///
    /// The same seed and coordinate always give the same chunk.
    pub fn generate(&self, coord: GridCoord) -> Chunk {
        let started = Instant::now();
        let mut rng = StdRng::seed_from_u64(chunk_seed(self.seed, coord));
        let origin = coord.origin(self.config.floor_size);

        let mesh = ChunkMesh::build(coord, &self.config, self.source.as_ref(), &mut rng);
        let props = place_props(coord, origin, &mesh, &self.config, &mut rng);

        debug!(
            "Generated chunk {} ({} triangles, {} props) in {:.1}ms",
            coord,
            mesh.triangle_count(),
            props.len(),
            started.elapsed().as_secs_f32() * 1000.0
        );

        Chunk {
            coord,
            origin,
            mesh,
            props,
        }
    }
}

/// Per-chunk RNG seed derived from the world seed and the coordinate.
fn chunk_seed(seed: u32, coord: GridCoord) -> u64 {
    let mut h = (seed as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    h ^= (coord.x as u32 as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h = h.rotate_left(31);
    h ^= (coord.z as u32 as u64).wrapping_mul(0x94D0_49BB_1331_11EB);
    h ^ (h >> 29)
}
