//! Chunk mesh builder
//!
//! Heightfield lattice -> indexed triangles -> smooth normals -> interior
//! jitter -> flat triangle soup with a painted surface and a BVH for ray queries.

use bevy::prelude::*;
use rand::Rng;

use crate::bvh::TriangleBvh;
use crate::chunk::GridCoord;
use crate::config::{SurfaceStyle, WorldConfig};
use crate::heightfield::HeightField;
use crate::noise_field::HeightSource;
use crate::ray::{Hittable, Ray, RayHit};

/// How a chunk's surface should be drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfacePaint {
    /// Linear RGBA per soup vertex.
    VertexColors(Vec<[f32; 4]>),
    /// Index into the configured texture list.
    Texture(usize),
}

/// Terrain mesh for one chunk, in chunk-local coordinates.
///
/// Every triangle owns its three vertices, so per-vertex paint never bleeds
/// across faces.
pub struct ChunkMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub paint: SurfacePaint,
    bvh: TriangleBvh,
}

impl ChunkMesh {
    pub fn build(
        coord: GridCoord,
        config: &WorldConfig,
        source: &dyn HeightSource,
        rng: &mut impl Rng,
    ) -> Self {
        let mut field = HeightField::sample(
            coord,
            config.floor_size,
            config.subdivisions,
            config.height_divisor,
            source,
        );
        let indices = field.triangle_indices();
        let normals = field.vertex_normals(&indices);
        field.jitter_interior(rng);

        let mut soup = Vec::with_capacity(indices.len());
        let mut positions = Vec::with_capacity(indices.len());
        let mut soup_normals = Vec::with_capacity(indices.len());
        let mut uvs = Vec::with_capacity(indices.len());
        for &index in &indices {
            let index = index as usize;
            let p = field.positions()[index];
            soup.push(p);
            positions.push(p.to_array());
            soup_normals.push(normals[index].to_array());
            uvs.push(field.uv(index));
        }

        let paint = paint_surface(&config.surface, positions.len(), rng);
        let bvh = TriangleBvh::build(&soup);

        Self {
            positions,
            normals: soup_normals,
            uvs,
            paint,
            bvh,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.bvh.triangle_count()
    }

    pub fn bvh(&self) -> &TriangleBvh {
        &self.bvh
    }
}

/// Ray queries in chunk-local space.
impl Hittable for ChunkMesh {
    fn intersect(&self, ray: &Ray) -> Option<RayHit> {
        self.bvh.cast_nearest(ray)
    }

    fn intersect_all(&self, ray: &Ray, out: &mut Vec<RayHit>) {
        self.bvh.cast_all(ray, out);
    }
}

fn paint_surface(style: &SurfaceStyle, vertex_count: usize, rng: &mut impl Rng) -> SurfacePaint {
    match style {
        SurfaceStyle::PastelColors {
            hue_min,
            hue_span,
            saturation,
            lightness_min,
            lightness_span,
        } => {
            let colors = (0..vertex_count)
                .map(|_| {
                    let hue = (hue_min + rng.gen::<f32>() * hue_span).rem_euclid(1.0) * 360.0;
                    let lightness = (lightness_min + rng.gen::<f32>() * lightness_span).min(1.0);
                    let c = LinearRgba::from(Color::hsl(hue, *saturation, lightness));
                    [c.red, c.green, c.blue, c.alpha]
                })
                .collect();
            SurfacePaint::VertexColors(colors)
        }
        SurfaceStyle::Textures { paths } => {
            SurfacePaint::Texture(rng.gen_range(0..paths.len().max(1)))
        }
    }
}
