//! Regular heightfield lattice for one chunk.
//!
//! Sample `(i, j)` sits at `i/N` along X and `j/N` along Z of the chunk, in
//! chunk-local coordinates centred on the chunk origin. Boundary samples are
//! computed from the shared noise input only, so two neighbouring chunks agree
//! on their common edge without any stitching.

use bevy::prelude::*;
use rand::Rng;

use crate::chunk::GridCoord;
use crate::noise_field::HeightSource;

pub struct HeightField {
    subdivisions: usize,
    size: f32,
    positions: Vec<Vec3>,
}

impl HeightField {
    /// Sample the height source over the lattice of `coord`.
    pub fn sample(
        coord: GridCoord,
        size: f32,
        subdivisions: usize,
        height_divisor: f32,
        source: &dyn HeightSource,
    ) -> Self {
        let n = subdivisions;
        let half = size / 2.0;
        let amplitude = size / height_divisor;
        let mut positions = Vec::with_capacity((n + 1) * (n + 1));

        for i in 0..=n {
            for j in 0..=n {
                let u = i as f32 / n as f32;
                let v = j as f32 / n as f32;
                let height = source.height(coord.x as f32 + u, coord.z as f32 + v);
                positions.push(Vec3::new(u * size - half, height * amplitude, v * size - half));
            }
        }

        Self {
            subdivisions,
            size,
            positions,
        }
    }

    pub fn subdivisions(&self) -> usize {
        self.subdivisions
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Row-major lattice index: `j + i * (N + 1)`.
    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        j + i * (self.subdivisions + 1)
    }

    #[inline]
    pub fn position(&self, i: usize, j: usize) -> Vec3 {
        self.positions[self.index(i, j)]
    }

    #[inline]
    pub fn is_boundary(&self, i: usize, j: usize) -> bool {
        let n = self.subdivisions;
        i == 0 || j == 0 || i == n || j == n
    }

    /// Lattice parameterisation of a sample, used as its texture coordinate.
    #[inline]
    pub fn uv(&self, index: usize) -> [f32; 2] {
        let stride = self.subdivisions + 1;
        let i = index / stride;
        let j = index % stride;
        let n = self.subdivisions as f32;
        [i as f32 / n, j as f32 / n]
    }

    /// Two triangles per quad, `(a, b, d)` and `(d, c, a)`, winding upward.
    pub fn triangle_indices(&self) -> Vec<u32> {
        let n = self.subdivisions;
        let mut indices = Vec::with_capacity(n * n * 6);
        for i in 0..n {
            for j in 0..n {
                let a = self.index(i, j) as u32;
                let b = self.index(i, j + 1) as u32;
                let c = self.index(i + 1, j) as u32;
                let d = self.index(i + 1, j + 1) as u32;
                indices.extend_from_slice(&[a, b, d, d, c, a]);
            }
        }
        indices
    }

    /// Smooth vertex normals, area weighted (un-normalised face normals are summed).
    pub fn vertex_normals(&self, indices: &[u32]) -> Vec<Vec3> {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for tri in indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let face = (self.positions[b] - self.positions[a])
                .cross(self.positions[c] - self.positions[a]);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }
        normals
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
            .collect()
    }

    /// Randomly perturb interior samples, keeping them inside the footprint.
    ///
    /// Planar offsets are in `[-S/200, S/200)`, the vertical lift in `[0, S/1000)`.
    /// Boundary samples are left untouched.
    pub fn jitter_interior(&mut self, rng: &mut impl Rng) {
        let n = self.subdivisions;
        let size = self.size;
        let half = size / 2.0;
        for i in 0..=n {
            for j in 0..=n {
                if self.is_boundary(i, j) {
                    continue;
                }
                let idx = self.index(i, j);
                let p = &mut self.positions[idx];
                p.x += rng.gen::<f32>() * size / 100.0 - size / 200.0;
                p.y += rng.gen::<f32>() * size / 1000.0;
                p.z += rng.gen::<f32>() * size / 100.0 - size / 200.0;
                p.x = p.x.clamp(-half, half);
                p.z = p.z.clamp(-half, half);
            }
        }
    }
}
