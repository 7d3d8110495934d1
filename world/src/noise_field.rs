//! Continuous 2D height function the terrain is sampled from.

use noise::{NoiseFn, Simplex};

/// Anything that can answer "how high is the ground at (x, z)".
///
/// Inputs are in chunk units (chunk `(cx, cz)` spans `cx..cx+1`), output is
/// roughly in [-1, 1] and scaled by the mesh builder.
pub trait HeightSource: Send + Sync {
    fn height(&self, x: f32, z: f32) -> f32;
}

/// Seeded simplex noise. Same seed and input always give the same height.
pub struct NoiseField {
    noise: Simplex,
    seed: u32,
}

impl NoiseField {
    pub fn new(seed: u32) -> Self {
        Self {
            noise: Simplex::new(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }
}

impl HeightSource for NoiseField {
    fn height(&self, x: f32, z: f32) -> f32 {
        self.noise.get([x as f64, z as f64]) as f32
    }
}

/// Constant height everywhere. Useful for tests and flat debug worlds.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatField(pub f32);

impl HeightSource for FlatField {
    fn height(&self, _x: f32, _z: f32) -> f32 {
        self.0
    }
}
