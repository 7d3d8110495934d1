//! World configuration
//!
//! Every tunable of the terrain, prop scatter, streaming and player physics
//! lives here. The client reads it from `assets/explorer.ron`; any field left
//! out of the file falls back to the default below.
//!
//! Scale: 1 unit is roughly 1 cm, so a chunk is 2000 units across and
//! gravity is 9.8 * 100.

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Top-level configuration for the world simulation.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Noise seed. `None` draws a fresh seed every run.
    pub seed: Option<u32>,
    /// Side length of one square chunk (world units).
    pub floor_size: f32,
    /// Lattice subdivisions per chunk side.
    pub subdivisions: usize,
    /// Terrain height is `noise * floor_size / height_divisor`.
    pub height_divisor: f32,
    pub surface: SurfaceStyle,
    pub props: PropPlacement,
    pub player: PlayerTuning,
    pub streaming: StreamingConfig,
    /// Which objects the player's ground probe collides with.
    pub collision: CollisionSet,
    /// Fixed glTF models placed once in the world, independent of chunks.
    pub scenery: Vec<SceneModel>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: None,
            floor_size: 2000.0,
            subdivisions: 100,
            height_divisor: 10.0,
            surface: SurfaceStyle::default(),
            props: PropPlacement::default(),
            player: PlayerTuning::default(),
            streaming: StreamingConfig::default(),
            collision: CollisionSet::default(),
            scenery: Vec::new(),
        }
    }
}

/// A standalone model. Purely visual, it takes no part in collisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneModel {
    /// glTF path relative to the asset folder.
    pub path: String,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default = "default_model_scale")]
    pub scale: f32,
    /// Rotation about +Y in radians.
    #[serde(default)]
    pub yaw: f32,
}

impl SceneModel {
    pub fn transform(&self) -> Transform {
        Transform::from_translation(Vec3::from_array(self.position))
            .with_rotation(Quat::from_rotation_y(self.yaw))
            .with_scale(Vec3::splat(self.scale))
    }
}

/// How the terrain surface is painted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SurfaceStyle {
    /// Random pastel colour per vertex. Hue and lightness are in turns / [0, 1].
    PastelColors {
        hue_min: f32,
        hue_span: f32,
        saturation: f32,
        lightness_min: f32,
        lightness_span: f32,
    },
    /// One texture per chunk, picked uniformly from `paths`.
    Textures { paths: Vec<String> },
}

impl Default for SurfaceStyle {
    fn default() -> Self {
        SurfaceStyle::PastelColors {
            hue_min: 0.5,
            hue_span: 0.3,
            saturation: 0.75,
            lightness_min: 0.75,
            lightness_span: 0.25,
        }
    }
}

/// Collision geometry of a prop archetype, centred on the prop position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PropShape {
    Box { size: f32 },
    Sphere { radius: f32 },
    /// Upright cylinder.
    Cylinder { radius: f32, height: f32 },
}

/// One kind of prop scattered over every chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropArchetype {
    pub name: String,
    pub shape: PropShape,
    /// Base colour (sRGB) of the primitive stand-in.
    pub color: [f32; 3],
    /// Optional glTF model that replaces the primitive once it has loaded.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_model_scale")]
    pub model_scale: f32,
    /// Optional image mapped onto the primitive stand-in.
    #[serde(default)]
    pub texture: Option<String>,
}

fn default_model_scale() -> f32 {
    1.0
}

/// Where a prop's downward snap ray is allowed to land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SnapTarget {
    /// Only the chunk's own terrain mesh.
    #[default]
    Terrain,
    /// Terrain plus props already placed in the same chunk (props stack).
    TerrainAndProps,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropPlacement {
    pub archetypes: Vec<PropArchetype>,
    /// Instances of each archetype per chunk. `None` means `floor_size / 100`.
    pub instances_per_archetype: Option<usize>,
    /// Planar sampling half-width as a fraction of `floor_size`.
    pub range_fraction: f32,
    /// Height the snap ray starts from (chunk-local).
    pub snap_height: f32,
    /// Clearance added above the snap hit.
    pub ground_offset: f32,
    pub snap_target: SnapTarget,
}

impl Default for PropPlacement {
    fn default() -> Self {
        Self {
            archetypes: vec![
                PropArchetype {
                    name: "box".to_string(),
                    shape: PropShape::Box { size: 20.0 },
                    color: [0.72, 0.86, 0.95],
                    model: None,
                    model_scale: 1.0,
                    texture: None,
                },
                PropArchetype {
                    name: "sphere".to_string(),
                    shape: PropShape::Sphere { radius: 5.0 },
                    // #9D941B
                    color: [0.616, 0.58, 0.106],
                    model: None,
                    model_scale: 1.0,
                    texture: None,
                },
                PropArchetype {
                    name: "cylinder".to_string(),
                    shape: PropShape::Cylinder {
                        radius: 8.0,
                        height: 8.0,
                    },
                    color: [1.0, 0.647, 0.0],
                    model: None,
                    model_scale: 1.0,
                    texture: None,
                },
            ],
            instances_per_archetype: None,
            range_fraction: 0.5,
            snap_height: 1000.0,
            ground_offset: 10.0,
            snap_target: SnapTarget::Terrain,
        }
    }
}

/// Ground probe query style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProbeMode {
    /// Resolve the nearest hit.
    #[default]
    Nearest,
    /// Stop at the first hit found.
    Any,
}

/// Player physics constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Horizontal exponential damping rate (1/s).
    pub damping: f32,
    pub gravity: f32,
    pub mass: f32,
    /// Intent acceleration.
    pub acceleration: f32,
    /// Horizontal displacement multiplier.
    pub move_scale: f32,
    pub jump_impulse: f32,
    /// Hard floor the player can never drop below.
    pub ground_height: f32,
    /// Vertical offset of the ground probe origin from the eye.
    pub probe_offset: f32,
    pub probe_distance: f32,
    pub probe_mode: ProbeMode,
    /// While moving forward, zero forward velocity and drop the intent on ground contact.
    pub stop_on_contact: bool,
    /// Raise the hard floor to sit `ground_height` above loaded terrain.
    pub follow_terrain: bool,
    pub spawn: [f32; 3],
    /// Frame deltas above this are clamped (e.g. after a window drag).
    pub max_delta: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            damping: 10.0,
            gravity: 9.8,
            mass: 100.0,
            acceleration: 400.0,
            move_scale: 10.0,
            jump_impulse: 350.0,
            ground_height: 10.0,
            probe_offset: -10.0,
            probe_distance: 10.0,
            probe_mode: ProbeMode::Nearest,
            stop_on_contact: false,
            follow_terrain: false,
            spawn: [0.0, 10.0, 0.0],
            max_delta: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Chebyshev radius (in chunks) kept generated around the player.
    pub radius: i32,
    /// Chunks farther than this are dropped. `None` keeps every chunk forever.
    pub evict_radius: Option<i32>,
    /// Generate on the async compute pool instead of inside the frame.
    pub background: bool,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            radius: 1,
            evict_radius: None,
            background: false,
        }
    }
}

/// Which objects take part in the player's ground probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollisionSet {
    /// Props only; the hard floor keeps the player above the ground.
    #[default]
    Props,
    /// Props plus every chunk's terrain mesh.
    PropsAndTerrain,
}

impl WorldConfig {
    /// Parse a RON document and validate it.
    pub fn from_ron_str(text: &str) -> Result<Self, String> {
        let config: WorldConfig =
            ron::from_str(text).map_err(|e| format!("ron parse failed: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a RON file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read {path:?}: {e}"))?;
        Self::from_ron_str(&text).map_err(|e| format!("{path:?}: {e}"))
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.floor_size > 0.0) {
            return Err(format!("floor_size must be positive, got {}", self.floor_size));
        }
        if self.subdivisions == 0 {
            return Err("subdivisions must be at least 1".to_string());
        }
        if !(self.height_divisor > 0.0) {
            return Err(format!(
                "height_divisor must be positive, got {}",
                self.height_divisor
            ));
        }
        if self.props.archetypes.is_empty() {
            return Err("at least one prop archetype is required".to_string());
        }
        if !(0.0..=1.0).contains(&self.props.range_fraction) {
            return Err(format!(
                "props.range_fraction must be within [0, 1], got {}",
                self.props.range_fraction
            ));
        }
        if let Some(model) = self.scenery.iter().find(|m| !(m.scale > 0.0)) {
            return Err(format!(
                "scenery model {} needs a positive scale, got {}",
                model.path, model.scale
            ));
        }
        if let SurfaceStyle::Textures { paths } = &self.surface {
            if paths.is_empty() {
                return Err("Textures surface needs at least one path".to_string());
            }
        }
        if self.streaming.radius < 0 {
            return Err(format!(
                "streaming.radius must not be negative, got {}",
                self.streaming.radius
            ));
        }
        if let Some(evict) = self.streaming.evict_radius {
            if evict < self.streaming.radius {
                return Err(format!(
                    "streaming.evict_radius ({evict}) is smaller than streaming.radius ({})",
                    self.streaming.radius
                ));
            }
        }
        Ok(())
    }

    /// Number of instances of each archetype placed per chunk.
    pub fn instances_per_archetype(&self) -> usize {
        self.props
            .instances_per_archetype
            .unwrap_or((self.floor_size / 100.0) as usize)
    }

    /// Half-width of the planar prop sampling square.
    pub fn prop_range(&self) -> f32 {
        self.floor_size * self.props.range_fraction
    }

    /// The configured seed, or a fresh random one.
    pub fn resolve_seed(&self) -> u32 {
        self.seed.unwrap_or_else(rand::random::<u32>)
    }

    pub fn spawn_position(&self) -> Vec3 {
        Vec3::from_array(self.player.spawn)
    }
}
