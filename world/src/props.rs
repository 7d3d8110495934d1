//! Prop placement
//!
//! Scatters instances of every configured archetype over a freshly built chunk
//! and snaps each one onto the ground with a downward ray.

use bevy::prelude::*;
use rand::Rng;

use crate::chunk::GridCoord;
use crate::config::{PropShape, SnapTarget, WorldConfig};
use crate::mesh::ChunkMesh;
use crate::ray::{intersect_box, intersect_cylinder, intersect_sphere, Hittable, Ray, RayHit};

/// A placed prop instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prop {
    /// Index into the configured archetype list.
    pub archetype: usize,
    pub shape: PropShape,
    pub chunk: GridCoord,
    /// Position relative to the owning chunk's origin.
    pub local: Vec3,
    pub chunk_origin: Vec3,
}

impl Prop {
    pub fn position(&self) -> Vec3 {
        self.chunk_origin + self.local
    }
}

/// Shape queries in world space.
impl Hittable for Prop {
    fn intersect(&self, ray: &Ray) -> Option<RayHit> {
        let center = self.position();
        match self.shape {
            PropShape::Box { size } => intersect_box(ray, center, size / 2.0),
            PropShape::Sphere { radius } => intersect_sphere(ray, center, radius),
            PropShape::Cylinder { radius, height } => {
                intersect_cylinder(ray, center, radius, height)
            }
        }
    }
}

/// Place `instances_per_archetype` props of each archetype on a chunk.
///
/// Planar positions are uniform in `[-range, range)` around the chunk centre.
/// A prop whose snap ray finds nothing keeps a local height of 0.
pub fn place_props(
    coord: GridCoord,
    origin: Vec3,
    mesh: &ChunkMesh,
    config: &WorldConfig,
    rng: &mut impl Rng,
) -> Vec<Prop> {
    let placement = &config.props;
    let range = config.prop_range();
    let per_archetype = config.instances_per_archetype();
    let mut props: Vec<Prop> = Vec::with_capacity(per_archetype * placement.archetypes.len());

    for (archetype, def) in placement.archetypes.iter().enumerate() {
        for _ in 0..per_archetype {
            let x = rng.gen::<f32>() * 2.0 * range - range;
            let z = rng.gen::<f32>() * 2.0 * range - range;
            let ray = Ray::down(Vec3::new(x, placement.snap_height, z));

            let mut ground = mesh.intersect(&ray);
            if placement.snap_target == SnapTarget::TerrainAndProps {
                let world_ray = ray.translated(origin);
                for placed in &props {
                    let Some(hit) = placed.intersect(&world_ray) else {
                        continue;
                    };
                    if ground.is_none_or(|g| hit.distance < g.distance) {
                        ground = Some(hit.translated(-origin));
                    }
                }
            }

            let y = match ground {
                Some(hit) => hit.point.y + placement.ground_offset,
                None => 0.0,
            };

            props.push(Prop {
                archetype,
                shape: def.shape,
                chunk: coord,
                local: Vec3::new(x, y, z),
                chunk_origin: origin,
            });
        }
    }

    props
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PropArchetype;
    use crate::noise_field::{FlatField, NoiseField};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_config() -> WorldConfig {
        WorldConfig {
            subdivisions: 8,
            ..default()
        }
    }

    fn build(config: &WorldConfig, coord: GridCoord, seed: u64) -> (ChunkMesh, Vec<Prop>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mesh = ChunkMesh::build(coord, config, &NoiseField::new(3), &mut rng);
        let origin = coord.origin(config.floor_size);
        let props = place_props(coord, origin, &mesh, config, &mut rng);
        (mesh, props)
    }

    #[test]
    fn test_default_count_and_planar_bounds() {
        let config = small_config();
        let (_, props) = build(&config, GridCoord::new(-2, 5), 1);
        assert_eq!(props.len(), 3 * 20);
        let half = config.floor_size / 2.0;
        for prop in &props {
            assert!(prop.local.x >= -half && prop.local.x <= half);
            assert!(prop.local.z >= -half && prop.local.z <= half);
            assert_eq!(prop.chunk, GridCoord::new(-2, 5));
        }
        assert_eq!(props.iter().filter(|p| p.archetype == 1).count(), 20);
    }

    #[test]
    fn test_props_rest_above_terrain() {
        let config = small_config();
        let (mesh, props) = build(&config, GridCoord::new(0, 0), 2);
        for prop in &props {
            let ground = mesh
                .intersect(&Ray::down(Vec3::new(prop.local.x, 1000.0, prop.local.z)))
                .expect("terrain under every in-range prop");
            assert!((prop.local.y - (ground.point.y + 10.0)).abs() < 1e-3);
        }
    }

    #[test]
    fn test_missing_ground_leaves_zero_height() {
        let mut config = small_config();
        config.props.range_fraction = 1.0;
        let (_, props) = build(&config, GridCoord::new(0, 0), 4);
        let half = config.floor_size / 2.0;
        let outside: Vec<_> = props
            .iter()
            .filter(|p| p.local.x.abs() > half || p.local.z.abs() > half)
            .collect();
        assert!(!outside.is_empty());
        assert!(outside.iter().all(|p| p.local.y == 0.0));
    }

    #[test]
    fn test_props_stack_when_snapping_onto_props() {
        let mut config = small_config();
        config.props.range_fraction = 0.0;
        config.props.instances_per_archetype = Some(3);
        config.props.snap_target = SnapTarget::TerrainAndProps;
        config.props.archetypes = vec![PropArchetype {
            name: "crate".to_string(),
            shape: PropShape::Box { size: 20.0 },
            color: [1.0, 1.0, 1.0],
            model: None,
            model_scale: 1.0,
            texture: None,
        }];

        let mut rng = StdRng::seed_from_u64(5);
        let mesh = ChunkMesh::build(GridCoord::new(0, 0), &config, &FlatField(0.0), &mut rng);
        let props = place_props(GridCoord::new(0, 0), Vec3::ZERO, &mesh, &config, &mut rng);

        assert_eq!(props.len(), 3);
        for pair in props.windows(2) {
            // Snap onto the top face (half size) plus the ground offset.
            assert!((pair[1].local.y - pair[0].local.y - 20.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_prop_shapes_hit_in_world_space() {
        let prop = Prop {
            archetype: 0,
            shape: PropShape::Sphere { radius: 5.0 },
            chunk: GridCoord::new(1, 0),
            local: Vec3::new(10.0, 20.0, 0.0),
            chunk_origin: Vec3::new(2000.0, 0.0, 0.0),
        };
        assert_eq!(prop.position(), Vec3::new(2010.0, 20.0, 0.0));
        let hit = prop.intersect(&Ray::down(Vec3::new(2010.0, 100.0, 0.0))).unwrap();
        assert!((hit.point.y - 25.0).abs() < 1e-4);
        assert!(prop.intersect(&Ray::down(Vec3::new(10.0, 100.0, 0.0))).is_none());
    }
}
