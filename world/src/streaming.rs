//! Keeps the chunks around the player generated and drops far ones.

use bevy::prelude::*;

use crate::cache::{ChunkCache, ChunkState};
use crate::chunk::{ChunkGenerator, GridCoord};
use crate::collision::CollisionList;
use crate::config::StreamingConfig;

/// What one streaming pass did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamReport {
    pub center: GridCoord,
    pub created: Vec<GridCoord>,
    pub evicted: Vec<GridCoord>,
}

impl StreamReport {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.evicted.is_empty()
    }
}

/// Generate every missing chunk within `streaming.radius` of `position`, in
/// this call, then evict chunks beyond `streaming.evict_radius`.
pub fn stream_around(
    position: Vec3,
    generator: &ChunkGenerator,
    cache: &mut ChunkCache,
    collisions: &mut CollisionList,
    streaming: &StreamingConfig,
) -> StreamReport {
    let center = GridCoord::from_world_pos(position, generator.config().floor_size);
    let mut created = Vec::new();

    for coord in center.neighborhood(streaming.radius) {
        let (chunk, is_new) = cache.get_or_create(coord, |c| generator.generate(c));
        if is_new {
            collisions.register_chunk(&chunk);
            created.push(coord);
        }
    }

    let evicted = evict(center, cache, collisions, streaming.evict_radius);

    StreamReport {
        center,
        created,
        evicted,
    }
}

/// Coordinates within `radius` of `position` that are neither ready nor
/// pending, nearest first.
pub fn missing_chunks(position: Vec3, size: f32, radius: i32, cache: &ChunkCache) -> Vec<GridCoord> {
    let center = GridCoord::from_world_pos(position, size);
    let mut missing: Vec<GridCoord> = center
        .neighborhood(radius)
        .into_iter()
        .filter(|coord| cache.state(*coord) == ChunkState::Absent)
        .collect();
    missing.sort_by_key(|coord| coord.chebyshev_distance(center));
    missing
}

/// Drop chunks (and their colliders) farther than `evict_radius` from `center`.
pub fn evict(
    center: GridCoord,
    cache: &mut ChunkCache,
    collisions: &mut CollisionList,
    evict_radius: Option<i32>,
) -> Vec<GridCoord> {
    let Some(radius) = evict_radius else {
        return Vec::new();
    };
    let evicted = cache.evict_outside(center, radius);
    for coord in &evicted {
        let removed = collisions.remove_owner(*coord);
        debug!("Evicted chunk {} ({} colliders)", coord, removed);
    }
    evicted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CollisionSet, WorldConfig};
    use crate::noise_field::FlatField;

    fn generator() -> ChunkGenerator {
        let config = WorldConfig {
            subdivisions: 2,
            ..default()
        };
        ChunkGenerator::with_source(config, 3, Box::new(FlatField(0.0)))
    }

    #[test]
    fn test_first_pass_fills_the_block() {
        let generator = generator();
        let mut cache = ChunkCache::new();
        let mut collisions = CollisionList::new(CollisionSet::PropsAndTerrain);
        let streaming = StreamingConfig::default();

        let report = stream_around(Vec3::ZERO, &generator, &mut cache, &mut collisions, &streaming);
        assert_eq!(report.center, GridCoord::new(0, 0));
        assert_eq!(report.created.len(), 9);
        assert!(report.evicted.is_empty());
        for coord in GridCoord::new(0, 0).neighborhood(1) {
            assert!(cache.contains(coord));
        }
        // One terrain collider plus 60 props per chunk.
        assert_eq!(collisions.len(), 9 * 61);

        let again = stream_around(Vec3::new(10.0, 0.0, -10.0), &generator, &mut cache, &mut collisions, &streaming);
        assert!(again.is_empty());
        assert_eq!(cache.len(), 9);
    }

    #[test]
    fn test_moving_far_evicts_old_chunks() {
        let generator = generator();
        let mut cache = ChunkCache::new();
        let mut collisions = CollisionList::new(CollisionSet::Props);
        let streaming = StreamingConfig {
            radius: 1,
            evict_radius: Some(1),
            background: false,
        };

        stream_around(Vec3::ZERO, &generator, &mut cache, &mut collisions, &streaming);
        let report = stream_around(
            Vec3::new(2000.0, 0.0, 0.0),
            &generator,
            &mut cache,
            &mut collisions,
            &streaming,
        );
        assert_eq!(report.center, GridCoord::new(1, 0));
        assert_eq!(report.created.len(), 3);
        assert_eq!(report.evicted.len(), 3);
        assert!(report.evicted.iter().all(|c| c.x == -1));
        assert_eq!(cache.len(), 9);
        assert!(collisions.iter().all(|c| c.owner.x >= 0));
    }

    #[test]
    fn test_without_evict_radius_cache_only_grows() {
        let generator = generator();
        let mut cache = ChunkCache::new();
        let mut collisions = CollisionList::new(CollisionSet::Props);
        let streaming = StreamingConfig {
            radius: 0,
            evict_radius: None,
            background: false,
        };
        for step in 0..5 {
            let pos = Vec3::new(step as f32 * 2000.0, 0.0, 0.0);
            stream_around(pos, &generator, &mut cache, &mut collisions, &streaming);
        }
        assert_eq!(cache.len(), 5);
    }

    #[test]
    fn test_missing_chunks_skips_pending_and_ready() {
        let generator = generator();
        let mut cache = ChunkCache::new();
        cache.get_or_create(GridCoord::new(0, 0), |c| generator.generate(c));
        cache.mark_pending(GridCoord::new(1, 1));

        let missing = missing_chunks(Vec3::ZERO, 2000.0, 1, &cache);
        assert_eq!(missing.len(), 7);
        assert!(!missing.contains(&GridCoord::new(0, 0)));
        assert!(!missing.contains(&GridCoord::new(1, 1)));

        let missing = missing_chunks(Vec3::new(4000.0, 0.0, 0.0), 2000.0, 0, &cache);
        assert_eq!(missing, vec![GridCoord::new(2, 0)]);
    }
}
