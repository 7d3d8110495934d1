//! The simulation context: configuration, generator, cache, colliders and the
//! player, advanced together once per frame.

use std::sync::Arc;

use bevy::prelude::*;

use crate::cache::ChunkCache;
use crate::chunk::{Chunk, ChunkGenerator, GridCoord};
use crate::collision::CollisionList;
use crate::config::WorldConfig;
use crate::player::{MoveIntent, PlayerState};
use crate::ray::{Hittable, Ray};
use crate::streaming::{self, StreamReport};

#[derive(Resource)]
pub struct WorldState {
    config: WorldConfig,
    generator: Arc<ChunkGenerator>,
    cache: ChunkCache,
    collisions: CollisionList,
    player: PlayerState,
}

impl WorldState {
    /// Resolve the seed and set up an empty world. Nothing is generated yet.
    pub fn new(config: WorldConfig) -> Self {
        let seed = config.resolve_seed();
        info!("World seed: {}", seed);
        let generator = ChunkGenerator::new(config.clone(), seed);
        Self::with_generator(generator)
    }

    pub fn with_generator(generator: ChunkGenerator) -> Self {
        let config = generator.config().clone();
        Self {
            collisions: CollisionList::new(config.collision),
            player: PlayerState::new(config.spawn_position()),
            cache: ChunkCache::new(),
            generator: Arc::new(generator),
            config,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Shared handle for background generation tasks.
    pub fn generator(&self) -> &Arc<ChunkGenerator> {
        &self.generator
    }

    pub fn cache(&self) -> &ChunkCache {
        &self.cache
    }

    pub fn collisions(&self) -> &CollisionList {
        &self.collisions
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    /// Generate the chunks around the spawn point, blocking.
    pub fn bootstrap(&mut self) -> StreamReport {
        let report = streaming::stream_around(
            self.player.position,
            &self.generator,
            &mut self.cache,
            &mut self.collisions,
            &self.config.streaming,
        );
        info!(
            "Bootstrapped {} chunks around {}",
            report.created.len(),
            report.center
        );
        report
    }

    /// Step the player, then stream chunks around its new position.
    ///
    /// In background mode missing chunks are left for the caller to generate
    /// (see [`WorldState::missing_chunks`]); only eviction happens here.
    pub fn tick(&mut self, delta: f32) -> StreamReport {
        let cache = &self.cache;
        let size = self.config.floor_size;
        self.player.step(delta, &self.config.player, &self.collisions, |pos| {
            terrain_height(cache, size, pos)
        });

        if self.config.streaming.background {
            let center = GridCoord::from_world_pos(self.player.position, size);
            StreamReport {
                center,
                created: Vec::new(),
                evicted: self.evict(),
            }
        } else {
            streaming::stream_around(
                self.player.position,
                &self.generator,
                &mut self.cache,
                &mut self.collisions,
                &self.config.streaming,
            )
        }
    }

    pub fn jump(&mut self) -> bool {
        self.player.try_jump(&self.config.player)
    }

    pub fn set_intent(&mut self, intent: MoveIntent) {
        self.player.intent = intent;
    }

    pub fn set_look(&mut self, yaw: f32, pitch: f32) {
        self.player.set_look(yaw, pitch);
    }

    /// Absent chunks around the player, nearest first.
    pub fn missing_chunks(&self) -> Vec<GridCoord> {
        streaming::missing_chunks(
            self.player.position,
            self.config.floor_size,
            self.config.streaming.radius,
            &self.cache,
        )
    }

    pub fn mark_pending(&mut self, coord: GridCoord) -> bool {
        self.cache.mark_pending(coord)
    }

    /// Store a chunk built off the main schedule and register its colliders.
    /// Returns false when the coordinate already had a chunk.
    pub fn insert_chunk(&mut self, chunk: Arc<Chunk>) -> bool {
        if !self.cache.insert_ready(chunk.clone()) {
            return false;
        }
        self.collisions.register_chunk(&chunk);
        true
    }

    /// Evict chunks beyond the configured radius around the player.
    pub fn evict(&mut self) -> Vec<GridCoord> {
        let center = GridCoord::from_world_pos(self.player.position, self.config.floor_size);
        streaming::evict(
            center,
            &mut self.cache,
            &mut self.collisions,
            self.config.streaming.evict_radius,
        )
    }

    /// Height of the loaded terrain under `pos`, if its chunk is ready.
    pub fn terrain_height(&self, pos: Vec3) -> Option<f32> {
        terrain_height(&self.cache, self.config.floor_size, pos)
    }
}

fn terrain_height(cache: &ChunkCache, size: f32, pos: Vec3) -> Option<f32> {
    let chunk = cache.get(GridCoord::from_world_pos(pos, size))?;
    let origin = Vec3::new(pos.x, pos.y.max(0.0) + size, pos.z);
    chunk.intersect(&Ray::down(origin)).map(|hit| hit.point.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ChunkState;
    use crate::config::{CollisionSet, StreamingConfig};
    use crate::noise_field::FlatField;

    /// Flat terrain without props; the probe only ever sees terrain.
    fn flat_world(streaming: StreamingConfig) -> WorldState {
        let mut config = WorldConfig {
            seed: Some(1),
            subdivisions: 4,
            streaming,
            ..default()
        };
        config.props.instances_per_archetype = Some(0);
        WorldState::with_generator(ChunkGenerator::with_source(
            config,
            1,
            Box::new(FlatField(0.0)),
        ))
    }

    #[test]
    fn test_bootstrap_streams_spawn_block() {
        let mut world = flat_world(StreamingConfig::default());
        let report = world.bootstrap();
        assert_eq!(report.created.len(), 9);
        assert_eq!(world.cache().len(), 9);
        // Terrain meshes stay out of the default collision set.
        assert!(world.collisions().is_empty());
        assert_eq!(world.player().position, Vec3::new(0.0, 10.0, 0.0));
    }

    #[test]
    fn test_tick_clamps_player_to_floor() {
        let mut world = flat_world(StreamingConfig::default());
        world.bootstrap();
        assert_eq!(world.collisions().set(), CollisionSet::Props);
        world.player.velocity.y = -100.0;
        world.player.position.y = 12.0;
        let report = world.tick(0.05);
        assert!(report.created.is_empty());
        assert_eq!(world.player().position.y, 10.0);
        assert!(world.player().velocity.y >= 0.0);
        assert!(world.jump());
        assert!(!world.jump());
    }

    #[test]
    fn test_terrain_collisions_hold_player_on_probe() {
        let mut config = WorldConfig {
            seed: Some(1),
            subdivisions: 4,
            collision: CollisionSet::PropsAndTerrain,
            ..default()
        };
        config.props.instances_per_archetype = Some(0);
        let mut world = WorldState::with_generator(ChunkGenerator::with_source(
            config,
            1,
            Box::new(FlatField(0.0)),
        ));
        world.bootstrap();
        assert_eq!(world.collisions().len(), 9);

        // The probe reaches the terrain, so the player rests above the floor.
        world.player.velocity.y = -100.0;
        world.player.position.y = 12.0;
        world.tick(0.05);
        assert!(world.player().grounded);
        assert_eq!(world.player().velocity.y, 0.0);
        assert_eq!(world.player().position.y, 12.0);
    }

    #[test]
    fn test_walking_streams_new_chunks() {
        let mut world = flat_world(StreamingConfig::default());
        world.bootstrap();
        world.player.position.x = 2600.0;
        let report = world.tick(0.016);
        assert_eq!(report.center, GridCoord::new(1, 0));
        assert_eq!(report.created.len(), 3);
        assert!(world.cache().contains(GridCoord::new(2, 1)));
    }

    #[test]
    fn test_background_mode_defers_generation() {
        let mut world = flat_world(StreamingConfig {
            background: true,
            ..default()
        });
        let report = world.tick(0.016);
        assert!(report.created.is_empty());
        assert!(world.cache().is_empty());

        let missing = world.missing_chunks();
        assert_eq!(missing.len(), 9);
        assert_eq!(missing[0], GridCoord::new(0, 0));
        for coord in &missing {
            assert!(world.mark_pending(*coord));
        }
        assert!(world.missing_chunks().is_empty());

        let generator = world.generator().clone();
        let chunk = Arc::new(generator.generate(GridCoord::new(0, 0)));
        assert!(world.insert_chunk(chunk.clone()));
        assert!(!world.insert_chunk(chunk));
        assert_eq!(world.cache().state(GridCoord::new(0, 0)), ChunkState::Ready);
        assert_eq!(world.cache().state(GridCoord::new(1, 0)), ChunkState::Pending);
    }

    #[test]
    fn test_terrain_height_lookup() {
        let mut world = flat_world(StreamingConfig::default());
        world.bootstrap();
        let h = world.terrain_height(Vec3::new(300.0, 10.0, -450.0)).unwrap();
        assert!((0.0..2.0).contains(&h));
        assert!(world.terrain_height(Vec3::new(9000.0, 10.0, 0.0)).is_none());
    }
}
