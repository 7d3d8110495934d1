//! Chunk cache keyed by grid coordinate.
//!
//! A coordinate maps to at most one chunk. Chunks are only removed by explicit
//! eviction.

use std::collections::HashMap;
use std::sync::Arc;

use crate::chunk::{Chunk, GridCoord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    Absent,
    /// Generation has been started elsewhere (background task).
    Pending,
    Ready,
}

enum Slot {
    Pending,
    Ready(Arc<Chunk>),
}

#[derive(Default)]
pub struct ChunkCache {
    slots: HashMap<GridCoord, Slot>,
}

impl ChunkCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached chunk, generating and inserting it first if needed.
    ///
    /// The flag is `true` when this call created the chunk. A pending
    /// coordinate is generated right away; the background result is then
    /// ignored by [`ChunkCache::insert_ready`].
    pub fn get_or_create(
        &mut self,
        coord: GridCoord,
        generate: impl FnOnce(GridCoord) -> Chunk,
    ) -> (Arc<Chunk>, bool) {
        if let Some(Slot::Ready(chunk)) = self.slots.get(&coord) {
            return (chunk.clone(), false);
        }
        let chunk = Arc::new(generate(coord));
        self.slots.insert(coord, Slot::Ready(chunk.clone()));
        (chunk, true)
    }

    pub fn get(&self, coord: GridCoord) -> Option<&Arc<Chunk>> {
        match self.slots.get(&coord) {
            Some(Slot::Ready(chunk)) => Some(chunk),
            _ => None,
        }
    }

    pub fn contains(&self, coord: GridCoord) -> bool {
        self.get(coord).is_some()
    }

    pub fn state(&self, coord: GridCoord) -> ChunkState {
        match self.slots.get(&coord) {
            None => ChunkState::Absent,
            Some(Slot::Pending) => ChunkState::Pending,
            Some(Slot::Ready(_)) => ChunkState::Ready,
        }
    }

    /// Number of ready chunks.
    pub fn len(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coordinates of every ready chunk, in no particular order.
    pub fn coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        self.slots.iter().filter_map(|(coord, slot)| match slot {
            Slot::Ready(_) => Some(*coord),
            Slot::Pending => None,
        })
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Arc<Chunk>> {
        self.slots.values().filter_map(|slot| match slot {
            Slot::Ready(chunk) => Some(chunk),
            Slot::Pending => None,
        })
    }

    /// Mark an absent coordinate as being generated. Returns false if it is
    /// already pending or ready.
    pub fn mark_pending(&mut self, coord: GridCoord) -> bool {
        if self.slots.contains_key(&coord) {
            return false;
        }
        self.slots.insert(coord, Slot::Pending);
        true
    }

    /// Store a chunk generated elsewhere. A coordinate that is already ready
    /// keeps its chunk and the new one is dropped.
    pub fn insert_ready(&mut self, chunk: Arc<Chunk>) -> bool {
        if let Some(Slot::Ready(_)) = self.slots.get(&chunk.coord) {
            return false;
        }
        self.slots.insert(chunk.coord, Slot::Ready(chunk));
        true
    }

    /// Remove chunks and pending markers farther than `radius` from `center`.
    /// Returns the coordinates of the removed ready chunks.
    pub fn evict_outside(&mut self, center: GridCoord, radius: i32) -> Vec<GridCoord> {
        let mut evicted = Vec::new();
        self.slots.retain(|coord, slot| {
            if coord.chebyshev_distance(center) <= radius {
                return true;
            }
            if let Slot::Ready(_) = slot {
                evicted.push(*coord);
            }
            false
        });
        evicted.sort();
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkGenerator;
    use crate::config::WorldConfig;
    use crate::noise_field::FlatField;
    use bevy::prelude::*;

    fn generator() -> ChunkGenerator {
        let config = WorldConfig {
            subdivisions: 2,
            ..default()
        };
        ChunkGenerator::with_source(config, 1, Box::new(FlatField(0.0)))
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let generator = generator();
        let mut cache = ChunkCache::new();
        let mut calls = 0;

        let (first, created) = cache.get_or_create(GridCoord::new(0, 0), |c| {
            calls += 1;
            generator.generate(c)
        });
        assert!(created);
        let (second, created) = cache.get_or_create(GridCoord::new(0, 0), |c| {
            calls += 1;
            generator.generate(c)
        });
        assert!(!created);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);

        cache.get_or_create(GridCoord::new(0, 1), |c| generator.generate(c));
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(GridCoord::new(0, 1)));
        assert!(cache.get(GridCoord::new(5, 5)).is_none());
    }

    #[test]
    fn test_pending_then_ready() {
        let generator = generator();
        let mut cache = ChunkCache::new();
        let coord = GridCoord::new(2, 2);

        assert_eq!(cache.state(coord), ChunkState::Absent);
        assert!(cache.mark_pending(coord));
        assert!(!cache.mark_pending(coord));
        assert_eq!(cache.state(coord), ChunkState::Pending);
        assert!(!cache.contains(coord));
        assert!(cache.is_empty());

        assert!(cache.insert_ready(Arc::new(generator.generate(coord))));
        assert_eq!(cache.state(coord), ChunkState::Ready);
        let kept = cache.get(coord).cloned().unwrap();

        // A second result for the same coordinate is ignored.
        assert!(!cache.insert_ready(Arc::new(generator.generate(coord))));
        assert!(Arc::ptr_eq(&kept, cache.get(coord).unwrap()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evict_outside_keeps_active_square() {
        let generator = generator();
        let mut cache = ChunkCache::new();
        for coord in GridCoord::new(0, 0).neighborhood(2) {
            cache.get_or_create(coord, |c| generator.generate(c));
        }
        cache.mark_pending(GridCoord::new(10, 10));
        assert_eq!(cache.len(), 25);

        let evicted = cache.evict_outside(GridCoord::new(1, 0), 1);
        assert_eq!(evicted.len(), 25 - 9);
        assert!(evicted.contains(&GridCoord::new(-1, 0)));
        assert_eq!(cache.len(), 9);
        assert_eq!(cache.state(GridCoord::new(10, 10)), ChunkState::Absent);
        for coord in GridCoord::new(1, 0).neighborhood(1) {
            assert!(cache.contains(coord), "{coord} should survive");
        }
    }
}
