//! Flat list of everything the player can stand on.

use std::sync::Arc;

use crate::chunk::{Chunk, GridCoord};
use crate::ray::{HitMode, Hittable, Ray, RayHit};

pub use crate::config::CollisionSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColliderId {
    Terrain(GridCoord),
    Prop { chunk: GridCoord, index: usize },
}

pub struct Collider {
    /// Chunk whose eviction removes this collider.
    pub owner: GridCoord,
    pub id: ColliderId,
    pub shape: Arc<dyn Hittable>,
}

#[derive(Default)]
pub struct CollisionList {
    set: CollisionSet,
    colliders: Vec<Collider>,
}

impl CollisionList {
    pub fn new(set: CollisionSet) -> Self {
        Self {
            set,
            colliders: Vec::new(),
        }
    }

    pub fn set(&self) -> CollisionSet {
        self.set
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Collider> {
        self.colliders.iter()
    }

    pub fn push(&mut self, collider: Collider) {
        self.colliders.push(collider);
    }

    /// Register a chunk's props, and its terrain when the set includes it.
    pub fn register_chunk(&mut self, chunk: &Arc<Chunk>) {
        if self.set == CollisionSet::PropsAndTerrain {
            self.colliders.push(Collider {
                owner: chunk.coord,
                id: ColliderId::Terrain(chunk.coord),
                shape: chunk.clone(),
            });
        }
        for (index, prop) in chunk.props.iter().enumerate() {
            self.colliders.push(Collider {
                owner: chunk.coord,
                id: ColliderId::Prop {
                    chunk: chunk.coord,
                    index,
                },
                shape: Arc::new(*prop),
            });
        }
    }

    /// Drop every collider owned by `coord`. Returns how many were removed.
    pub fn remove_owner(&mut self, coord: GridCoord) -> usize {
        let before = self.colliders.len();
        self.colliders.retain(|c| c.owner != coord);
        before - self.colliders.len()
    }

    /// Cast against every collider. Results are sorted by distance; `Nearest`
    /// keeps at most one.
    pub fn cast(&self, ray: &Ray, mode: HitMode) -> Vec<(ColliderId, RayHit)> {
        match mode {
            HitMode::Nearest => {
                let mut best: Option<(ColliderId, RayHit)> = None;
                for collider in &self.colliders {
                    let clipped = match &best {
                        Some((_, hit)) => ray.clipped(hit.distance),
                        None => *ray,
                    };
                    if let Some(hit) = collider.shape.intersect(&clipped) {
                        best = Some((collider.id, hit));
                    }
                }
                best.into_iter().collect()
            }
            HitMode::All => {
                let mut hits = Vec::new();
                let mut scratch = Vec::new();
                for collider in &self.colliders {
                    scratch.clear();
                    collider.shape.intersect_all(ray, &mut scratch);
                    hits.extend(scratch.iter().map(|hit| (collider.id, *hit)));
                }
                hits.sort_by(|a, b| a.1.distance.total_cmp(&b.1.distance));
                hits
            }
        }
    }

    /// First hit found in list order, not necessarily the nearest.
    pub fn any_hit(&self, ray: &Ray) -> Option<(ColliderId, RayHit)> {
        self.colliders
            .iter()
            .find_map(|c| c.shape.intersect(ray).map(|hit| (c.id, hit)))
    }
}
