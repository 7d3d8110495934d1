//! Bounding volume hierarchy over a triangle soup.
//!
//! Built once per chunk and never modified. Nodes live in one flat array; an
//! internal node's children are always stored next to each other.

use bevy::prelude::*;

use crate::ray::{intersect_triangle, Aabb, Ray, RayHit};

/// Maximum triangles per leaf.
const LEAF_SIZE: usize = 4;

#[derive(Debug, Clone, Copy)]
struct BvhNode {
    bounds: Aabb,
    /// Leaf: index of the first triangle. Internal: index of the left child.
    first: u32,
    /// Triangles in a leaf, 0 for internal nodes.
    count: u32,
}

impl BvhNode {
    #[inline]
    fn is_leaf(&self) -> bool {
        self.count > 0
    }
}

pub struct TriangleBvh {
    nodes: Vec<BvhNode>,
    triangles: Vec<[Vec3; 3]>,
}

impl TriangleBvh {
    /// Build over a soup where every three consecutive positions form a triangle.
    pub fn build(soup: &[Vec3]) -> Self {
        let mut triangles: Vec<[Vec3; 3]> = soup
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect();

        let mut nodes = Vec::with_capacity((triangles.len() / LEAF_SIZE).max(1) * 2);
        nodes.push(BvhNode {
            bounds: triangle_bounds(&triangles),
            first: 0,
            count: triangles.len() as u32,
        });

        if triangles.is_empty() {
            return Self { nodes, triangles };
        }

        let mut stack = vec![0usize];
        while let Some(node_idx) = stack.pop() {
            let node = nodes[node_idx];
            let count = node.count as usize;
            if count <= LEAF_SIZE {
                continue;
            }
            let start = node.first as usize;
            let range = &mut triangles[start..start + count];

            let mut centroid_bounds = Aabb::EMPTY;
            for tri in range.iter() {
                centroid_bounds.grow(centroid(tri));
            }
            let extent = centroid_bounds.extent();
            let axis = if extent.x >= extent.y && extent.x >= extent.z {
                0
            } else if extent.y >= extent.z {
                1
            } else {
                2
            };
            if extent[axis] <= 0.0 {
                // All centroids coincide; splitting would not help.
                continue;
            }

            let mid = count / 2;
            range.select_nth_unstable_by(mid, |a, b| {
                centroid(a)[axis].total_cmp(&centroid(b)[axis])
            });

            let left_idx = nodes.len();
            nodes.push(BvhNode {
                bounds: triangle_bounds(&range[..mid]),
                first: start as u32,
                count: mid as u32,
            });
            nodes.push(BvhNode {
                bounds: triangle_bounds(&range[mid..]),
                first: (start + mid) as u32,
                count: (count - mid) as u32,
            });
            nodes[node_idx].first = left_idx as u32;
            nodes[node_idx].count = 0;

            stack.push(left_idx);
            stack.push(left_idx + 1);
        }

        Self { nodes, triangles }
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn bounds(&self) -> Aabb {
        self.nodes[0].bounds
    }

    /// Nearest hit within the ray bounds.
    pub fn cast_nearest(&self, ray: &Ray) -> Option<RayHit> {
        let mut best: Option<(f32, usize)> = None;
        self.walk(ray, |idx, t, best_t: &mut f32| {
            if t < *best_t {
                *best_t = t;
                best = Some((t, idx));
            }
        });
        best.map(|(t, idx)| self.hit(ray, idx, t))
    }

    /// Every hit within the ray bounds, sorted by distance.
    pub fn cast_all(&self, ray: &Ray, out: &mut Vec<RayHit>) {
        let start = out.len();
        let mut hits = Vec::new();
        self.walk(ray, |idx, t, _best_t: &mut f32| hits.push((t, idx)));
        out.extend(hits.into_iter().map(|(t, idx)| self.hit(ray, idx, t)));
        out[start..].sort_by(|a, b| a.distance.total_cmp(&b.distance));
    }

    /// Visit every triangle hit. The callback may lower `best_t` to prune nodes
    /// that start farther away.
    fn walk(&self, ray: &Ray, mut on_hit: impl FnMut(usize, f32, &mut f32)) {
        if self.triangles.is_empty() {
            return;
        }
        let mut best_t = f32::INFINITY;
        let mut stack = vec![0usize];
        while let Some(node_idx) = stack.pop() {
            let node = &self.nodes[node_idx];
            match node.bounds.ray_span(ray) {
                Some((enter, _)) if enter <= best_t => {}
                _ => continue,
            }
            if node.is_leaf() {
                let start = node.first as usize;
                for idx in start..start + node.count as usize {
                    let [a, b, c] = self.triangles[idx];
                    if let Some(t) = intersect_triangle(ray, a, b, c) {
                        on_hit(idx, t, &mut best_t);
                    }
                }
            } else {
                stack.push(node.first as usize);
                stack.push(node.first as usize + 1);
            }
        }
    }

    fn hit(&self, ray: &Ray, idx: usize, t: f32) -> RayHit {
        let [a, b, c] = self.triangles[idx];
        RayHit {
            point: ray.at(t),
            distance: t,
            normal: (b - a).cross(c - a).normalize_or_zero(),
        }
    }
}

#[inline]
fn centroid(tri: &[Vec3; 3]) -> Vec3 {
    (tri[0] + tri[1] + tri[2]) / 3.0
}

fn triangle_bounds(tris: &[[Vec3; 3]]) -> Aabb {
    let mut bounds = Aabb::EMPTY;
    for tri in tris {
        for &p in tri {
            bounds.grow(p);
        }
    }
    bounds
}
