//! Ray queries against terrain and props.
//!
//! A miss is always `None` / an empty list. Callers treat "nothing below me" as
//! a perfectly normal answer.

use bevy::prelude::*;

/// Half-line segment `origin + direction * t` for `t` in `[near, far]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
    pub near: f32,
    pub far: f32,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3, near: f32, far: f32) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            near,
            far,
        }
    }

    /// Straight down from `origin`, unbounded.
    pub fn down(origin: Vec3) -> Self {
        Self::new(origin, Vec3::NEG_Y, 0.0, f32::INFINITY)
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    #[inline]
    pub fn accepts(&self, t: f32) -> bool {
        t >= self.near && t <= self.far
    }

    /// Same ray moved by `offset` (used to enter a chunk's local space).
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            origin: self.origin + offset,
            ..*self
        }
    }

    /// Same ray with a tighter far bound.
    pub fn clipped(&self, far: f32) -> Self {
        Self {
            far: far.min(self.far),
            ..*self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    /// Distance along the ray.
    pub distance: f32,
    pub normal: Vec3,
}

impl RayHit {
    pub fn translated(self, offset: Vec3) -> Self {
        Self {
            point: self.point + offset,
            ..self
        }
    }
}

/// Query style for ray casts over many objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitMode {
    Nearest,
    All,
}

/// Anything a ray can hit: terrain chunks and props.
pub trait Hittable: Send + Sync {
    /// Nearest hit within the ray bounds.
    fn intersect(&self, ray: &Ray) -> Option<RayHit>;

    /// Every hit within the ray bounds, appended to `out` in no particular order.
    fn intersect_all(&self, ray: &Ray, out: &mut Vec<RayHit>) {
        out.extend(self.intersect(ray));
    }
}

/// Two-sided Möller–Trumbore ray/triangle test. Returns the hit distance.
pub fn intersect_triangle(ray: &Ray, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    const EPSILON: f32 = 1e-7;
    let edge1 = b - a;
    let edge2 = c - a;
    let p = ray.direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = ray.origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(q) * inv_det;
    ray.accepts(t).then_some(t)
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn from_center_half_extents(center: Vec3, half: Vec3) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn grow(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Slab test. Returns the `(enter, exit)` parameters clipped to the ray bounds.
    pub fn ray_span(&self, ray: &Ray) -> Option<(f32, f32)> {
        let inv = ray.direction.recip();
        let t0 = (self.min - ray.origin) * inv;
        let t1 = (self.max - ray.origin) * inv;
        // NaN (0 * inf on a slab edge) is discarded by max/min.
        let enter = t0.min(t1).max_element().max(ray.near);
        let exit = t0.max(t1).min_element().min(ray.far);
        (enter <= exit).then_some((enter, exit))
    }
}

/// Box prop: nearest face hit (or the exit face when starting inside).
pub fn intersect_box(ray: &Ray, center: Vec3, half: f32) -> Option<RayHit> {
    let aabb = Aabb::from_center_half_extents(center, Vec3::splat(half));
    let inv = ray.direction.recip();
    let t0 = (aabb.min - ray.origin) * inv;
    let t1 = (aabb.max - ray.origin) * inv;
    let t_enter = t0.min(t1).max_element();
    let t_exit = t0.max(t1).min_element();
    if t_enter > t_exit {
        return None;
    }
    let t = if ray.accepts(t_enter) {
        t_enter
    } else if t_enter < ray.near && ray.accepts(t_exit) {
        t_exit
    } else {
        return None;
    };
    let point = ray.at(t);
    let local = (point - center) / half;
    let axis = local.abs().max_element();
    let normal = if local.x.abs() == axis {
        Vec3::X * local.x.signum()
    } else if local.y.abs() == axis {
        Vec3::Y * local.y.signum()
    } else {
        Vec3::Z * local.z.signum()
    };
    Some(RayHit {
        point,
        distance: t,
        normal,
    })
}

pub fn intersect_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<RayHit> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.direction);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    let t = [-b - sqrt_disc, -b + sqrt_disc]
        .into_iter()
        .find(|&t| ray.accepts(t))?;
    let point = ray.at(t);
    Some(RayHit {
        point,
        distance: t,
        normal: (point - center) / radius,
    })
}

/// Upright capped cylinder centred on `center`.
pub fn intersect_cylinder(ray: &Ray, center: Vec3, radius: f32, height: f32) -> Option<RayHit> {
    let half_h = height / 2.0;
    let mut best: Option<RayHit> = None;
    let mut consider = |t: f32, normal: Vec3| {
        if ray.accepts(t) && best.is_none_or(|h| t < h.distance) {
            best = Some(RayHit {
                point: ray.at(t),
                distance: t,
                normal,
            });
        }
    };

    // Side wall.
    let o = Vec2::new(ray.origin.x - center.x, ray.origin.z - center.z);
    let d = Vec2::new(ray.direction.x, ray.direction.z);
    let a = d.length_squared();
    if a > f32::EPSILON {
        let b = o.dot(d);
        let c = o.length_squared() - radius * radius;
        let disc = b * b - a * c;
        if disc >= 0.0 {
            let sqrt_disc = disc.sqrt();
            for t in [(-b - sqrt_disc) / a, (-b + sqrt_disc) / a] {
                let y = ray.origin.y + ray.direction.y * t - center.y;
                if y.abs() <= half_h {
                    let p = o + d * t;
                    consider(t, Vec3::new(p.x, 0.0, p.y) / radius);
                }
            }
        }
    }

    // Caps.
    if ray.direction.y.abs() > f32::EPSILON {
        for (cap_y, normal) in [(center.y + half_h, Vec3::Y), (center.y - half_h, Vec3::NEG_Y)] {
            let t = (cap_y - ray.origin.y) / ray.direction.y;
            let p = o + d * t;
            if p.length_squared() <= radius * radius {
                consider(t, normal);
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_hit_and_miss() {
        let a = Vec3::new(-1.0, 0.0, -1.0);
        let b = Vec3::new(-1.0, 0.0, 1.0);
        let c = Vec3::new(1.0, 0.0, 1.0);
        let hit = intersect_triangle(&Ray::down(Vec3::new(-0.5, 5.0, 0.5)), a, b, c);
        assert_eq!(hit, Some(5.0));
        // Outside the triangle.
        assert!(intersect_triangle(&Ray::down(Vec3::new(0.5, 5.0, -0.5)), a, b, c).is_none());
        // Behind the origin.
        assert!(intersect_triangle(&Ray::down(Vec3::new(-0.5, -1.0, 0.5)), a, b, c).is_none());
        // Beyond `far`.
        let short = Ray::new(Vec3::new(-0.5, 5.0, 0.5), Vec3::NEG_Y, 0.0, 4.0);
        assert!(intersect_triangle(&short, a, b, c).is_none());
    }

    #[test]
    fn test_aabb_span() {
        let aabb = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        let (enter, exit) = aabb.ray_span(&Ray::down(Vec3::new(0.0, 10.0, 0.0))).unwrap();
        assert_eq!((enter, exit), (9.0, 11.0));
        assert!(aabb.ray_span(&Ray::down(Vec3::new(5.0, 10.0, 0.0))).is_none());
    }

    #[test]
    fn test_box_top_face() {
        let hit = intersect_box(&Ray::down(Vec3::new(2.0, 50.0, 3.0)), Vec3::new(0.0, 10.0, 0.0), 10.0)
            .unwrap();
        assert_eq!(hit.distance, 30.0);
        assert_eq!(hit.point.y, 20.0);
        assert_eq!(hit.normal, Vec3::Y);
    }

    #[test]
    fn test_sphere_hits() {
        let center = Vec3::new(0.0, 0.0, 0.0);
        let hit = intersect_sphere(&Ray::down(Vec3::new(0.0, 10.0, 0.0)), center, 5.0).unwrap();
        assert!((hit.distance - 5.0).abs() < 1e-5);
        assert!((hit.normal - Vec3::Y).length() < 1e-5);
        // From inside we report the exit point.
        let inside = intersect_sphere(&Ray::down(Vec3::ZERO), center, 5.0).unwrap();
        assert!((inside.point.y + 5.0).abs() < 1e-5);
        assert!(intersect_sphere(&Ray::down(Vec3::new(6.0, 10.0, 0.0)), center, 5.0).is_none());
    }

    #[test]
    fn test_cylinder_cap_and_side() {
        let center = Vec3::new(0.0, 4.0, 0.0);
        let cap = intersect_cylinder(&Ray::down(Vec3::new(1.0, 20.0, 1.0)), center, 8.0, 8.0).unwrap();
        assert!((cap.point.y - 8.0).abs() < 1e-5);
        assert_eq!(cap.normal, Vec3::Y);

        let sideways = Ray::new(Vec3::new(-20.0, 4.0, 0.0), Vec3::X, 0.0, 100.0);
        let side = intersect_cylinder(&sideways, center, 8.0, 8.0).unwrap();
        assert!((side.distance - 12.0).abs() < 1e-4);
        assert!((side.normal - Vec3::NEG_X).length() < 1e-4);

        assert!(intersect_cylinder(&Ray::down(Vec3::new(9.0, 20.0, 0.0)), center, 8.0, 8.0).is_none());
    }
}
