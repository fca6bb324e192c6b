//! Rays, bounding boxes, and intersection tests

use glam::Vec3;

/// A ray in world space; `direction` is normalized
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Tightest box around `points`, or `None` if there are none
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut min = first;
        let mut max = first;
        for p in iter {
            min = min.min(*p);
            max = max.max(*p);
        }
        Some(Self { min, max })
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Slab test. Returns the distance to where the ray enters the box, or 0.0
/// when the origin is already inside.
pub fn ray_aabb(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    let mut tmin = 0.0_f32;
    let mut tmax = f32::INFINITY;

    for axis in 0..3 {
        let origin = ray.origin[axis];
        let direction = ray.direction[axis];
        let (lo, hi) = (aabb.min[axis], aabb.max[axis]);

        if direction == 0.0 {
            // Parallel to this slab: inside it or never hits
            if origin < lo || origin > hi {
                return None;
            }
            continue;
        }

        let inv = 1.0 / direction;
        let (t1, t2) = ((lo - origin) * inv, (hi - origin) * inv);
        tmin = tmin.max(t1.min(t2));
        tmax = tmax.min(t1.max(t2));
        if tmin > tmax {
            return None;
        }
    }

    Some(tmin)
}

/// Möller-Trumbore ray-triangle intersection
pub fn ray_triangle(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
    const EPSILON: f32 = 1e-7;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);

    // Parallel
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    if t > EPSILON {
        Some(t)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ray(origin: Vec3, direction: Vec3) -> Ray {
        Ray {
            origin,
            direction: direction.normalize(),
        }
    }

    #[test]
    fn test_ray_aabb_front_and_inside() {
        let unit = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let front = ray(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert_eq!(ray_aabb(&front, &unit), Some(4.0));

        // Starting inside counts as a hit right away
        let inside = ray(Vec3::ZERO, Vec3::X);
        assert_eq!(ray_aabb(&inside, &unit), Some(0.0));

        let away = ray(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        assert_eq!(ray_aabb(&away, &unit), None);
    }

    #[test]
    fn test_ray_aabb_flat_box_parallel_ray() {
        let flat = Aabb::new(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0));

        // Along the plane of a zero-thickness box
        let grazing = ray(Vec3::new(-5.0, 0.0, 0.0), Vec3::X);
        assert_eq!(ray_aabb(&grazing, &flat), Some(4.0));

        let above = ray(Vec3::new(-5.0, 0.0, 0.5), Vec3::X);
        assert_eq!(ray_aabb(&above, &flat), None);

        let through = ray(Vec3::new(0.5, 0.5, 3.0), Vec3::NEG_Z);
        assert_eq!(ray_aabb(&through, &flat), Some(3.0));
    }

    #[test]
    fn test_ray_triangle() {
        let r = ray(Vec3::new(0.25, 0.25, 1.0), Vec3::NEG_Z);
        let hit = ray_triangle(&r, Vec3::ZERO, Vec3::X, Vec3::Y).unwrap();
        assert!((hit - 1.0).abs() < 1e-6);

        let miss = ray(Vec3::new(2.0, 2.0, 1.0), Vec3::NEG_Z);
        assert_eq!(ray_triangle(&miss, Vec3::ZERO, Vec3::X, Vec3::Y), None);
    }
}
