//! Axis-aligned bounding boxes and the slab-test ray intersection.

use crate::math::{Point3, Range, Ray};

/// Two corners `(min, max)` defining a cuboid.
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Point3,
    pub max: Point3,
}

impl Aabb {
    pub const fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Componentwise min/max of two boxes.
    pub fn enclose(a: Aabb, b: Aabb) -> Aabb {
        let min = Point3::new(
            a.min.x.min(b.min.x),
            a.min.y.min(b.min.y),
            a.min.z.min(b.min.z),
        );
        let max = Point3::new(
            a.max.x.max(b.max.x),
            a.max.y.max(b.max.y),
            a.max.z.max(b.max.z),
        );
        Aabb::new(min, max)
    }

    /// Slab-test intersection, narrowing `range` across all three axes.
    /// When the inverse direction component is negative the slab's
    /// `(t0, t1)` pair is swapped before the running interval is updated.
    pub fn hit(&self, ray: &Ray, range: Range) -> bool {
        let mut t_min = range.min;
        let mut t_max = range.max;
        for axis in 0..3 {
            let inv_d = 1.0 / ray.direction[axis];
            let mut t0 = (self.min[axis] - ray.origin[axis]) * inv_d;
            let mut t1 = (self.max[axis] - ray.origin[axis]) * inv_d;
            if inv_d < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t0.max(t_min);
            t_max = t1.min(t_max);
            if t_max <= t_min {
                return false;
            }
        }
        true
    }
}
