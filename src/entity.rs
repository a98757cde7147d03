//! The scene graph: a closed union of primitives, transforms, and
//! acceleration structures, instead of the open `Entity` interface the
//! original renderer dispatched through a vtable.

use crate::aabb::Aabb;
use crate::hit::{Face, Hit};
use crate::material::Material;
use crate::math::{random_int, Range, Ray, Vec3, PI};
use rand::Rng;
use std::sync::Arc;

fn face_normal(ray_direction: Vec3, outward_normal: Vec3) -> (Face, Vec3) {
    Face::resolve(ray_direction, outward_normal)
}

fn sphere_uv(p: Vec3) -> Vec3 {
    let phi = p.z.atan2(p.x);
    let theta = p.y.asin();
    let u = 1.0 - (phi + PI) / (2.0 * PI);
    let v = (theta + PI / 2.0) / PI;
    Vec3::new(u, v, 0.0)
}

/// A scene primitive, transform, or acceleration node.
pub enum Entity {
    Sphere {
        position: Vec3,
        radius: f64,
        material: Arc<Material>,
    },
    PlaneXY {
        x0: f64,
        x1: f64,
        y0: f64,
        y1: f64,
        z: f64,
        material: Arc<Material>,
    },
    PlaneXZ {
        x0: f64,
        x1: f64,
        z0: f64,
        z1: f64,
        y: f64,
        material: Arc<Material>,
    },
    PlaneYZ {
        y0: f64,
        y1: f64,
        z0: f64,
        z1: f64,
        x: f64,
        material: Arc<Material>,
    },
    Triangle {
        a: Vec3,
        b: Vec3,
        c: Vec3,
        material: Arc<Material>,
    },
    Flip(Arc<Entity>),
    Move {
        entity: Arc<Entity>,
        offset: Vec3,
    },
    RotateY {
        entity: Arc<Entity>,
        sin_theta: f64,
        cos_theta: f64,
        aabb: Option<Aabb>,
    },
    List(Vec<Arc<Entity>>),
    Bvh {
        left: Arc<Entity>,
        right: Arc<Entity>,
        aabb: Aabb,
    },
}

impl Entity {
    pub fn sphere(position: Vec3, radius: f64, material: Arc<Material>) -> Arc<Entity> {
        Arc::new(Entity::Sphere {
            position,
            radius,
            material,
        })
    }

    pub fn plane_xy(x0: f64, x1: f64, y0: f64, y1: f64, z: f64, material: Arc<Material>) -> Arc<Entity> {
        Arc::new(Entity::PlaneXY {
            x0,
            x1,
            y0,
            y1,
            z,
            material,
        })
    }

    pub fn plane_xz(x0: f64, x1: f64, z0: f64, z1: f64, y: f64, material: Arc<Material>) -> Arc<Entity> {
        Arc::new(Entity::PlaneXZ {
            x0,
            x1,
            z0,
            z1,
            y,
            material,
        })
    }

    pub fn plane_yz(y0: f64, y1: f64, z0: f64, z1: f64, x: f64, material: Arc<Material>) -> Arc<Entity> {
        Arc::new(Entity::PlaneYZ {
            y0,
            y1,
            z0,
            z1,
            x,
            material,
        })
    }

    pub fn flip(e: Arc<Entity>) -> Arc<Entity> {
        Arc::new(Entity::Flip(e))
    }

    pub fn move_by(entity: Arc<Entity>, offset: Vec3) -> Arc<Entity> {
        Arc::new(Entity::Move { entity, offset })
    }

    /// A box is six planes (the opposing three flipped so normals point outward).
    pub fn boxed(p0: Vec3, p1: Vec3, material: Arc<Material>) -> Arc<Entity> {
        let sides = vec![
            Entity::plane_xy(p0.x, p1.x, p0.y, p1.y, p1.z, material.clone()),
            Entity::flip(Entity::plane_xy(p0.x, p1.x, p0.y, p1.y, p0.z, material.clone())),
            Entity::plane_xz(p0.x, p1.x, p0.z, p1.z, p1.y, material.clone()),
            Entity::flip(Entity::plane_xz(p0.x, p1.x, p0.z, p1.z, p0.y, material.clone())),
            Entity::plane_yz(p0.y, p1.y, p0.z, p1.z, p1.x, material.clone()),
            Entity::flip(Entity::plane_yz(p0.y, p1.y, p0.z, p1.z, p0.x, material)),
        ];
        Arc::new(Entity::List(sides))
    }

    pub fn rotate_y(entity: Arc<Entity>, degrees: f64) -> Arc<Entity> {
        let rad = degrees.to_radians();
        let sin_theta = rad.sin();
        let cos_theta = rad.cos();
        let base = entity.bounding_box();

        let aabb = base.map(|bbox| {
            let mut min = Vec3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
            let mut max = Vec3::new(-f64::INFINITY, -f64::INFINITY, -f64::INFINITY);
            for i in 0..2 {
                for j in 0..2 {
                    for k in 0..2 {
                        let x = i as f64 * bbox.max.x + (1 - i) as f64 * bbox.min.x;
                        let y = j as f64 * bbox.max.y + (1 - j) as f64 * bbox.min.y;
                        let z = k as f64 * bbox.max.z + (1 - k) as f64 * bbox.min.z;
                        let rot_x = cos_theta * x + sin_theta * z;
                        let rot_z = -sin_theta * x + cos_theta * z;
                        let t = Vec3::new(rot_x, y, rot_z);
                        min = Vec3::new(min.x.min(t.x), min.y.min(t.y), min.z.min(t.z));
                        max = Vec3::new(max.x.max(t.x), max.y.max(t.y), max.z.max(t.z));
                    }
                }
            }
            Aabb::new(min, max)
        });

        Arc::new(Entity::RotateY {
            entity,
            sin_theta,
            cos_theta,
            aabb,
        })
    }

    pub fn list(entities: Vec<Arc<Entity>>) -> Arc<Entity> {
        Arc::new(Entity::List(entities))
    }

    /// A flat triangle soup built from a `read_obj`-style `[a,b,c,a,b,c,...]`
    /// vertex stream, sharing a single material.
    pub fn mesh(vertices: &[Vec3], material: Arc<Material>) -> Arc<Entity> {
        let triangles = vertices
            .chunks_exact(3)
            .map(|tri| {
                Arc::new(Entity::Triangle {
                    a: tri[0],
                    b: tri[1],
                    c: tri[2],
                    material: material.clone(),
                })
            })
            .collect();
        Arc::new(Entity::List(triangles))
    }

    /// Builds a balanced BVH over `entities` by recursively splitting on a
    /// randomly chosen axis at the median, after sorting by that axis's
    /// minimum bound. Spans of one or two entities are handled directly.
    pub fn bvh(mut entities: Vec<Arc<Entity>>, rng: &mut impl Rng) -> Arc<Entity> {
        let len = entities.len();
        Self::bvh_range(&mut entities, 0, len, rng)
    }

    /// Bounding box of a BVH child, logged and degraded to a zero-volume
    /// box at the child's origin rather than panicking when a primitive
    /// reports none (e.g. a malformed or unbounded entity slipped in).
    fn bvh_child_box(entity: &Entity) -> Aabb {
        entity.bounding_box().unwrap_or_else(|| {
            tracing::error!("BVH child has no bounding box, degrading to a zero-volume box");
            Aabb::new(Vec3::zero(), Vec3::zero())
        })
    }

    fn bvh_range(entities: &mut [Arc<Entity>], start: usize, end: usize, rng: &mut impl Rng) -> Arc<Entity> {
        let axis = random_int(rng, 0, 2) as usize;
        let span = end - start;

        let node = match span {
            1 => {
                let only = entities[start].clone();
                let aabb = Self::bvh_child_box(&entities[start]);
                Entity::Bvh {
                    left: only.clone(),
                    right: only,
                    aabb,
                }
            }
            2 => {
                let box_a = Self::bvh_child_box(&entities[start]);
                let box_b = Self::bvh_child_box(&entities[start + 1]);
                let (left, right) = if box_a.min[axis] < box_b.min[axis] {
                    (entities[start].clone(), entities[start + 1].clone())
                } else {
                    (entities[start + 1].clone(), entities[start].clone())
                };
                let aabb = Aabb::enclose(box_a, box_b);
                Entity::Bvh { left, right, aabb }
            }
            _ => {
                entities[start..end].sort_by(|a, b| {
                    let box_a = Self::bvh_child_box(a);
                    let box_b = Self::bvh_child_box(b);
                    box_a.min[axis]
                        .partial_cmp(&box_b.min[axis])
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                let mid = start + span / 2;
                let left = Self::bvh_range(entities, start, mid, rng);
                let right = Self::bvh_range(entities, mid, end, rng);
                let box_left = Self::bvh_child_box(&left);
                let box_right = Self::bvh_child_box(&right);
                Entity::Bvh {
                    left,
                    right,
                    aabb: Aabb::enclose(box_left, box_right),
                }
            }
        };
        Arc::new(node)
    }

    pub fn ray_intersect(&self, ray: &Ray, range: Range) -> Option<Hit> {
        match self {
            Entity::Sphere {
                position,
                radius,
                material,
            } => {
                let oc = ray.origin - *position;
                let a = ray.direction.length_squared();
                let half_b = oc.dot(ray.direction);
                let c = oc.length_squared() - radius * radius;
                let discriminant = half_b * half_b - a * c;
                if discriminant <= 0.0 {
                    return None;
                }
                let root = discriminant.sqrt();
                let mut dist = (-half_b - root) / a;
                if dist >= range.max || dist <= range.min {
                    dist = (-half_b + root) / a;
                    if dist >= range.max || dist <= range.min {
                        return None;
                    }
                }
                let position_hit = ray.at(dist);
                let outward_normal = (position_hit - *position) / *radius;
                let (face, normal) = face_normal(ray.direction, outward_normal);
                Some(Hit {
                    position: position_hit,
                    normal,
                    uv: sphere_uv(outward_normal),
                    t: dist,
                    face,
                    material: material.clone(),
                })
            }
            Entity::PlaneXY {
                x0,
                x1,
                y0,
                y1,
                z,
                material,
            } => {
                let dist = (z - ray.origin.z) / ray.direction.z;
                if dist < range.min || dist > range.max {
                    return None;
                }
                let x = ray.origin.x + dist * ray.direction.x;
                let y = ray.origin.y + dist * ray.direction.y;
                if x < *x0 || x > *x1 || y < *y0 || y > *y1 {
                    return None;
                }
                let uv = Vec3::new((x - x0) / (x1 - x0), (y - y0) / (y1 - y0), 0.0);
                let (face, normal) = face_normal(ray.direction, Vec3::new(0.0, 0.0, 1.0));
                Some(Hit {
                    position: ray.at(dist),
                    normal,
                    uv,
                    t: dist,
                    face,
                    material: material.clone(),
                })
            }
            Entity::PlaneXZ {
                x0,
                x1,
                z0,
                z1,
                y,
                material,
            } => {
                let dist = (y - ray.origin.y) / ray.direction.y;
                if dist < range.min || dist > range.max {
                    return None;
                }
                let x = ray.origin.x + dist * ray.direction.x;
                let z = ray.origin.z + dist * ray.direction.z;
                if x < *x0 || x > *x1 || z < *z0 || z > *z1 {
                    return None;
                }
                let uv = Vec3::new((x - x0) / (x1 - x0), (z - z0) / (z1 - z0), 0.0);
                let (face, normal) = face_normal(ray.direction, Vec3::new(0.0, 1.0, 0.0));
                Some(Hit {
                    position: ray.at(dist),
                    normal,
                    uv,
                    t: dist,
                    face,
                    material: material.clone(),
                })
            }
            Entity::PlaneYZ {
                y0,
                y1,
                z0,
                z1,
                x,
                material,
            } => {
                let dist = (x - ray.origin.x) / ray.direction.x;
                if dist < range.min || dist > range.max {
                    return None;
                }
                let y = ray.origin.y + dist * ray.direction.y;
                let z = ray.origin.z + dist * ray.direction.z;
                if y < *y0 || y > *y1 || z < *z0 || z > *z1 {
                    return None;
                }
                let uv = Vec3::new((y - y0) / (y1 - y0), (z - z0) / (z1 - z0), 0.0);
                let (face, normal) = face_normal(ray.direction, Vec3::new(1.0, 0.0, 0.0));
                Some(Hit {
                    position: ray.at(dist),
                    normal,
                    uv,
                    t: dist,
                    face,
                    material: material.clone(),
                })
            }
            Entity::Triangle { a, b, c, material } => {
                // Moller-Trumbore.
                let edge1 = *b - *a;
                let edge2 = *c - *a;
                let pvec = ray.direction.cross(edge2);
                let det = edge1.dot(pvec);
                if det.abs() < 1e-8 {
                    return None;
                }
                let inv_det = 1.0 / det;
                let tvec = ray.origin - *a;
                let u = tvec.dot(pvec) * inv_det;
                if !(0.0..=1.0).contains(&u) {
                    return None;
                }
                let qvec = tvec.cross(edge1);
                let v = ray.direction.dot(qvec) * inv_det;
                if v < 0.0 || u + v > 1.0 {
                    return None;
                }
                let dist = edge2.dot(qvec) * inv_det;
                if dist < range.min || dist > range.max {
                    return None;
                }
                let outward_normal = edge1.cross(edge2).normalized();
                let (face, normal) = face_normal(ray.direction, outward_normal);
                Some(Hit {
                    position: ray.at(dist),
                    normal,
                    uv: Vec3::new(u, v, 0.0),
                    t: dist,
                    material: material.clone(),
                    face,
                })
            }
            Entity::Flip(entity) => {
                let mut hit = entity.ray_intersect(ray, range)?;
                hit.face = match hit.face {
                    Face::Front => Face::Back,
                    Face::Back => Face::Front,
                };
                Some(hit)
            }
            Entity::Move { entity, offset } => {
                let moved = Ray::new(ray.origin - *offset, ray.direction);
                let mut hit = entity.ray_intersect(&moved, range)?;
                hit.position = hit.position + *offset;
                let (face, normal) = face_normal(ray.direction, hit.normal);
                hit.face = face;
                hit.normal = normal;
                Some(hit)
            }
            Entity::RotateY {
                entity,
                sin_theta,
                cos_theta,
                ..
            } => {
                let origin = Vec3::new(
                    cos_theta * ray.origin.x - sin_theta * ray.origin.z,
                    ray.origin.y,
                    sin_theta * ray.origin.x + cos_theta * ray.origin.z,
                );
                let direction = Vec3::new(
                    cos_theta * ray.direction.x - sin_theta * ray.direction.z,
                    ray.direction.y,
                    sin_theta * ray.direction.x + cos_theta * ray.direction.z,
                );
                let rotated = Ray::new(origin, direction);
                let hit = entity.ray_intersect(&rotated, range)?;

                let position = Vec3::new(
                    cos_theta * hit.position.x + sin_theta * hit.position.z,
                    hit.position.y,
                    -sin_theta * hit.position.x + cos_theta * hit.position.z,
                );
                let outward_normal = Vec3::new(
                    cos_theta * hit.normal.x + sin_theta * hit.normal.z,
                    hit.normal.y,
                    -sin_theta * hit.normal.x + cos_theta * hit.normal.z,
                );
                let (face, normal) = face_normal(ray.direction, outward_normal);
                Some(Hit {
                    position,
                    normal,
                    face,
                    ..hit
                })
            }
            Entity::List(entities) => {
                let mut closest = range;
                let mut best: Option<Hit> = None;
                for entity in entities {
                    if let Some(hit) = entity.ray_intersect(ray, closest) {
                        closest.max = hit.t;
                        best = Some(hit);
                    }
                }
                best
            }
            Entity::Bvh { left, right, aabb } => {
                if !aabb.hit(ray, range) {
                    return None;
                }
                let hit_left = left.ray_intersect(ray, range);
                let mut narrowed = range;
                if let Some(ref hit) = hit_left {
                    narrowed.max = hit.t;
                }
                let hit_right = right.ray_intersect(ray, narrowed);
                hit_right.or(hit_left)
            }
        }
    }

    pub fn bounding_box(&self) -> Option<Aabb> {
        const PAD: f64 = 0.0001;
        match self {
            Entity::Sphere { position, radius, .. } => Some(Aabb::new(
                *position - Vec3::new(*radius, *radius, *radius),
                *position + Vec3::new(*radius, *radius, *radius),
            )),
            Entity::PlaneXY { x0, x1, y0, y1, z, .. } => Some(Aabb::new(
                Vec3::new(*x0, *y0, z - PAD),
                Vec3::new(*x1, *y1, z + PAD),
            )),
            Entity::PlaneXZ { x0, x1, z0, z1, y, .. } => Some(Aabb::new(
                Vec3::new(*x0, y - PAD, *z0),
                Vec3::new(*x1, y + PAD, *z1),
            )),
            Entity::PlaneYZ { y0, y1, z0, z1, x, .. } => Some(Aabb::new(
                Vec3::new(x - PAD, *y0, *z0),
                Vec3::new(x + PAD, *y1, *z1),
            )),
            Entity::Triangle { a, b, c, .. } => {
                let min = Vec3::new(a.x.min(b.x).min(c.x), a.y.min(b.y).min(c.y), a.z.min(b.z).min(c.z));
                let max = Vec3::new(a.x.max(b.x).max(c.x), a.y.max(b.y).max(c.y), a.z.max(b.z).max(c.z));
                Some(Aabb::new(
                    min - Vec3::new(PAD, PAD, PAD),
                    max + Vec3::new(PAD, PAD, PAD),
                ))
            }
            Entity::Flip(entity) => entity.bounding_box(),
            Entity::Move { entity, offset } => {
                entity.bounding_box().map(|b| Aabb::new(b.min + *offset, b.max + *offset))
            }
            Entity::RotateY { aabb, .. } => *aabb,
            Entity::List(entities) => {
                let mut result: Option<Aabb> = None;
                for entity in entities {
                    let bbox = entity.bounding_box()?;
                    result = Some(match result {
                        Some(acc) => Aabb::enclose(acc, bbox),
                        None => bbox,
                    });
                }
                result
            }
            Entity::Bvh { aabb, .. } => Some(*aabb),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::shader::Shader;

    fn diffuse() -> Arc<Material> {
        Arc::new(Material::diffuse(Shader::Solid, Color::WHITE))
    }

    #[test]
    fn sphere_hit_from_outside_has_front_face() {
        let sphere = Entity::sphere(Vec3::zero(), 1.0, diffuse());
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let hit = sphere.ray_intersect(&ray, Range::new(0.0, f64::INFINITY)).unwrap();
        assert_eq!(hit.face, Face::Front);
        assert!((hit.t - 4.0).abs() < 1e-6);
        assert_eq!(hit.normal, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn sphere_bounding_box_is_centered_cube() {
        let sphere = Entity::sphere(Vec3::new(1.0, 2.0, 3.0), 2.0, diffuse());
        let bbox = sphere.bounding_box().unwrap();
        assert_eq!(bbox.min, Vec3::new(-1.0, 0.0, 1.0));
        assert_eq!(bbox.max, Vec3::new(3.0, 4.0, 5.0));
    }

    #[test]
    fn flip_inverts_face() {
        let sphere = Entity::sphere(Vec3::zero(), 1.0, diffuse());
        let flipped = Entity::flip(sphere);
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let hit = flipped.ray_intersect(&ray, Range::new(0.0, f64::INFINITY)).unwrap();
        assert_eq!(hit.face, Face::Back);
    }

    #[test]
    fn bvh_of_one_entity_matches_direct_hit() {
        let sphere = Entity::sphere(Vec3::zero(), 1.0, diffuse());
        let bvh = Entity::bvh(vec![sphere.clone()], &mut rand::thread_rng());
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let direct = sphere.ray_intersect(&ray, Range::new(0.0, f64::INFINITY)).unwrap();
        let via_bvh = bvh.ray_intersect(&ray, Range::new(0.0, f64::INFINITY)).unwrap();
        assert!((direct.t - via_bvh.t).abs() < 1e-6);
    }

    #[test]
    fn list_keeps_the_closest_hit() {
        let near = Entity::sphere(Vec3::new(0.0, 0.0, 2.0), 1.0, diffuse());
        let far = Entity::sphere(Vec3::new(0.0, 0.0, 10.0), 1.0, diffuse());
        let list = Entity::list(vec![far, near]);
        let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0));
        let hit = list.ray_intersect(&ray, Range::new(0.0, f64::INFINITY)).unwrap();
        assert!((hit.t - 1.0).abs() < 1e-6);
    }

    #[test]
    fn mesh_builds_one_triangle_per_three_vertices() {
        let verts = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(0.0, 1.0, 1.0),
        ];
        let mesh = Entity::mesh(&verts, diffuse());
        if let Entity::List(tris) = &*mesh {
            assert_eq!(tris.len(), 2);
        } else {
            panic!("expected a List");
        }
    }

    #[test]
    fn rotate_y_of_zero_degrees_is_near_identity() {
        let sphere = Entity::sphere(Vec3::new(0.0, 0.0, 2.0), 1.0, diffuse());
        let rotated = Entity::rotate_y(sphere.clone(), 0.0);
        let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0));
        let a = sphere.ray_intersect(&ray, Range::new(0.0, f64::INFINITY)).unwrap();
        let b = rotated.ray_intersect(&ray, Range::new(0.0, f64::INFINITY)).unwrap();
        assert!((a.t - b.t).abs() < 1e-6);
    }

    #[test]
    fn rotate_y_keeps_world_space_face_classification_for_a_nontrivial_angle() {
        let sphere = Entity::sphere(Vec3::zero(), 1.0, diffuse());
        let offset_sphere = Entity::move_by(sphere, Vec3::new(1.0, 0.0, 0.0));
        let rotated = Entity::rotate_y(offset_sphere, 90.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = rotated.ray_intersect(&ray, Range::new(0.0, f64::INFINITY)).unwrap();
        assert_eq!(hit.face, Face::Front);
        assert!(ray.direction.dot(hit.normal) < 0.0);
    }

    #[test]
    fn bvh_range_degrades_instead_of_panicking_on_a_boxless_primitive() {
        let degenerate = Arc::new(Entity::RotateY {
            entity: Entity::sphere(Vec3::zero(), 1.0, diffuse()),
            sin_theta: 0.0,
            cos_theta: 1.0,
            aabb: None,
        });
        let bvh = Entity::bvh(vec![degenerate], &mut rand::thread_rng());
        let bbox = bvh.bounding_box().unwrap();
        assert_eq!(bbox.min, Vec3::zero());
        assert_eq!(bbox.max, Vec3::zero());
    }
}
