//! The ray/surface intersection record shared by every [`crate::entity::Entity`]
//! and [`crate::material::Material`].

use crate::material::Material;
use crate::math::Vec3;
use std::sync::Arc;

/// Which side of the surface the ray arrived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Front,
    Back,
}

impl Face {
    /// Classifies a geometric normal against the incoming ray direction,
    /// returning the outward-facing normal alongside the classification.
    pub fn resolve(ray_direction: Vec3, outward_normal: Vec3) -> (Face, Vec3) {
        if ray_direction.dot(outward_normal) < 0.0 {
            (Face::Front, outward_normal)
        } else {
            (Face::Back, -outward_normal)
        }
    }
}

/// A single ray/surface intersection.
#[derive(Clone)]
pub struct Hit {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec3,
    pub t: f64,
    pub face: Face,
    pub material: Arc<Material>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_flips_normal_on_back_face() {
        let (face, normal) = Face::resolve(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(face, Face::Back);
        assert_eq!(normal, Vec3::new(0.0, 0.0, -1.0));

        let (face, normal) = Face::resolve(Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(face, Face::Front);
        assert_eq!(normal, Vec3::new(0.0, 0.0, 1.0));
    }
}
