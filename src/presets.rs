//! Named scene builders, translated 1:1 from the original renderer's
//! `cornell_box`/`basic_scene`/`random_scene`/`scene_cube`/`scene_mesh`
//! free functions.

use crate::camera::CameraConfig;
use crate::color::Color;
use crate::entity::Entity;
use crate::material::Material;
use crate::math::{randomf, randomf_range, Vec3};
use crate::perlin::Perlin;
use crate::shader::Shader;
use rand::Rng;
use std::path::PathBuf;
use std::sync::Arc;

/// A built scene: its geometry and the camera that frames it. Rays that
/// escape the scene without hitting anything return black, matching the
/// original renderer, which never modeled a sky.
pub struct Scene {
    pub entity: Arc<Entity>,
    pub camera_config: CameraConfig,
}

/// Selects one of the built-in scenes. `Mesh` additionally needs a
/// `--mesh-path` to know which OBJ file to load, since `clap::ValueEnum`
/// requires plain, fieldless variants.
#[derive(Debug, Clone, clap::ValueEnum)]
#[clap(rename_all = "kebab-case")]
pub enum ScenePreset {
    CornellBox,
    Basic,
    RandomSpheres,
    Cube,
    Mesh,
}

impl ScenePreset {
    pub fn build(&self, mesh_path: Option<&PathBuf>, rng: &mut impl Rng) -> Scene {
        match self {
            ScenePreset::CornellBox => cornell_box(rng),
            ScenePreset::Basic => basic_scene(rng),
            ScenePreset::RandomSpheres => random_scene(rng),
            ScenePreset::Cube => scene_cube(rng),
            ScenePreset::Mesh => {
                scene_mesh(mesh_path.expect("--mesh-path is required when --scene=mesh"))
            }
        }
    }
}

/// The classic Cornell box: five walls, an area light in the ceiling, and
/// two rotated boxes inside a nested BVH.
pub fn cornell_box(rng: &mut impl Rng) -> Scene {
    let red = Arc::new(Material::diffuse(Shader::Solid, Color::new(0.65, 0.05, 0.05)));
    let green = Arc::new(Material::diffuse(Shader::Solid, Color::new(0.12, 0.45, 0.15)));
    let white = Arc::new(Material::diffuse(Shader::Solid, Color::new(0.73, 0.73, 0.73)));
    let light = Arc::new(Material::light(Color::new(1.0, 0.878, 0.768) * 38.0));

    let mut world = vec![
        Entity::flip(Entity::plane_yz(0.0, 555.0, 0.0, 555.0, 555.0, red)),
        Entity::plane_yz(0.0, 555.0, 0.0, 555.0, 0.0, green),
        Entity::plane_xz(213.0, 343.0, 227.0, 332.0, 554.0, light),
        Entity::flip(Entity::plane_xz(0.0, 555.0, 0.0, 555.0, 555.0, white.clone())),
        Entity::plane_xz(0.0, 555.0, 0.0, 555.0, 0.0, white.clone()),
        Entity::flip(Entity::plane_xy(0.0, 555.0, 0.0, 555.0, 555.0, white.clone())),
    ];

    let box1 = Entity::boxed(Vec3::zero(), Vec3::new(165.0, 330.0, 165.0), white.clone());
    let box1 = Entity::rotate_y(box1, 15.0);
    let box1 = Entity::move_by(box1, Vec3::new(265.0, 0.0, 295.0));

    let box2 = Entity::boxed(Vec3::zero(), Vec3::new(165.0, 165.0, 165.0), white);
    let box2 = Entity::rotate_y(box2, -18.0);
    let box2 = Entity::move_by(box2, Vec3::new(130.0, 0.0, 65.0));

    world.push(Entity::bvh(vec![box1, box2], rng));

    Scene {
        entity: Entity::list(world),
        camera_config: CameraConfig {
            look_from: Vec3::new(278.0, 278.0, -800.0),
            look_at: Vec3::new(278.0, 278.0, 0.0),
            vup: Vec3::unit_y(),
            vfov_degrees: 40.0,
            aspect_ratio: 1.0,
            aperture: 0.0,
            focus_dist: 10.0,
        },
    }
}

/// A marbled sphere over a checkered ground, lit by a sphere light and a
/// small emissive plane.
pub fn basic_scene(rng: &mut impl Rng) -> Scene {
    let perlin = Arc::new(Perlin::new(rng));
    let marble = Arc::new(Material::diffuse(Shader::Marble(perlin), Color::BLACK));
    let checker = Arc::new(Material::diffuse(Shader::Checker, Color::BLACK));
    let light = Arc::new(Material::light(Color::WHITE * 4.0));

    let world = vec![
        Entity::sphere(Vec3::new(0.0, -1000.0, 0.0), 1000.0, checker),
        Entity::sphere(Vec3::new(0.0, 2.0, 0.0), 2.0, marble),
        Entity::sphere(Vec3::new(0.0, 7.0, 0.0), 2.0, light.clone()),
        Entity::plane_yz(3.0, 5.0, 1.0, 3.0, -2.0, light),
    ];

    Scene {
        entity: Entity::list(world),
        camera_config: CameraConfig {
            look_from: Vec3::new(13.0, 4.0, 6.0),
            look_at: Vec3::new(0.0, 1.0, 0.0),
            vup: Vec3::unit_y(),
            vfov_degrees: 30.0,
            aspect_ratio: 16.0 / 9.0,
            aperture: 0.0,
            focus_dist: 12.0,
        },
    }
}

/// The "random spheres" showcase: a checkered ground, a field of small
/// randomly-materialed spheres accelerated by a BVH, and three hero spheres.
pub fn random_scene(rng: &mut impl Rng) -> Scene {
    let ground = Arc::new(Material::diffuse(Shader::Checker, Color::new(0.03, 0.01, 0.05)));
    let mut world = vec![Entity::sphere(Vec3::new(0.0, -1000.0, 0.0), 1000.0, ground)];

    let mut small_spheres = Vec::new();
    for a in -11..11 {
        for b in -11..11 {
            let rmat = randomf(rng);
            let center = Vec3::new(
                a as f64 + 0.9 * randomf(rng),
                0.2,
                b as f64 + 0.9 * randomf(rng),
            );
            if (center - Vec3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            let material = if rmat < 0.8 {
                Arc::new(Material::diffuse(Shader::Solid, Color::random(rng) * Color::random(rng)))
            } else if rmat < 0.95 {
                let albedo = Color::random_range(rng, 0.5, 1.0);
                let rough = randomf_range(rng, 0.0, 0.5);
                Arc::new(Material::metal(albedo, rough))
            } else {
                Arc::new(Material::dielectric(1.5))
            };
            small_spheres.push(Entity::sphere(center, 0.2, material));
        }
    }
    world.push(Entity::bvh(small_spheres, rng));

    world.push(Entity::sphere(Vec3::new(0.0, 1.0, 0.0), 1.0, Arc::new(Material::dielectric(1.5))));
    world.push(Entity::sphere(
        Vec3::new(-4.0, 1.0, 0.0),
        1.0,
        Arc::new(Material::diffuse(Shader::Solid, Color::RED)),
    ));
    world.push(Entity::sphere(
        Vec3::new(4.0, 1.0, 0.0),
        1.0,
        Arc::new(Material::metal(Color::new(0.7, 0.6, 0.5), 0.0)),
    ));

    Scene {
        entity: Entity::list(world),
        camera_config: CameraConfig {
            look_from: Vec3::new(13.0, 2.0, 3.0),
            look_at: Vec3::zero(),
            vup: Vec3::unit_y(),
            vfov_degrees: 20.0,
            aspect_ratio: 16.0 / 9.0,
            aperture: 0.1,
            focus_dist: 10.0,
        },
    }
}

/// A single hand-authored marbled cube, built as a `Mesh` from twelve
/// triangles (36 flat vertices, two per face).
pub fn scene_cube(rng: &mut impl Rng) -> Scene {
    let v = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.891838, 1.199458, -0.954319),
        Vec3::new(0.891838, -0.800542, -0.954319),
        Vec3::new(0.891838, 1.199458, 1.045681),
        Vec3::new(0.891838, -0.800542, 1.045681),
        Vec3::new(-1.108162, 1.199458, -0.954319),
        Vec3::new(-1.108162, -0.800542, -0.954319),
        Vec3::new(-1.108162, 1.199458, 1.045681),
        Vec3::new(-1.108162, -0.800542, 1.045681),
    ];

    let verts = [
        v[5], v[3], v[1], v[3], v[8], v[4], v[7], v[6], v[8], v[2], v[8], v[6], v[1], v[4], v[2],
        v[5], v[2], v[6], v[5], v[7], v[3], v[3], v[7], v[8], v[7], v[5], v[6], v[2], v[4], v[8],
        v[1], v[3], v[4], v[5], v[1], v[2],
    ];

    let perlin = Arc::new(Perlin::new(rng));
    let marble = Arc::new(Material::diffuse(
        Shader::Marble(perlin),
        Color::new(0.73, 0.73, 0.73),
    ));

    Scene {
        entity: Entity::mesh(&verts, marble),
        camera_config: CameraConfig {
            look_from: Vec3::new(3.0, 2.0, -4.0),
            look_at: Vec3::zero(),
            vup: Vec3::unit_y(),
            vfov_degrees: 40.0,
            aspect_ratio: 1.0,
            aperture: 0.0,
            focus_dist: 5.0,
        },
    }
}

/// Loads an external OBJ mesh and places it over a checkered metal ground,
/// matching the original's `scene_mesh`.
pub fn scene_mesh(path: &PathBuf) -> Scene {
    let verts = crate::obj::read_obj(path);
    let white = Arc::new(Material::diffuse(Shader::Solid, Color::WHITE));
    let ground = Arc::new(Material::metal(Color::BLACK, 0.0));

    let world = vec![
        Entity::mesh(&verts, white),
        Entity::plane_xz(-555.0, 555.0, -555.0, 555.0, -1.0, ground),
    ];

    Scene {
        entity: Entity::list(world),
        camera_config: CameraConfig {
            look_from: Vec3::new(0.0, 2.0, -6.0),
            look_at: Vec3::zero(),
            vup: Vec3::unit_y(),
            vfov_degrees: 40.0,
            aspect_ratio: 1.0,
            aperture: 0.0,
            focus_dist: 6.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Range, Ray};

    #[test]
    fn cornell_box_has_a_bounding_box_covering_the_room() {
        let scene = cornell_box(&mut rand::thread_rng());
        let bbox = scene.entity.bounding_box().unwrap();
        assert!(bbox.min.x <= 0.0 && bbox.max.x >= 555.0);
    }

    #[test]
    fn basic_scene_light_sphere_is_hit_dead_center() {
        let scene = basic_scene(&mut rand::thread_rng());
        let ray = Ray::new(Vec3::new(0.0, 7.0, -10.0), Vec3::new(0.0, 0.0, 1.0));
        let hit = scene
            .entity
            .ray_intersect(&ray, Range::new(0.0, f64::INFINITY))
            .unwrap();
        assert!((hit.t - 8.0).abs() < 1e-6);
    }

    #[test]
    fn random_scene_builds_more_than_the_three_hero_spheres() {
        let scene = random_scene(&mut rand::thread_rng());
        assert!(scene.entity.bounding_box().is_some());
    }

    #[test]
    fn scene_cube_mesh_has_twelve_triangles() {
        let scene = scene_cube(&mut rand::thread_rng());
        if let Entity::List(tris) = &*scene.entity {
            assert_eq!(tris.len(), 12);
        } else {
            panic!("expected scene_cube to build a flat triangle list");
        }
    }

    #[test]
    fn same_seed_builds_a_scene_with_the_same_bounding_box() {
        use rand::SeedableRng;
        use rand::rngs::SmallRng;
        let a = random_scene(&mut SmallRng::seed_from_u64(7));
        let b = random_scene(&mut SmallRng::seed_from_u64(7));
        let box_a = a.entity.bounding_box().unwrap();
        let box_b = b.entity.bounding_box().unwrap();
        assert_eq!(box_a.min, box_b.min);
        assert_eq!(box_a.max, box_b.max);
    }
}
