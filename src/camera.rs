//! A thin-lens camera: an orthonormal view basis plus depth-of-field jitter
//! sampled from a unit disk.

use crate::math::{Point3, Ray, Vec3};
use rand::Rng;

/// Camera construction parameters, mirroring the constructor arguments of
/// the original look-from/look-at/vfov/aperture camera.
pub struct CameraConfig {
    pub look_from: Point3,
    pub look_at: Point3,
    pub vup: Vec3,
    pub vfov_degrees: f64,
    pub aspect_ratio: f64,
    pub aperture: f64,
    pub focus_dist: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            look_from: Point3::new(278.0, 278.0, -800.0),
            look_at: Point3::new(278.0, 278.0, 0.0),
            vup: Vec3::unit_y(),
            vfov_degrees: 40.0,
            aspect_ratio: 1.0,
            aperture: 0.0,
            focus_dist: 10.0,
        }
    }
}

/// A thin-lens camera. `get_ray` maps view-plane coordinates `(s, t) in
/// [0,1]^2` to a primary ray, jittering the origin across a lens disk of
/// radius `aperture/2` when depth of field is enabled.
#[derive(Clone, Copy)]
pub struct Camera {
    position: Point3,
    lower_left: Point3,
    h_plane: Vec3,
    v_plane: Vec3,
    u: Vec3,
    v: Vec3,
    lens_radius: f64,
}

impl Camera {
    pub fn new(config: &CameraConfig) -> Self {
        let theta = config.vfov_degrees.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h;
        let viewport_width = viewport_height * config.aspect_ratio;

        let w = (config.look_from - config.look_at).normalized();
        let u = config.vup.cross(w).normalized();
        let v = w.cross(u);

        let h_plane = u * (viewport_width * config.focus_dist);
        let v_plane = v * (viewport_height * config.focus_dist);
        let lower_left =
            config.look_from - h_plane * 0.5 - v_plane * 0.5 - w * config.focus_dist;

        Camera {
            position: config.look_from,
            lower_left,
            h_plane,
            v_plane,
            u,
            v,
            lens_radius: config.aperture / 2.0,
        }
    }

    pub fn ray_from_view(&self, rng: &mut impl Rng, s: f64, t: f64) -> Ray {
        let r = Vec3::random_in_unit_circle(rng) * self.lens_radius;
        let offset = self.u * r.x + self.v * r.y;
        Ray::new(
            self.position + offset,
            self.lower_left + self.h_plane * s + self.v_plane * t - self.position - offset,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_ray_with_no_aperture_points_at_lookat() {
        let config = CameraConfig {
            look_from: Point3::new(0.0, 0.0, 5.0),
            look_at: Point3::zero(),
            vup: Vec3::unit_y(),
            vfov_degrees: 90.0,
            aspect_ratio: 1.0,
            aperture: 0.0,
            focus_dist: 5.0,
        };
        let camera = Camera::new(&config);
        let ray = camera.ray_from_view(&mut rand::thread_rng(), 0.5, 0.5);
        assert_eq!(ray.origin, config.look_from);
        let direction = ray.direction.normalized();
        let expected = (config.look_at - config.look_from).normalized();
        assert!((direction - expected).length() < 1e-4);
    }

    #[test]
    fn zero_aperture_never_jitters_origin() {
        let config = CameraConfig::default();
        let camera = Camera::new(&config);
        for _ in 0..16 {
            let ray = camera.ray_from_view(&mut rand::thread_rng(), 0.2, 0.8);
            assert_eq!(ray.origin, config.look_from);
        }
    }
}
