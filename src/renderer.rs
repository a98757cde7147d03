//! The recursive path integrator and the tiled, multithreaded, progressive
//! renderer that drives it across an image.

use crate::camera::Camera;
use crate::color::Color;
use crate::entity::Entity;
use crate::error::RenderError;
use crate::math::{randomf, random_int, Range, Ray, MIN_DIST};
use crate::texture::Texture;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

/// A horizontal strip of the final image: `offset_y` locates it within the
/// full frame, `width`/`image_height` are the full frame's dimensions (used
/// to map local pixel coordinates to `(u, v) in [0,1]^2`).
#[derive(Clone, Copy)]
struct RenderChunk {
    offset_y: usize,
    width: usize,
    image_height: usize,
}

struct RenderJob {
    tid: usize,
    aa_samples: u32,
    max_depth: u32,
    chunk: RenderChunk,
    seed: u64,
}

/// Renderer configuration: sample count, recursion depth, and the tiling
/// and threading parameters of the progressive renderer.
pub struct RenderConfig {
    pub aa_samples: u32,
    pub max_depth: u32,
    pub threads: usize,
    pub chunk_size: usize,
    pub output_path: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            aa_samples: 100,
            max_depth: 20,
            threads: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4),
            chunk_size: 64,
            output_path: PathBuf::from("tex.bmp"),
        }
    }
}

/// Drives the render. `driver_rng` continues the same seeded stream used
/// for scene construction; every job's own `SmallRng` is seeded from a
/// 16-bit integer drawn off this driver, so a render is fully reproducible
/// given `(seed, tile_order, thread_count)`.
pub struct Renderer {
    config: RenderConfig,
    driver_rng: SmallRng,
}

impl Renderer {
    pub fn new(config: RenderConfig, driver_rng: SmallRng) -> Self {
        Self { config, driver_rng }
    }

    /// Recursively traces a ray through the scene. Returns `bg` on a miss,
    /// black once `depth` is exhausted, and otherwise the material's
    /// emission plus its attenuated contribution from the scattered ray.
    pub fn trace_ray(rng: &mut impl Rng, ray: &Ray, bg: Color, entity: &Entity, depth: u32) -> Color {
        if depth == 0 {
            return Color::BLACK;
        }
        let hit = match entity.ray_intersect(ray, Range::new(MIN_DIST, f64::INFINITY)) {
            Some(hit) => hit,
            None => return bg,
        };

        let emitted = hit.material.emitted();
        match hit.material.scatter(rng, ray, &hit) {
            Some((attenuation, scattered)) => {
                emitted + attenuation * Self::trace_ray(rng, &scattered, bg, entity, depth - 1)
            }
            None => emitted,
        }
    }

    fn render_job(camera: &Camera, entity: &Entity, tex: &mut Texture, job: &RenderJob) {
        let mut rng = SmallRng::seed_from_u64(job.seed);
        let bg = Color::BLACK;
        let width = tex.width();
        let height = tex.height();
        let v_denom = (job.chunk.image_height as f64) - 1.0;

        for y in 0..height {
            for x in 0..width {
                let mut color = Color::BLACK;
                for _ in 0..job.aa_samples {
                    let u = (x as f64 + randomf(&mut rng)) / (job.chunk.width as f64 - 1.0);
                    let v = (y + job.chunk.offset_y) as f64 + randomf(&mut rng);
                    let v = v / v_denom;
                    let ray = camera.ray_from_view(&mut rng, u, v);
                    color = color + Self::trace_ray(&mut rng, &ray, bg, entity, job.max_depth);
                }
                color = Color::gamma2(color, 1.0 / job.aa_samples as f64);
                tex.write_pixel(x, y, color);
            }
            if job.tid == 0 && y % 10 == 0 {
                let progress =
                    (y + job.chunk.offset_y) as f64 / job.chunk.image_height as f64 * 100.0;
                tracing::info!(progress = progress as u32, "rendering");
            }
        }
    }

    /// Averages the main thread's result with each worker's, weighted by
    /// the sample count each one actually traced. The original renderer
    /// averaged unconditionally, which is only correct when every job
    /// traces the same number of samples.
    fn blend(dst: &mut Texture, weighted: &[(Texture, u32)], dst_samples: u32) {
        let total: u32 = dst_samples + weighted.iter().map(|(_, n)| n).sum::<u32>();
        for y in 0..dst.height() {
            for x in 0..dst.width() {
                let mut pixel = dst.read_pixel(x, y) * dst_samples as f64;
                for (tex, samples) in weighted {
                    pixel = pixel + tex.read_pixel(x, y) * (*samples as f64);
                }
                dst.write_pixel(x, y, pixel * (1.0 / total as f64));
            }
        }
    }

    fn render_chunk(&mut self, camera: &Camera, entity: &Arc<Entity>, tex: &mut Texture, chunk: RenderChunk) {
        let n = self.config.threads.min(self.config.aa_samples as usize).max(1);
        let main_seed = random_int(&mut self.driver_rng, 0, 0xffff) as u64;
        if n <= 1 {
            let job = RenderJob {
                tid: 0,
                aa_samples: self.config.aa_samples,
                max_depth: self.config.max_depth,
                chunk,
                seed: main_seed,
            };
            Self::render_job(camera, entity, tex, &job);
            return;
        }

        let chunk_samples = self.config.aa_samples / n as u32;
        let rem = self.config.aa_samples % n as u32;

        let worker_seeds: Vec<u64> = (1..n)
            .map(|_| random_int(&mut self.driver_rng, 0, 0xffff) as u64)
            .collect();

        let workers: Vec<_> = (1..n)
            .zip(worker_seeds)
            .map(|(tid, seed)| {
                let mut worker_tex = Texture::new(tex.width(), tex.height());
                let entity = entity.clone();
                let camera = *camera;
                let job = RenderJob {
                    tid,
                    aa_samples: chunk_samples,
                    max_depth: self.config.max_depth,
                    chunk,
                    seed,
                };
                thread::spawn(move || {
                    Self::render_job(&camera, &entity, &mut worker_tex, &job);
                    (worker_tex, chunk_samples)
                })
            })
            .collect();

        let main_job = RenderJob {
            tid: 0,
            aa_samples: chunk_samples + rem,
            max_depth: self.config.max_depth,
            chunk,
            seed: main_seed,
        };
        Self::render_job(camera, entity, tex, &main_job);

        let results: Vec<(Texture, u32)> = workers
            .into_iter()
            .map(|w| w.join().expect("render worker panicked"))
            .collect();

        Self::blend(tex, &results, chunk_samples + rem);
    }

    /// Renders the whole image in a single pass (no progressive BMP flushes).
    pub fn render(&mut self, camera: &Camera, entity: &Arc<Entity>, tex: &mut Texture) {
        let chunk = RenderChunk {
            offset_y: 0,
            width: tex.width(),
            image_height: tex.height(),
        };
        self.render_chunk(camera, entity, tex, chunk);
    }

    /// Renders in horizontal tiles of `chunk_size` rows, writing the
    /// accumulated image to `output_path` after every tile so the result
    /// can be watched as it progresses.
    pub fn render_progressive(
        &mut self,
        camera: &Camera,
        entity: &Arc<Entity>,
        render_tex: &mut Texture,
    ) -> Result<(), RenderError> {
        let width = render_tex.width();
        let image_height = render_tex.height();
        let chunk_size = self.config.chunk_size.max(1);
        let chunks = image_height / chunk_size;
        let rem = image_height % chunk_size;

        let mut buffer = Texture::new(width, chunk_size + rem);
        let chunk = RenderChunk {
            offset_y: 0,
            width,
            image_height,
        };
        self.render_chunk(camera, entity, &mut buffer, chunk);
        Texture::paste(render_tex, &buffer, 0, 0);
        crate::bitmap::write_bmp(&self.config.output_path, render_tex)?;

        let mut buffer = Texture::new(width, chunk_size);
        for i in 1..chunks {
            let offset_y = i * chunk_size + rem;
            let chunk = RenderChunk {
                offset_y,
                width,
                image_height,
            };
            self.render_chunk(camera, entity, &mut buffer, chunk);
            Texture::paste(render_tex, &buffer, 0, offset_y);
            crate::bitmap::write_bmp(&self.config.output_path, render_tex)?;
        }

        tracing::info!("render complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::material::Material;
    use crate::math::Vec3;
    use crate::shader::Shader;

    #[test]
    fn trace_ray_returns_black_at_zero_depth() {
        let entity = Entity::sphere(
            Vec3::zero(),
            1.0,
            Arc::new(Material::diffuse(Shader::Solid, Color::WHITE)),
        );
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let color = Renderer::trace_ray(&mut rand::thread_rng(), &ray, Color::RED, &entity, 0);
        assert_eq!(color, Color::BLACK);
    }

    #[test]
    fn trace_ray_returns_background_on_miss() {
        let entity = Entity::sphere(
            Vec3::new(100.0, 100.0, 100.0),
            1.0,
            Arc::new(Material::diffuse(Shader::Solid, Color::WHITE)),
        );
        let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0));
        let color = Renderer::trace_ray(&mut rand::thread_rng(), &ray, Color::RED, &entity, 5);
        assert_eq!(color, Color::RED);
    }

    #[test]
    fn trace_ray_returns_emission_for_a_light_hit_head_on() {
        let entity = Entity::sphere(
            Vec3::new(0.0, 0.0, 5.0),
            1.0,
            Arc::new(Material::light(Color::WHITE)),
        );
        let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0));
        let color = Renderer::trace_ray(&mut rand::thread_rng(), &ray, Color::BLACK, &entity, 5);
        assert_eq!(color, Color::WHITE);
    }

    #[test]
    fn same_seed_renders_bit_identical_images() {
        let entity = Entity::list(vec![Entity::sphere(
            Vec3::new(0.0, 0.0, 2.0),
            1.0,
            Arc::new(Material::diffuse(Shader::Solid, Color::new(0.6, 0.2, 0.2))),
        )]);
        let camera = Camera::new(&crate::camera::CameraConfig {
            look_from: Vec3::zero(),
            look_at: Vec3::new(0.0, 0.0, 1.0),
            vup: Vec3::unit_y(),
            vfov_degrees: 60.0,
            aspect_ratio: 1.0,
            aperture: 0.0,
            focus_dist: 2.0,
        });

        let render = |seed: u64| {
            let config = RenderConfig {
                aa_samples: 4,
                max_depth: 4,
                threads: 2,
                chunk_size: 4,
                output_path: std::env::temp_dir().join(format!("neonray_seed_test_{seed}.bmp")),
            };
            let mut renderer = Renderer::new(config, SmallRng::seed_from_u64(seed));
            let mut tex = Texture::new(4, 4);
            renderer.render(&camera, &entity, &mut tex);
            tex
        };

        let a = render(99);
        let b = render(99);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(a.read_pixel(x, y), b.read_pixel(x, y));
            }
        }
    }
}
