//! # neonray-rs
//!
//! An offline, physically based Monte Carlo path tracer. Given a scene
//! preset and a resolution/sample/depth budget, renders to an uncompressed
//! BMP, flushing progress to disk after every horizontal tile.
//!
//! ## Rendering equation
//!
//! ```text
//!   L_o(p, w_o) = L_e(p, w_o) + f_r(p, w_i, w_o) * L_i(p, w_i) * |cos theta_i|
//! ```
//!
//! Each material's `scatter` importance-samples its own BRDF lobe, and the
//! integrator recursively traces the scattered ray to evaluate `L_i`.

mod aabb;
mod bitmap;
mod camera;
mod color;
mod entity;
mod error;
mod hit;
mod material;
mod math;
mod obj;
mod perlin;
mod presets;
mod renderer;
mod shader;
mod texture;

use camera::Camera;
use clap::Parser;
use presets::ScenePreset;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use renderer::{RenderConfig, Renderer};
use std::path::PathBuf;
use texture::Texture;

/// neonray-rs -- an offline Monte Carlo path tracer
#[derive(Parser, Debug)]
#[command(
    name = "neonray-rs",
    version,
    about = "An offline, physically based Monte Carlo path tracer",
    after_help = "EXAMPLES:\n  \
                  neonray-rs --scene cornell-box --spp 500 --depth 20\n  \
                  neonray-rs --scene random-spheres --width 1280 --height 720\n  \
                  neonray-rs --scene mesh --mesh-path teapot.obj --output teapot.bmp"
)]
struct Cli {
    /// Scene preset to render
    #[arg(short, long, value_enum, default_value_t = presets::ScenePreset::CornellBox)]
    scene: ScenePreset,

    /// Path to an OBJ file, required when `--scene mesh` is selected
    #[arg(long)]
    mesh_path: Option<PathBuf>,

    /// Output image width in pixels
    #[arg(short = 'W', long, default_value_t = 720)]
    width: u32,

    /// Output image height in pixels
    #[arg(short = 'H', long, default_value_t = 720)]
    height: u32,

    /// Samples per pixel. Higher reduces noise at the cost of render time.
    #[arg(long, default_value_t = 200)]
    spp: u32,

    /// Maximum ray bounce depth
    #[arg(long, default_value_t = 20)]
    depth: u32,

    /// Worker thread count. Defaults to the available parallelism.
    #[arg(long)]
    threads: Option<usize>,

    /// Rows per progressive tile
    #[arg(long, default_value_t = 64)]
    chunk_size: usize,

    /// Output BMP path
    #[arg(short, long, default_value = "tex.bmp")]
    output: PathBuf,

    /// PRNG seed. Scene construction and every render worker's sample
    /// stream are reproducible given the same seed and thread count.
    #[arg(long, default_value_t = 1018)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init()
        .ok();

    let cli = Cli::parse();

    let mut build_rng = SmallRng::seed_from_u64(cli.seed);
    let scene = cli.scene.build(cli.mesh_path.as_ref(), &mut build_rng);
    let camera_config = camera::CameraConfig {
        aspect_ratio: cli.width as f64 / cli.height as f64,
        ..scene.camera_config
    };
    let camera = Camera::new(&camera_config);

    let config = RenderConfig {
        aa_samples: cli.spp,
        max_depth: cli.depth,
        threads: cli
            .threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)),
        chunk_size: cli.chunk_size,
        output_path: cli.output,
    };

    tracing::info!(width = cli.width, height = cli.height, spp = cli.spp, seed = cli.seed, "starting render");

    let mut tex = Texture::new(cli.width as usize, cli.height as usize);
    let mut renderer = Renderer::new(config, build_rng);
    renderer.render_progressive(&camera, &scene.entity, &mut tex)?;

    Ok(())
}
