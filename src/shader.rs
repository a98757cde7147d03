//! Procedural surface shaders: pure functions from a surface-interaction
//! record to a color, used by [`crate::material::Material::Diffuse`].

use crate::color::Color;
use crate::math::Vec3;
use crate::perlin::Perlin;
use std::sync::Arc;

/// Shader input: UV, world-space position, and the material's base albedo.
#[derive(Debug, Clone, Copy)]
pub struct ShaderInput {
    pub uv: Vec3,
    pub position: Vec3,
    pub albedo: Color,
}

/// A closed set of procedural surface shaders. `Noise` and `Marble` carry a
/// shared lattice so every shader in a scene samples the same gradients.
#[derive(Clone)]
pub enum Shader {
    Solid,
    Checker,
    Xor,
    Noise(Arc<Perlin>),
    Marble(Arc<Perlin>),
}

impl Shader {
    pub fn eval(&self, input: ShaderInput) -> Color {
        match self {
            Shader::Solid => input.albedo,
            Shader::Checker => {
                let p = input.position * 6.0;
                let s = p.x.sin() * p.y.sin() * p.z.sin();
                if s < 0.0 {
                    input.albedo
                } else {
                    Color::WHITE
                }
            }
            Shader::Xor => {
                let u = (input.uv.x * 255.0) as i64;
                let v = (input.uv.y * 255.0) as i64;
                let value = (u ^ v) as f64 / 255.0;
                input.albedo * value
            }
            Shader::Noise(perlin) => {
                Color::WHITE * 0.5 * (1.0 + perlin.noise(input.position * 4.0))
            }
            Shader::Marble(perlin) => {
                let n = (4.0 * input.position.z + 10.0 * perlin.turb(input.position, 7)).sin();
                Color::WHITE * 0.5 * (1.0 + n)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(uv: Vec3, position: Vec3, albedo: Color) -> ShaderInput {
        ShaderInput {
            uv,
            position,
            albedo,
        }
    }

    #[test]
    fn solid_returns_albedo_unchanged() {
        let albedo = Color::new(0.2, 0.4, 0.6);
        let got = Shader::Solid.eval(input(Vec3::zero(), Vec3::zero(), albedo));
        assert_eq!(got, albedo);
    }

    #[test]
    fn xor_shader_is_zero_when_uv_coordinates_match() {
        let albedo = Color::new(1.0, 1.0, 1.0);
        let got = Shader::Xor.eval(input(Vec3::new(0.5, 0.5, 0.0), Vec3::zero(), albedo));
        assert_eq!(got, Color::BLACK);
    }

    #[test]
    fn noise_shader_is_bounded() {
        let perlin = Arc::new(Perlin::new(&mut rand::thread_rng()));
        let shader = Shader::Noise(perlin);
        let c = shader.eval(input(Vec3::zero(), Vec3::new(1.3, -0.2, 0.8), Color::WHITE));
        assert!(c.r >= -1.0 && c.r <= 2.0);
    }
}
