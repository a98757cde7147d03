//! 256-point permuted gradient lattice noise, with a fractal turbulence
//! variant, used by the `noise` and `marble` procedural shaders.

use crate::math::{random_int, randomf_range, Vec3};
use rand::Rng;

const POINT_COUNT: usize = 256;

pub struct Perlin {
    values: [Vec3; POINT_COUNT],
    perm_x: [usize; POINT_COUNT],
    perm_y: [usize; POINT_COUNT],
    perm_z: [usize; POINT_COUNT],
}

impl Perlin {
    pub fn new(rng: &mut impl Rng) -> Self {
        let mut values = [Vec3::zero(); POINT_COUNT];
        for v in values.iter_mut() {
            *v = Vec3::new(
                randomf_range(rng, -1.0, 1.0),
                randomf_range(rng, -1.0, 1.0),
                randomf_range(rng, -1.0, 1.0),
            )
            .normalized();
        }
        Self {
            values,
            perm_x: Self::generate_permutation(rng),
            perm_y: Self::generate_permutation(rng),
            perm_z: Self::generate_permutation(rng),
        }
    }

    fn generate_permutation(rng: &mut impl Rng) -> [usize; POINT_COUNT] {
        let mut p = [0usize; POINT_COUNT];
        for (i, slot) in p.iter_mut().enumerate() {
            *slot = i;
        }
        for i in (1..POINT_COUNT).rev() {
            let target = random_int(rng, 0, i as i64) as usize;
            p.swap(i, target);
        }
        p
    }

    pub fn noise(&self, p: Vec3) -> f64 {
        let u = p.x - p.x.floor();
        let v = p.y - p.y.floor();
        let w = p.z - p.z.floor();

        let i = p.x.floor() as i64;
        let j = p.y.floor() as i64;
        let k = p.z.floor() as i64;

        let mut c = [[[Vec3::zero(); 2]; 2]; 2];
        for di in 0..2 {
            for dj in 0..2 {
                for dk in 0..2 {
                    let x = self.perm_x[((i + di as i64) & 255) as usize];
                    let y = self.perm_y[((j + dj as i64) & 255) as usize];
                    let z = self.perm_z[((k + dk as i64) & 255) as usize];
                    c[di][dj][dk] = self.values[x ^ y ^ z];
                }
            }
        }
        Self::trilinear_interp(c, u, v, w)
    }

    fn trilinear_interp(c: [[[Vec3; 2]; 2]; 2], u: f64, v: f64, w: f64) -> f64 {
        let uu = u * u * (3.0 - 2.0 * u);
        let vv = v * v * (3.0 - 2.0 * v);
        let ww = w * w * (3.0 - 2.0 * w);

        let mut acc = 0.0;
        for i in 0..2 {
            for j in 0..2 {
                for k in 0..2 {
                    let fi = i as f64;
                    let fj = j as f64;
                    let fk = k as f64;
                    let weight = Vec3::new(u - fi, v - fj, w - fk);
                    acc += (fi * uu + (1.0 - fi) * (1.0 - uu))
                        * (fj * vv + (1.0 - fj) * (1.0 - vv))
                        * (fk * ww + (1.0 - fk) * (1.0 - ww))
                        * c[i][j][k].dot(weight);
                }
            }
        }
        acc
    }

    /// Fractal sum of `noise(2^i * p) * 0.5^i` for `i in 0..depth`, absolute value.
    pub fn turb(&self, p: Vec3, depth: u32) -> f64 {
        let mut acc = 0.0;
        let mut weight = 1.0;
        let mut point = p;
        for _ in 0..depth {
            acc += weight * self.noise(point);
            weight *= 0.5;
            point = point * 2.0;
        }
        acc.abs()
    }
}
