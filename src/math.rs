//! Scalar helpers, the 3-component vector type, rays, and numeric ranges.
//!
//! This is the leaf layer of the path tracer: every other module builds on
//! `Vec3`, `Ray`, and `Range`. Every randomness-consuming function here
//! takes its PRNG state as an explicit `&mut impl Rng` argument rather than
//! reaching for a thread-local generator, so a render worker's stream is
//! fully determined by the seed it was handed at job start.

use rand::Rng;
use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Index, Mul, MulAssign, Neg, Sub};

/// Distance below which two `Vec3`s are considered equal, and below which
/// a vector is treated as degenerate for normalization purposes.
pub const EPSILON: f64 = 1e-5;

pub const PI: f64 = std::f64::consts::PI;

#[inline(always)]
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.clamp(min, max)
}

#[inline(always)]
pub fn clamp01(value: f64) -> f64 {
    clamp(value, 0.0, 1.0)
}

#[inline(always)]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// Uniform real in `[0, 1)`.
#[inline]
pub fn randomf(rng: &mut impl Rng) -> f64 {
    rng.gen_range(0.0..1.0)
}

/// Uniform real in `[lo, hi)`.
#[inline]
pub fn randomf_range(rng: &mut impl Rng, lo: f64, hi: f64) -> f64 {
    lo + (hi - lo) * randomf(rng)
}

/// Uniform integer in the closed range `[lo, hi]`.
#[inline]
pub fn random_int(rng: &mut impl Rng, lo: i64, hi: i64) -> i64 {
    randomf_range(rng, lo as f64, hi as f64 + 1.0) as i64
}

/// A 3-component vector used for positions, directions, and (via [`crate::color::Color`]) colors.
#[derive(Debug, Clone, Copy)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

pub type Point3 = Vec3;

impl Vec3 {
    #[inline(always)]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline(always)]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    #[inline(always)]
    pub const fn ones() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    #[inline(always)]
    pub const fn unit_y() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    #[inline(always)]
    pub fn length_squared(self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    #[inline(always)]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Returns the unit vector, or `self` unchanged when `length() <= EPSILON`.
    #[inline(always)]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > EPSILON {
            self / len
        } else {
            self
        }
    }

    #[inline(always)]
    pub fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[inline(always)]
    pub fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    /// Componentwise (Hadamard) product.
    #[inline(always)]
    pub fn hadamard(self, rhs: Self) -> Self {
        Self::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z)
    }

    #[inline(always)]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = clamp01(t);
        self + (other - self) * t
    }

    /// Specular reflection of `self` about the surface normal `n`: `R = V - 2*dot(V,N)*N`.
    #[inline(always)]
    pub fn reflect(self, normal: Self) -> Self {
        self - normal * 2.0 * self.dot(normal)
    }

    /// Snell's-law refraction. `eta_ratio` is `etai/etat`. Assumes `self` and
    /// `normal` are unit-length and TIR has already been ruled out by the caller.
    #[inline]
    pub fn refract(self, normal: Self, eta_ratio: f64) -> Self {
        let cos_theta = (-self).dot(normal).min(1.0);
        let r_perp = (self + normal * cos_theta) * eta_ratio;
        let r_parallel = normal * -((1.0 - r_perp.length_squared()).abs().sqrt());
        r_perp + r_parallel
    }

    /// Rejection-sampled uniform point inside the unit sphere.
    pub fn random_in_unit_sphere(rng: &mut impl Rng) -> Self {
        loop {
            let v = Self::new(
                randomf_range(rng, -1.0, 1.0),
                randomf_range(rng, -1.0, 1.0),
                randomf_range(rng, -1.0, 1.0),
            );
            if v.length_squared() < 1.0 {
                return v;
            }
        }
    }

    /// Rejection-sampled uniform point on the unit disk (z = 0).
    pub fn random_in_unit_circle(rng: &mut impl Rng) -> Self {
        loop {
            let v = Self::new(randomf_range(rng, -1.0, 1.0), randomf_range(rng, -1.0, 1.0), 0.0);
            if v.length_squared() < 1.0 {
                return v;
            }
        }
    }

    /// Analytic uniform sample on the unit sphere surface.
    pub fn random_lambertian(rng: &mut impl Rng) -> Self {
        let a = randomf_range(rng, 0.0, 2.0 * PI);
        let z = randomf_range(rng, -1.0, 1.0);
        let r = (1.0 - z * z).sqrt();
        Self::new(r * a.cos(), r * a.sin(), z)
    }

    /// `random_in_unit_sphere`, flipped to the same side of `normal` as the normal itself.
    pub fn random_in_hemisphere(rng: &mut impl Rng, normal: Self) -> Self {
        let v = Self::random_in_unit_sphere(rng);
        if v.dot(normal) > 0.0 {
            v
        } else {
            -v
        }
    }
}

impl PartialEq for Vec3 {
    fn eq(&self, other: &Self) -> bool {
        (*self - *other).length_squared() < EPSILON * EPSILON
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Add for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, t: f64) -> Self {
        Self::new(self.x * t, self.y * t, self.z * t)
    }
}

impl Mul<Vec3> for f64 {
    type Output = Vec3;
    #[inline(always)]
    fn mul(self, v: Vec3) -> Vec3 {
        v * self
    }
}

impl MulAssign<f64> for Vec3 {
    #[inline(always)]
    fn mul_assign(&mut self, t: f64) {
        self.x *= t;
        self.y *= t;
        self.z *= t;
    }
}

impl Div<f64> for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn div(self, t: f64) -> Self {
        let inv = 1.0 / t;
        Self::new(self.x * inv, self.y * inv, self.z * inv)
    }
}

impl DivAssign<f64> for Vec3 {
    #[inline(always)]
    fn div_assign(&mut self, t: f64) {
        let inv = 1.0 / t;
        self.x *= inv;
        self.y *= inv;
        self.z *= inv;
    }
}

impl Index<usize> for Vec3 {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Vec3 index out of bounds: {i}"),
        }
    }
}

/// A parametric ray `R(t) = origin + t*direction`. Direction need not be unit-length.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point3,
    pub direction: Vec3,
}

impl Ray {
    #[inline(always)]
    pub const fn new(origin: Point3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    #[inline(always)]
    pub fn at(self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }
}

/// A half-open numeric interval `[min, max]` used to clip ray parameters.
#[derive(Debug, Clone, Copy)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    #[inline(always)]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Shadow-acne cutoff: excludes self-intersections just above a surface.
pub const MIN_DIST: f64 = 0.001;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflect_is_involutive() {
        let n = Vec3::new(0.0, 1.0, 0.0);
        let v = Vec3::new(1.0, -1.0, 0.3).normalized();
        let r = v.reflect(n);
        let r2 = r.reflect(n);
        assert!((r2 - v).length() < 1e-4);
    }

    #[test]
    fn refract_preserves_unit_length_when_not_tir() {
        let n = Vec3::new(0.0, 0.0, 1.0);
        let v = Vec3::new(0.1, 0.0, -1.0).normalized();
        let eta = 1.0 / 1.5;
        let cos_theta = (-v).dot(n).min(1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
        assert!(eta * sin_theta <= 1.0);
        let r = v.refract(n, eta);
        assert!((r.length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn random_lambertian_is_unit_length() {
        let mut rng = rand::thread_rng();
        for _ in 0..64 {
            let v = Vec3::random_lambertian(&mut rng);
            assert!((v.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn normalized_zero_length_is_unchanged() {
        let v = Vec3::zero();
        assert_eq!(v.normalized(), Vec3::zero());
    }

    #[test]
    fn vec3_index_matches_fields() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v[0], v.x);
        assert_eq!(v[1], v.y);
        assert_eq!(v[2], v.z);
    }

    #[test]
    fn random_int_is_within_closed_range() {
        let mut rng = rand::thread_rng();
        for _ in 0..256 {
            let n = random_int(&mut rng, 0, 2);
            assert!((0..=2).contains(&n));
        }
    }

    #[test]
    fn same_seed_reproduces_the_same_stream() {
        use rand::SeedableRng;
        use rand::rngs::SmallRng;
        let mut a = SmallRng::seed_from_u64(42);
        let mut b = SmallRng::seed_from_u64(42);
        let seq_a: Vec<f64> = (0..16).map(|_| randomf(&mut a)).collect();
        let seq_b: Vec<f64> = (0..16).map(|_| randomf(&mut b)).collect();
        assert_eq!(seq_a, seq_b);
    }
}
