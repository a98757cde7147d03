//! Floating-point RGB color and its lossy 8-bit quantization.

use crate::math::{clamp01, randomf, randomf_range};
use rand::Rng;
use std::ops::{Add, Mul, Sub};

/// Floating-point RGB, componentwise arithmetic, unclamped until [`Color::gamma2`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);
    pub const RED: Color = Color::new(0.93, 0.33, 0.31);

    #[inline(always)]
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::new(randomf(rng), randomf(rng), randomf(rng))
    }

    pub fn random_range(rng: &mut impl Rng, min: f64, max: f64) -> Self {
        Self::new(
            randomf_range(rng, min, max),
            randomf_range(rng, min, max),
            randomf_range(rng, min, max),
        )
    }

    #[inline]
    pub fn lerp(a: Color, b: Color, t: f64) -> Color {
        let t = clamp01(t);
        a + (b - a) * t
    }

    /// Clamp-to-[0,1] gamma-2 (sqrt) tone map: `clamp01(sqrt(scale * channel))`.
    pub fn gamma2(c: Color, scale: f64) -> Color {
        Color::new(
            clamp01((scale * c.r).sqrt()),
            clamp01((scale * c.g).sqrt()),
            clamp01((scale * c.b).sqrt()),
        )
    }

    /// Truncating (no rounding) conversion to 8-bit channels.
    pub fn to_color24(self) -> Color24 {
        Color24 {
            r: (self.r * 255.0) as u8,
            g: (self.g * 255.0) as u8,
            b: (self.b * 255.0) as u8,
        }
    }
}

impl Add for Color {
    type Output = Color;
    fn add(self, rhs: Color) -> Color {
        Color::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

impl Sub for Color {
    type Output = Color;
    fn sub(self, rhs: Color) -> Color {
        Color::new(self.r - rhs.r, self.g - rhs.g, self.b - rhs.b)
    }
}

impl Mul<Color> for Color {
    type Output = Color;
    fn mul(self, rhs: Color) -> Color {
        Color::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b)
    }
}

impl Mul<f64> for Color {
    type Output = Color;
    fn mul(self, s: f64) -> Color {
        Color::new(self.r * s, self.g * s, self.b * s)
    }
}

impl Mul<Color> for f64 {
    type Output = Color;
    fn mul(self, c: Color) -> Color {
        c * self
    }
}

/// 8-bit-per-channel RGB, as read from / written to a bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color24 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color24 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_colorf(self) -> Color {
        Color::new(
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gamma2_of_black_is_black() {
        assert_eq!(Color::gamma2(Color::BLACK, 1.0), Color::BLACK);
        assert_eq!(Color::gamma2(Color::BLACK, 12.5), Color::BLACK);
    }

    #[test]
    fn color24_round_trip_is_bit_exact() {
        for r in [0u8, 1, 17, 128, 254, 255] {
            for g in [0u8, 64, 200] {
                for b in [0u8, 9, 255] {
                    let c24 = Color24::new(r, g, b);
                    let back = c24.to_colorf().to_color24();
                    assert_eq!(c24, back);
                }
            }
        }
    }

    #[test]
    fn lerp_at_endpoints() {
        let a = Color::new(0.0, 0.0, 0.0);
        let b = Color::new(1.0, 1.0, 1.0);
        assert_eq!(Color::lerp(a, b, 0.0), a);
        assert_eq!(Color::lerp(a, b, 1.0), b);
    }
}
