//! # Value Noise
//!
//! Lattice value noise built on the [`mixer`](crate::mixer).
//!
//! Each integer lattice point gets a value from `seeded_random01(seed,
//! [octave, ix, iy])`; samples between lattice points are smoothstep
//! interpolated. A sample is a pure function of `(seed, octave, x, y)`, so
//! the order in which cells are visited can never change a value.
//!
//! ## Determinism Guarantee
//!
//! Octave sums are accumulated in a fixed order (octave 0 first) with fixed
//! weights. Downstream consumers quantize before hashing, so last-bit
//! differences in `f64` evaluation do not leak into content hashes.

use crate::mixer::seeded_random01;

/// Frequency multiplier between consecutive octaves.
pub const LACUNARITY: f64 = 2.0;

/// Number of octaves used for terrain elevation.
pub const TERRAIN_OCTAVES: usize = 3;

/// Per-octave weights for a roughness value: `1.0, 0.5·r, 0.25·r`.
#[inline]
#[must_use]
pub fn octave_weights(roughness: f64) -> [f64; TERRAIN_OCTAVES] {
    [1.0, 0.5 * roughness, 0.25 * roughness]
}

/// 2D value noise generator.
///
/// Produces smooth values in `[0, 1]`.
///
/// # Example
///
/// ```rust
/// use terraseed_procedural::noise::{octave_weights, ValueNoise};
///
/// let noise = ValueNoise::new(42);
/// let value = noise.octaved(3.5, 7.25, &octave_weights(0.6));
/// assert!((0.0..=1.0).contains(&value));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValueNoise {
    seed: i64,
}

impl ValueNoise {
    /// Creates a noise generator for a seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: i64) -> Self {
        Self { seed }
    }

    /// Returns the seed of this generator.
    #[inline]
    #[must_use]
    pub const fn seed(self) -> i64 {
        self.seed
    }

    /// Samples the first octave at `(x, y)`.
    #[inline]
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        self.sample_octave(0, x, y)
    }

    /// Samples one octave's lattice at `(x, y)`.
    ///
    /// Each octave has its own lattice so stacked octaves are uncorrelated.
    #[must_use]
    pub fn sample_octave(&self, octave: usize, x: f64, y: f64) -> f64 {
        let x0 = fast_floor(x);
        let y0 = fast_floor(y);
        let tx = smoothstep(x - x0 as f64);
        let ty = smoothstep(y - y0 as f64);

        let octave = octave as i64;
        let v00 = self.lattice(octave, x0, y0);
        let v10 = self.lattice(octave, x0 + 1, y0);
        let v01 = self.lattice(octave, x0, y0 + 1);
        let v11 = self.lattice(octave, x0 + 1, y0 + 1);

        let top = v00 + (v10 - v00) * tx;
        let bottom = v01 + (v11 - v01) * tx;
        top + (bottom - top) * ty
    }

    /// Fractal sum of octaves with the given weights.
    ///
    /// Octave `i` is sampled at frequency `LACUNARITY^i`. The sum is
    /// normalized by the total weight, so the result stays in `[0, 1]`.
    /// An all-zero weight set yields `0.5`.
    #[must_use]
    pub fn octaved(&self, x: f64, y: f64, weights: &[f64]) -> f64 {
        let mut total = 0.0;
        let mut weight_sum = 0.0;
        let mut frequency = 1.0;

        for (octave, &weight) in weights.iter().enumerate() {
            total += self.sample_octave(octave, x * frequency, y * frequency) * weight;
            weight_sum += weight;
            frequency *= LACUNARITY;
        }

        if weight_sum <= 0.0 {
            return 0.5;
        }
        total / weight_sum
    }

    #[inline]
    fn lattice(&self, octave: i64, ix: i64, iy: i64) -> f64 {
        seeded_random01(self.seed, &[octave, ix, iy])
    }
}

/// Cubic smoothstep on `[0, 1]`.
#[inline]
fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

/// Floor to `i64` without going through `f64::floor`.
#[inline]
fn fast_floor(x: f64) -> i64 {
    let xi = x as i64;
    if x < xi as f64 { xi - 1 } else { xi }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let noise1 = ValueNoise::new(12345);
        let noise2 = ValueNoise::new(12345);

        for i in 0..100 {
            let x = f64::from(i) * 0.1;
            let y = f64::from(i) * 0.17;
            assert_eq!(noise1.sample(x, y), noise2.sample(x, y), "Noise should be deterministic");
        }
    }

    #[test]
    fn test_different_seeds_different_results() {
        let v1 = ValueNoise::new(1).sample(10.5, 10.5);
        let v2 = ValueNoise::new(2).sample(10.5, 10.5);
        assert_ne!(v1, v2, "Different seeds should produce different results");
    }

    #[test]
    fn test_lattice_points_hit_hashed_values() {
        let noise = ValueNoise::new(7);
        assert_eq!(noise.sample(3.0, -4.0), seeded_random01(7, &[0, 3, -4]));
    }

    #[test]
    fn test_range() {
        let noise = ValueNoise::new(42);
        for i in 0..10_000 {
            let x = f64::from(i) * 0.1 - 500.0;
            let y = f64::from(i) * 0.13 - 650.0;
            let value = noise.sample(x, y);
            assert!((0.0..=1.0).contains(&value), "Value {value} out of range at ({x}, {y})");
        }
    }

    #[test]
    fn test_continuity() {
        let noise = ValueNoise::new(42);
        let delta = 0.001;
        let v1 = noise.sample(100.3, 100.6);
        let v2 = noise.sample(100.3 + delta, 100.6);
        let v3 = noise.sample(100.3, 100.6 + delta);

        assert!((v1 - v2).abs() < 0.01, "Noise should be continuous in x");
        assert!((v1 - v3).abs() < 0.01, "Noise should be continuous in y");
    }

    #[test]
    fn test_octaved_noise_range() {
        let noise = ValueNoise::new(42);
        for i in 0..1000 {
            let x = f64::from(i) * 0.37;
            let value = noise.octaved(x, x * 0.5, &octave_weights(1.0));
            assert!((0.0..=1.0).contains(&value), "Octaved value {value} out of range");
        }
    }

    #[test]
    fn test_zero_roughness_is_single_octave() {
        let noise = ValueNoise::new(9);
        assert_eq!(noise.octaved(1.7, 2.3, &octave_weights(0.0)), noise.sample(1.7, 2.3));
    }

    #[test]
    fn test_empty_weights() {
        assert_eq!(ValueNoise::new(1).octaved(0.3, 0.3, &[]), 0.5);
    }

    #[test]
    fn test_fast_floor_negative() {
        assert_eq!(fast_floor(-0.5), -1);
        assert_eq!(fast_floor(-1.0), -1);
        assert_eq!(fast_floor(2.9), 2);
    }
}
