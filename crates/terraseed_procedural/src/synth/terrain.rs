//! # Terrain Sampling & Classification
//!
//! Elevation and moisture fields for a region, and the per-cell base
//! classification that runs before paths and rivers are carved.
//!
//! Classification order (first match wins):
//! - `elevation < water_level` → water
//! - within the beach band above water → sand
//! - `elevation ≥ snow_line` → snow
//! - `elevation ≥ peak_threshold` → mountain
//! - just below the peaks, where rock noise is high → rock
//! - forest noise `< forest_density · (0.5 + elevation)` → forest
//! - otherwise → ground

use super::grid::TerrainType;
use crate::mapping::SynthesisKnobs;
use crate::mixer::derive_seed;
use crate::noise::{octave_weights, ValueNoise, TERRAIN_OCTAVES};

/// Height of the sand band above the water level.
pub const BEACH_WIDTH: f64 = 0.025;

/// Depth of the band below the peak threshold where rock may appear.
pub const ROCK_BAND: f64 = 0.06;

/// Contrast stretch applied to raw octave sums, which cluster around 0.5.
const ELEVATION_CONTRAST: f64 = 1.8;

const MOISTURE_SCALE_FACTOR: f64 = 1.7;
const FOREST_SCALE: f64 = 0.21;
const ROCK_SCALE: f64 = 0.35;

/// Samples terrain fields for one region.
#[derive(Clone, Debug)]
pub struct TerrainSampler {
    elevation_noise: ValueNoise,
    moisture_noise: ValueNoise,
    forest_noise: ValueNoise,
    rock_noise: ValueNoise,
    knobs: SynthesisKnobs,
    weights: [f64; TERRAIN_OCTAVES],
    grid_size: usize,
}

impl TerrainSampler {
    /// Creates a sampler with independent noise streams derived from `seed`.
    #[must_use]
    pub fn new(seed: i64, knobs: SynthesisKnobs, grid_size: usize) -> Self {
        Self {
            elevation_noise: ValueNoise::new(derive_seed(seed, "elevation")),
            moisture_noise: ValueNoise::new(derive_seed(seed, "moisture")),
            forest_noise: ValueNoise::new(derive_seed(seed, "forest")),
            rock_noise: ValueNoise::new(derive_seed(seed, "rock")),
            weights: octave_weights(knobs.roughness),
            knobs,
            grid_size,
        }
    }

    /// Knobs this sampler was built with.
    #[must_use]
    pub const fn knobs(&self) -> &SynthesisKnobs {
        &self.knobs
    }

    /// Elevation at cell `(x, y)`, in `[0, 1]`.
    #[must_use]
    pub fn elevation(&self, x: usize, y: usize) -> f64 {
        let scale = self.knobs.continent_scale;
        let raw = self.elevation_noise.octaved(x as f64 * scale, y as f64 * scale, &self.weights);
        let shaped = Self::apply_terrain_curve(raw);

        if self.knobs.edge_falloff > 0.0 {
            let d = self.edge_distance(x, y);
            (shaped * (1.0 - self.knobs.edge_falloff * d * d)).clamp(0.0, 1.0)
        } else {
            shaped
        }
    }

    /// Moisture at cell `(x, y)`, in `[0, 1]`.
    ///
    /// Low ground near the waterline is wetter than high ground.
    #[must_use]
    pub fn moisture(&self, x: usize, y: usize, elevation: f64) -> f64 {
        let scale = self.knobs.continent_scale * MOISTURE_SCALE_FACTOR;
        let raw = self.moisture_noise.octaved(x as f64 * scale, y as f64 * scale, &[1.0, 0.5]);
        let lowland = (self.knobs.water_level - elevation) * 0.3;
        let value = raw + self.knobs.moisture_bias + lowland;
        if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 }
    }

    /// Base classification of a cell.
    ///
    /// Returns `None` when no rule matches, which only happens for a
    /// non-finite elevation. Callers treat that as a synthesis anomaly.
    #[must_use]
    pub fn classify(&self, x: usize, y: usize, elevation: f64) -> Option<TerrainType> {
        if !elevation.is_finite() {
            return None;
        }
        let k = &self.knobs;

        if elevation < k.water_level {
            return Some(TerrainType::Water);
        }
        if elevation < k.water_level + BEACH_WIDTH {
            return Some(TerrainType::Sand);
        }
        if elevation >= k.snow_line {
            return Some(TerrainType::Snow);
        }
        if elevation >= k.peak_threshold {
            return Some(TerrainType::Mountain);
        }

        let fx = x as f64;
        let fy = y as f64;
        if elevation >= k.peak_threshold - ROCK_BAND
            && self.rock_noise.sample(fx * ROCK_SCALE, fy * ROCK_SCALE) > 1.0 - 0.5 * k.roughness
        {
            return Some(TerrainType::Rock);
        }

        let forest = self.forest_noise.octaved(fx * FOREST_SCALE, fy * FOREST_SCALE, &[1.0, 0.5]);
        if forest < k.forest_density * (0.5 + elevation) {
            return Some(TerrainType::Forest);
        }

        Some(TerrainType::Ground)
    }

    /// Stretches octave sums away from the middle so both water and peaks
    /// are reachable.
    #[inline]
    fn apply_terrain_curve(raw: f64) -> f64 {
        ((raw - 0.5) * ELEVATION_CONTRAST + 0.5).clamp(0.0, 1.0)
    }

    /// Distance from the centre: `0` at the centre, `1` at the edge midpoints.
    fn edge_distance(&self, x: usize, y: usize) -> f64 {
        let half = (self.grid_size.max(2) - 1) as f64 / 2.0;
        let dx = (x as f64 - half) / half;
        let dy = (y as f64 - half) / half;
        (dx * dx + dy * dy).sqrt().min(1.0)
    }
}
