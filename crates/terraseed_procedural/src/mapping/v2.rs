//! # Mapping V2
//!
//! V2 starts from the V1 knobs and layers three deterministic refinements:
//!
//! 1. An [`Archetype`] picked by a weighted draw over the macro vars.
//! 2. Six micro vars: small seeded offsets (±0.08) that nudge individual
//!    knobs without widening the public parameter surface.
//! 3. Archetype multipliers applied to the structure, biome and hydrology
//!    sub-records, then clamped into each knob's legal range.
//!
//! **FROZEN** once released, like V1.

use std::collections::BTreeMap;
use std::fmt;

use super::{map_v1, PlantedObjectSpec};
use crate::key::MacroVars;
use crate::mixer::seeded_random01;

/// Number of micro vars.
pub const MICRO_VAR_COUNT: usize = 6;

/// Micro vars lie in `[-MICRO_VAR_RANGE, MICRO_VAR_RANGE]`.
pub const MICRO_VAR_RANGE: f64 = 0.08;

/// Micro var offsetting the water level.
pub const MICRO_WATER: usize = 0;
/// Micro var offsetting forest density.
pub const MICRO_FOREST: usize = 1;
/// Micro var offsetting mountain height.
pub const MICRO_MOUNTAIN: usize = 2;
/// Micro var offsetting roughness.
pub const MICRO_ROUGHNESS: usize = 3;
/// Micro var biasing the river count.
pub const MICRO_RIVER: usize = 4;
/// Micro var biasing moisture.
pub const MICRO_MOISTURE: usize = 5;

/// Most rivers a V2 region may carve.
pub const MAX_RIVERS: u32 = 4;

const ARCHETYPE_SALT: i64 = 0x4152_4348; // "ARCH"
const MICRO_SALT: i64 = 0x4d49_4352; // "MICR"

/// Discrete world theme selected per seed and vars.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Archetype {
    /// Scattered landmasses with wide shores.
    Islands,
    /// Steep, rocky terrain with a low waterline.
    Highlands,
    /// Damp lowlands with many rivers.
    Wetlands,
    /// Gentle open terrain crossed by paths.
    Plains,
}

impl Archetype {
    /// Every archetype, in selection order.
    pub const ALL: [Self; 4] = [Self::Islands, Self::Highlands, Self::Wetlands, Self::Plains];

    /// Position in [`Archetype::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Islands => 0,
            Self::Highlands => 1,
            Self::Wetlands => 2,
            Self::Plains => 3,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Islands => "islands",
            Self::Highlands => "highlands",
            Self::Wetlands => "wetlands",
            Self::Plains => "plains",
        }
    }

    /// Selection weight for the given vars. Never zero.
    #[must_use]
    pub fn weight(self, vars: &MacroVars) -> u32 {
        let v = vars.values();
        let base = 10;
        match self {
            Self::Islands => base + u32::from(v[4]),
            Self::Highlands => base + u32::from(v[6]),
            Self::Wetlands => base + (u32::from(v[4]) + u32::from(v[5])) / 2,
            Self::Plains => base + 100 - u32::from(v[8]),
        }
    }

    /// Multipliers this archetype applies.
    #[must_use]
    pub const fn modifiers(self) -> ArchetypeModifiers {
        match self {
            Self::Islands => ArchetypeModifiers {
                water: 1.35,
                forest: 1.0,
                mountain: 0.8,
                roughness: 1.0,
                continent_scale: 1.4,
                path: 0.8,
                river: 0.6,
                moisture_bias: 0.05,
                edge_falloff: 0.6,
            },
            Self::Highlands => ArchetypeModifiers {
                water: 0.7,
                forest: 0.9,
                mountain: 1.35,
                roughness: 1.25,
                continent_scale: 1.0,
                path: 0.9,
                river: 1.2,
                moisture_bias: 0.0,
                edge_falloff: 0.0,
            },
            Self::Wetlands => ArchetypeModifiers {
                water: 1.1,
                forest: 1.25,
                mountain: 0.7,
                roughness: 0.9,
                continent_scale: 0.9,
                path: 0.8,
                river: 1.6,
                moisture_bias: 0.2,
                edge_falloff: 0.0,
            },
            Self::Plains => ArchetypeModifiers {
                water: 0.85,
                forest: 0.8,
                mountain: 0.6,
                roughness: 0.7,
                continent_scale: 0.8,
                path: 1.3,
                river: 1.0,
                moisture_bias: -0.05,
                edge_falloff: 0.0,
            },
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-archetype multipliers and biases.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArchetypeModifiers {
    /// Water level multiplier.
    pub water: f64,
    /// Forest density multiplier.
    pub forest: f64,
    /// Mountain height multiplier.
    pub mountain: f64,
    /// Roughness multiplier.
    pub roughness: f64,
    /// Continent scale multiplier.
    pub continent_scale: f64,
    /// Path density multiplier.
    pub path: f64,
    /// River count multiplier.
    pub river: f64,
    /// Added to moisture.
    pub moisture_bias: f64,
    /// Strength of the radial drop toward the region border.
    pub edge_falloff: f64,
}

/// Picks the archetype for a seed and vars.
///
/// Weighted draw in [`Archetype::ALL`] order using
/// `seeded_random01(seed, [ARCHETYPE_SALT])`.
#[must_use]
pub fn select_archetype(seed: i64, vars: &MacroVars) -> Archetype {
    let weights = Archetype::ALL.map(|archetype| archetype.weight(vars));
    let total: u32 = weights.iter().sum();
    let draw = (seeded_random01(seed, &[ARCHETYPE_SALT]) * f64::from(total)) as u32;

    let mut cumulative = 0;
    for (archetype, weight) in Archetype::ALL.into_iter().zip(weights) {
        cumulative += weight;
        if draw < cumulative {
            return archetype;
        }
    }
    Archetype::Plains
}

/// Sparse replacements for computed micro vars.
///
/// Used for debugging and tests. Values are clamped to the micro range;
/// indices at or beyond [`MICRO_VAR_COUNT`] and NaN values are ignored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MicroOverrides {
    values: BTreeMap<usize, f64>,
}

impl MicroOverrides {
    /// Creates an empty override set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an override, builder style.
    #[must_use]
    pub fn with(mut self, index: usize, value: f64) -> Self {
        self.set(index, value);
        self
    }

    /// Sets an override.
    pub fn set(&mut self, index: usize, value: f64) {
        if index < MICRO_VAR_COUNT && !value.is_nan() {
            self.values.insert(index, value.clamp(-MICRO_VAR_RANGE, MICRO_VAR_RANGE));
        }
    }

    /// Returns the override at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(&index).copied()
    }

    /// True when no overrides are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Terrain shape knobs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StructureParams {
    /// Noise frequency per cell.
    pub continent_scale: f64,
    /// Fine octave weight.
    pub roughness: f64,
    /// Elevation at which mountains start.
    pub peak_threshold: f64,
    /// Path network density.
    pub path_density: f64,
    /// Radial drop toward the border, `0` disables it.
    pub edge_falloff: f64,
}

/// Surface cover knobs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiomeParams {
    /// Forest coverage factor.
    pub forest_density: f64,
    /// Added to sampled moisture.
    pub moisture_bias: f64,
    /// Elevation at which snow starts.
    pub snow_line: f64,
    /// Landmark placement factor.
    pub landmark_density: f64,
}

/// Water knobs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HydrologyParams {
    /// Elevation below which a cell is water.
    pub water_level: f64,
    /// Number of rivers to trace.
    pub river_count: u32,
    /// How far a river cuts below the surrounding land.
    pub river_depth: f64,
}

/// Output of mapping V2.
#[derive(Clone, Debug, PartialEq)]
pub struct MappedParametersV2 {
    /// Selected archetype.
    pub archetype: Archetype,
    /// Index of the archetype in [`Archetype::ALL`].
    pub archetype_index: usize,
    /// Micro vars after overrides.
    pub micro_vars: [f64; MICRO_VAR_COUNT],
    /// Shape knobs.
    pub structure: StructureParams,
    /// Cover knobs.
    pub biome: BiomeParams,
    /// Water knobs.
    pub hydrology: HydrologyParams,
    /// Planted object placement, as in V1.
    pub object: PlantedObjectSpec,
}

/// Computes the micro vars for a seed and vars.
#[must_use]
pub fn micro_vars(
    seed: i64,
    vars: &MacroVars,
    overrides: Option<&MicroOverrides>,
) -> [f64; MICRO_VAR_COUNT] {
    let digest = i64::from(vars.digest());
    let mut micro = [0.0; MICRO_VAR_COUNT];
    for (index, slot) in micro.iter_mut().enumerate() {
        let draw = seeded_random01(seed, &[MICRO_SALT, index as i64, digest]);
        let computed = (draw * 2.0 - 1.0) * MICRO_VAR_RANGE;
        *slot = overrides.and_then(|o| o.get(index)).unwrap_or(computed);
    }
    micro
}

/// Builds V2 parameters.
///
/// Total over all inputs: every knob is clamped after perturbation.
#[must_use]
pub fn build_params_v2(
    seed: i64,
    vars: &MacroVars,
    overrides: Option<&MicroOverrides>,
) -> MappedParametersV2 {
    let base = map_v1(vars);
    let archetype = select_archetype(seed, vars);
    let micro = micro_vars(seed, vars, overrides);
    let m = archetype.modifiers();

    let water_level = ((base.water_level + micro[MICRO_WATER]) * m.water).clamp(0.05, 0.75);
    let mountain_height =
        ((base.mountain_height + micro[MICRO_MOUNTAIN]) * m.mountain).clamp(0.1, 1.0);
    let peak_threshold = super::peak_threshold(mountain_height).max(water_level + 0.1).min(0.97);
    let roughness = ((base.roughness + micro[MICRO_ROUGHNESS]) * m.roughness).clamp(0.1, 1.0);
    let forest_density = ((base.forest_density + micro[MICRO_FOREST]) * m.forest).clamp(0.0, 0.95);
    let river_units = (1.0 + micro[MICRO_RIVER] / MICRO_VAR_RANGE) * m.river;
    let river_count = (river_units.round().max(0.0) as u32).min(MAX_RIVERS);

    MappedParametersV2 {
        archetype,
        archetype_index: archetype.index(),
        micro_vars: micro,
        structure: StructureParams {
            continent_scale: (base.continent_scale * m.continent_scale).clamp(0.015, 0.15),
            roughness,
            peak_threshold,
            path_density: (base.path_density * m.path).clamp(0.0, 1.0),
            edge_falloff: m.edge_falloff,
        },
        biome: BiomeParams {
            forest_density,
            moisture_bias: (micro[MICRO_MOISTURE] + m.moisture_bias).clamp(-0.3, 0.3),
            snow_line: super::snow_line(peak_threshold),
            landmark_density: base.landmark_density,
        },
        hydrology: HydrologyParams {
            water_level,
            river_count,
            river_depth: super::DEFAULT_RIVER_DEPTH,
        },
        object: base.object,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_archetype_is_stable() {
        let vars = MacroVars::new([10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
        let first = select_archetype(987_654, &vars);
        for _ in 0..100 {
            assert_eq!(select_archetype(987_654, &vars), first);
        }
    }

    #[test]
    fn test_archetype_not_degenerate() {
        let vars = MacroVars::uniform(50);
        let seen: BTreeSet<Archetype> = (0..20).map(|seed| select_archetype(seed, &vars)).collect();
        assert!(seen.len() >= 2, "only saw {seen:?}");
    }

    #[test]
    fn test_water_var_biases_islands() {
        let wet = MacroVars::uniform(50).with(4, 100).with(6, 0).with(8, 100);
        let dry = MacroVars::uniform(50).with(4, 0);
        let count = |vars: &MacroVars| {
            (0..400)
                .filter(|&seed| select_archetype(seed, vars) == Archetype::Islands)
                .count()
        };
        assert!(count(&wet) > count(&dry));
    }

    #[test]
    fn test_weights_never_zero() {
        for vars in [MacroVars::uniform(0), MacroVars::uniform(100)] {
            for archetype in Archetype::ALL {
                assert!(archetype.weight(&vars) > 0);
            }
        }
    }

    #[test]
    fn test_micro_vars_in_range() {
        for seed in 0..200 {
            for value in micro_vars(seed, &MacroVars::default(), None) {
                assert!(value.abs() <= MICRO_VAR_RANGE);
            }
        }
    }

    #[test]
    fn test_override_replaces_single_index() {
        let vars = MacroVars::default();
        let computed = micro_vars(77, &vars, None);
        let overrides = MicroOverrides::new().with(MICRO_WATER, 0.05).with(42, 1.0);
        let overridden = micro_vars(77, &vars, Some(&overrides));

        assert_eq!(overridden[MICRO_WATER], 0.05);
        assert_eq!(&overridden[1..], &computed[1..]);
    }

    #[test]
    fn test_override_is_clamped() {
        let overrides = MicroOverrides::new().with(MICRO_RIVER, 5.0).with(MICRO_FOREST, f64::NAN);
        assert_eq!(overrides.get(MICRO_RIVER), Some(MICRO_VAR_RANGE));
        assert_eq!(overrides.get(MICRO_FOREST), None);
    }

    #[test]
    fn test_override_moves_water_level() {
        let vars = MacroVars::default();
        let low = build_params_v2(5, &vars, Some(&MicroOverrides::new().with(MICRO_WATER, -0.08)));
        let high = build_params_v2(5, &vars, Some(&MicroOverrides::new().with(MICRO_WATER, 0.08)));
        assert!(high.hydrology.water_level > low.hydrology.water_level);
        assert_eq!(low.archetype, high.archetype);
    }

    #[test]
    fn test_params_are_pure() {
        let vars = MacroVars::new([3, 14, 15, 92, 65, 35, 89, 79, 32, 38]);
        assert_eq!(build_params_v2(2718, &vars, None), build_params_v2(2718, &vars, None));
    }

    #[test]
    fn test_knobs_stay_legal_at_extremes() {
        for vars in [MacroVars::uniform(0), MacroVars::uniform(100)] {
            for seed in 0..50 {
                let p = build_params_v2(seed, &vars, None);
                assert!((0.05..=0.75).contains(&p.hydrology.water_level));
                assert!(p.structure.peak_threshold > p.hydrology.water_level);
                assert!(p.biome.snow_line >= p.structure.peak_threshold);
                assert!(p.biome.snow_line <= 1.0);
                assert!(p.hydrology.river_count <= MAX_RIVERS);
                assert_eq!(p.archetype_index, p.archetype.index());
            }
        }
    }
}
