//! # Parameter Mapping
//!
//! Pure functions from `(seed, macro vars)` to generation parameters.
//!
//! Mappings are versioned and frozen: [`v1`] never changes behavior, new
//! behavior ships as [`v2`] or later. The synthesizer never looks at a
//! mapping's fields directly; it calls [`MappedParameters::knobs`], whose
//! exhaustive match is the single place both versions are lowered to the
//! flat [`SynthesisKnobs`] the grid pipeline consumes.

pub mod v1;
pub mod v2;

pub use v1::{map_v1, KnobRange, KnobV1, MappedParametersV1, V1_TABLE};
pub use v2::{
    build_params_v2, micro_vars, select_archetype, Archetype, ArchetypeModifiers, BiomeParams,
    HydrologyParams, MappedParametersV2, MicroOverrides, StructureParams, MICRO_VAR_COUNT,
    MICRO_VAR_RANGE,
};

use crate::key::{GenerationKey, MacroVars, MappingVersion};

/// River depth used when a mapping has no hydrology knob for it.
pub const DEFAULT_RIVER_DEPTH: f64 = 0.04;

/// River count used by V1, which has no river knob.
pub const V1_RIVER_COUNT: u32 = 1;

/// Linear interpolation, `t` in `[0, 1]`.
#[inline]
#[must_use]
pub fn lerp(lo: f64, hi: f64, t: f64) -> f64 {
    lo + (hi - lo) * t
}

/// Peak threshold for a mountain height: `1 - 0.35·height`.
#[inline]
#[must_use]
pub fn peak_threshold(mountain_height: f64) -> f64 {
    1.0 - 0.35 * mountain_height
}

/// Snow starts 60% of the way from the peak threshold to the top.
#[inline]
#[must_use]
pub fn snow_line(peak_threshold: f64) -> f64 {
    peak_threshold + (1.0 - peak_threshold) * 0.6
}

/// Kind of the single planted object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ObjectKind {
    /// A lone tree.
    Tree = 0,
    /// A standing stone.
    Stone = 1,
    /// A small shrine.
    Shrine = 2,
    /// A watchtower.
    Tower = 3,
    /// A well.
    Well = 4,
    /// A statue.
    Statue = 5,
    /// A campfire.
    Campfire = 6,
    /// A crystal outcrop.
    Crystal = 7,
}

impl ObjectKind {
    /// Converts from an index; values past the last kind saturate.
    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        match index {
            0 => Self::Tree,
            1 => Self::Stone,
            2 => Self::Shrine,
            3 => Self::Tower,
            4 => Self::Well,
            5 => Self::Statue,
            6 => Self::Campfire,
            _ => Self::Crystal,
        }
    }

    /// Numeric index.
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }
}

/// Where and what the planted object is, before grid placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlantedObjectSpec {
    /// Object kind.
    pub kind: ObjectKind,
    /// Horizontal position as a fraction of the grid.
    pub x: f64,
    /// Vertical position as a fraction of the grid.
    pub y: f64,
}

/// Output of any mapping version.
#[derive(Clone, Debug, PartialEq)]
pub enum MappedParameters {
    /// Mapping V1 output.
    V1(MappedParametersV1),
    /// Mapping V2 output.
    V2(MappedParametersV2),
}

impl MappedParameters {
    /// The version that produced these parameters.
    #[must_use]
    pub const fn version(&self) -> MappingVersion {
        match self {
            Self::V1(_) => MappingVersion::V1,
            Self::V2(_) => MappingVersion::V2,
        }
    }

    /// V2 archetype, if any.
    #[must_use]
    pub const fn archetype(&self) -> Option<Archetype> {
        match self {
            Self::V1(_) => None,
            Self::V2(p) => Some(p.archetype),
        }
    }

    /// Lowers either version to the synthesizer's knobs.
    #[must_use]
    pub fn knobs(&self) -> SynthesisKnobs {
        match self {
            Self::V1(p) => {
                let peak = peak_threshold(p.mountain_height).max(p.water_level + 0.1);
                SynthesisKnobs {
                    continent_scale: p.continent_scale,
                    roughness: p.roughness,
                    water_level: p.water_level,
                    peak_threshold: peak,
                    snow_line: snow_line(peak),
                    forest_density: p.forest_density,
                    moisture_bias: 0.0,
                    path_density: p.path_density,
                    river_count: V1_RIVER_COUNT,
                    river_depth: DEFAULT_RIVER_DEPTH,
                    landmark_density: p.landmark_density,
                    edge_falloff: 0.0,
                    object: p.object,
                }
            }
            Self::V2(p) => SynthesisKnobs {
                continent_scale: p.structure.continent_scale,
                roughness: p.structure.roughness,
                water_level: p.hydrology.water_level,
                peak_threshold: p.structure.peak_threshold,
                snow_line: p.biome.snow_line,
                forest_density: p.biome.forest_density,
                moisture_bias: p.biome.moisture_bias,
                path_density: p.structure.path_density,
                river_count: p.hydrology.river_count,
                river_depth: p.hydrology.river_depth,
                landmark_density: p.biome.landmark_density,
                edge_falloff: p.structure.edge_falloff,
                object: p.object,
            },
        }
    }
}

/// Flat knob set consumed by the synthesizer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SynthesisKnobs {
    /// Noise frequency per cell.
    pub continent_scale: f64,
    /// Fine octave weight.
    pub roughness: f64,
    /// Elevation below which a cell is water.
    pub water_level: f64,
    /// Elevation at which mountains start.
    pub peak_threshold: f64,
    /// Elevation at which snow starts.
    pub snow_line: f64,
    /// Forest coverage factor.
    pub forest_density: f64,
    /// Added to sampled moisture.
    pub moisture_bias: f64,
    /// Path network density.
    pub path_density: f64,
    /// Rivers to trace.
    pub river_count: u32,
    /// River cut depth.
    pub river_depth: f64,
    /// Landmark placement factor.
    pub landmark_density: f64,
    /// Radial border drop.
    pub edge_falloff: f64,
    /// Planted object placement.
    pub object: PlantedObjectSpec,
}

/// Maps parameters with an explicit version.
#[must_use]
pub fn map(version: MappingVersion, seed: i64, vars: &MacroVars) -> MappedParameters {
    match version {
        MappingVersion::V1 => MappedParameters::V1(map_v1(vars)),
        MappingVersion::V2 => MappedParameters::V2(build_params_v2(seed, vars, None)),
    }
}

/// Maps the parameters a key names.
#[must_use]
pub fn map_key(key: &GenerationKey) -> MappedParameters {
    map(key.mapping(), key.seed(), key.vars())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::RegionCoord;

    #[test]
    fn test_dispatch_matches_version() {
        let vars = MacroVars::default();
        assert_eq!(map(MappingVersion::V1, 1, &vars).version(), MappingVersion::V1);
        assert_eq!(map(MappingVersion::V2, 1, &vars).version(), MappingVersion::V2);
    }

    #[test]
    fn test_v1_ignores_seed() {
        let vars = MacroVars::new([5, 15, 25, 35, 45, 55, 65, 75, 85, 95]);
        assert_eq!(map(MappingVersion::V1, 1, &vars), map(MappingVersion::V1, -99, &vars));
    }

    #[test]
    fn test_map_key_uses_key_version() {
        let key = GenerationKey::with_mapping(
            RegionCoord::new(2, 2),
            12345,
            MacroVars::uniform(50),
            MappingVersion::V1,
        );
        let knobs = map_key(&key).knobs();
        assert!((knobs.water_level - 0.325).abs() < 1e-12);
        assert_eq!(knobs.river_count, V1_RIVER_COUNT);
        assert!(map_key(&key).archetype().is_none());
    }

    #[test]
    fn test_knob_ordering_invariants() {
        for seed in 0..30 {
            for vars in [MacroVars::uniform(0), MacroVars::uniform(50), MacroVars::uniform(100)] {
                for version in [MappingVersion::V1, MappingVersion::V2] {
                    let knobs = map(version, seed, &vars).knobs();
                    assert!(knobs.water_level < knobs.peak_threshold);
                    assert!(knobs.peak_threshold <= knobs.snow_line);
                }
            }
        }
    }

    #[test]
    fn test_object_kind_saturates() {
        assert_eq!(ObjectKind::from_index(200), ObjectKind::Crystal);
        assert_eq!(ObjectKind::from_index(3).index(), 3);
    }
}
