//! # Mapping V1
//!
//! **FROZEN.** Every knob is a linear remap of one macro var, read straight
//! from [`V1_TABLE`]. No seed dependency. Changing any row changes every
//! V1 world ever shared; new behavior ships as a new mapping version.

use super::{lerp, ObjectKind, PlantedObjectSpec};
use crate::key::MacroVars;

/// A generation knob driven by one macro var.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KnobV1 {
    /// Planted object horizontal position, as a fraction of the grid.
    ObjectX,
    /// Planted object vertical position, as a fraction of the grid.
    ObjectY,
    /// Planted object kind index, before rounding.
    ObjectKind,
    /// Noise frequency per cell. Larger means smaller landmasses.
    ContinentScale,
    /// Elevation below which a cell is water.
    WaterLevel,
    /// Forest coverage factor.
    ForestDensity,
    /// Mountain prominence. Lowers the peak threshold.
    MountainHeight,
    /// Path network density.
    PathDensity,
    /// Weight of the finer noise octaves.
    Roughness,
    /// Landmark placement probability factor.
    LandmarkDensity,
}

/// One auditable row of the V1 table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KnobRange {
    /// The knob this row produces.
    pub knob: KnobV1,
    /// Which macro var drives it.
    pub var_index: usize,
    /// Value at var = 0.
    pub lo: f64,
    /// Value at var = 100.
    pub hi: f64,
}

const fn row(knob: KnobV1, var_index: usize, lo: f64, hi: f64) -> KnobRange {
    KnobRange { knob, var_index, lo, hi }
}

/// The complete V1 mapping. One row per macro var.
pub const V1_TABLE: [KnobRange; 10] = [
    row(KnobV1::ObjectX, 0, 0.0, 1.0),
    row(KnobV1::ObjectY, 1, 0.0, 1.0),
    row(KnobV1::ObjectKind, 2, 0.0, 7.0),
    row(KnobV1::ContinentScale, 3, 0.02, 0.10),
    row(KnobV1::WaterLevel, 4, 0.10, 0.55),
    row(KnobV1::ForestDensity, 5, 0.10, 0.85),
    row(KnobV1::MountainHeight, 6, 0.30, 1.00),
    row(KnobV1::PathDensity, 7, 0.00, 1.00),
    row(KnobV1::Roughness, 8, 0.20, 1.00),
    row(KnobV1::LandmarkDensity, 9, 0.00, 0.30),
];

/// Output of mapping V1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MappedParametersV1 {
    /// Noise frequency per cell.
    pub continent_scale: f64,
    /// Elevation below which a cell is water.
    pub water_level: f64,
    /// Forest coverage factor.
    pub forest_density: f64,
    /// Mountain prominence in `[0.3, 1.0]`.
    pub mountain_height: f64,
    /// Path network density in `[0, 1]`.
    pub path_density: f64,
    /// Fine octave weight in `[0.2, 1.0]`.
    pub roughness: f64,
    /// Landmark factor in `[0, 0.3]`.
    pub landmark_density: f64,
    /// Unrounded object kind in `[0, 7]`. `object.kind` is its rounding.
    pub object_kind_value: f64,
    /// Planted object placement.
    pub object: PlantedObjectSpec,
}

impl MappedParametersV1 {
    /// Reads a knob by name, for auditing against [`V1_TABLE`].
    #[must_use]
    pub fn knob(&self, knob: KnobV1) -> f64 {
        match knob {
            KnobV1::ObjectX => self.object.x,
            KnobV1::ObjectY => self.object.y,
            KnobV1::ObjectKind => self.object_kind_value,
            KnobV1::ContinentScale => self.continent_scale,
            KnobV1::WaterLevel => self.water_level,
            KnobV1::ForestDensity => self.forest_density,
            KnobV1::MountainHeight => self.mountain_height,
            KnobV1::PathDensity => self.path_density,
            KnobV1::Roughness => self.roughness,
            KnobV1::LandmarkDensity => self.landmark_density,
        }
    }
}

/// Maps macro vars through [`V1_TABLE`].
///
/// # Example
///
/// ```rust
/// use terraseed_procedural::key::MacroVars;
/// use terraseed_procedural::mapping::map_v1;
///
/// let params = map_v1(&MacroVars::uniform(50));
/// assert!((params.water_level - 0.325).abs() < 1e-12);
/// ```
#[must_use]
pub fn map_v1(vars: &MacroVars) -> MappedParametersV1 {
    let mut params = MappedParametersV1 {
        continent_scale: 0.0,
        water_level: 0.0,
        forest_density: 0.0,
        mountain_height: 0.0,
        path_density: 0.0,
        roughness: 0.0,
        landmark_density: 0.0,
        object_kind_value: 0.0,
        object: PlantedObjectSpec {
            kind: ObjectKind::Tree,
            x: 0.0,
            y: 0.0,
        },
    };

    for range in &V1_TABLE {
        let value = lerp(range.lo, range.hi, vars.fraction(range.var_index));
        match range.knob {
            KnobV1::ObjectX => params.object.x = value,
            KnobV1::ObjectY => params.object.y = value,
            KnobV1::ObjectKind => {
                params.object_kind_value = value;
                params.object.kind = ObjectKind::from_index(value.round() as u8);
            }
            KnobV1::ContinentScale => params.continent_scale = value,
            KnobV1::WaterLevel => params.water_level = value,
            KnobV1::ForestDensity => params.forest_density = value,
            KnobV1::MountainHeight => params.mountain_height = value,
            KnobV1::PathDensity => params.path_density = value,
            KnobV1::Roughness => params.roughness = value,
            KnobV1::LandmarkDensity => params.landmark_density = value,
        }
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_table_covers_each_var_once() {
        let mut seen = [false; 10];
        for range in &V1_TABLE {
            assert!(!seen[range.var_index], "var {} mapped twice", range.var_index);
            seen[range.var_index] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_all_zero_hits_lower_bounds() {
        let params = map_v1(&MacroVars::uniform(0));
        assert!((params.water_level - 0.10).abs() < EPSILON);
        assert!((params.continent_scale - 0.02).abs() < EPSILON);
        assert!((params.forest_density - 0.10).abs() < EPSILON);
        for range in &V1_TABLE {
            assert!((params.knob(range.knob) - range.lo).abs() < EPSILON, "{:?}", range.knob);
        }
    }

    #[test]
    fn test_all_hundred_hits_upper_bounds() {
        let params = map_v1(&MacroVars::uniform(100));
        for range in &V1_TABLE {
            assert!((params.knob(range.knob) - range.hi).abs() < EPSILON, "{:?}", range.knob);
        }
    }

    #[test]
    fn test_midpoint_water_level() {
        let params = map_v1(&MacroVars::uniform(50));
        assert!((params.water_level - 0.325).abs() < EPSILON);
    }

    #[test]
    fn test_monotonic_in_each_var() {
        let low = map_v1(&MacroVars::uniform(0));
        let high = map_v1(&MacroVars::uniform(100));
        assert!(high.water_level > low.water_level);
        for range in &V1_TABLE {
            assert!(high.knob(range.knob) > low.knob(range.knob), "{:?}", range.knob);
        }
    }

    #[test]
    fn test_out_of_range_input_is_clamped() {
        let clamped = map_v1(&MacroVars::from_ints(&[500; 10]));
        assert_eq!(clamped, map_v1(&MacroVars::uniform(100)));
    }

    #[test]
    fn test_single_var_step_changes_one_knob() {
        let base = map_v1(&MacroVars::uniform(50));
        let stepped = map_v1(&MacroVars::uniform(50).with(4, 51));
        assert!(stepped.water_level > base.water_level);
        assert!((stepped.forest_density - base.forest_density).abs() < EPSILON);
    }

    #[test]
    fn test_every_single_step_moves_its_knob() {
        for base_value in [0_u8, 50, 99] {
            let base = map_v1(&MacroVars::uniform(base_value));
            for range in &V1_TABLE {
                let next = i64::from(base_value) + 1;
                let stepped = map_v1(&MacroVars::uniform(base_value).with(range.var_index, next));
                assert_ne!(stepped, base, "var {} at {}", range.var_index, base_value);
                assert!(
                    stepped.knob(range.knob) > base.knob(range.knob),
                    "var {} at {}",
                    range.var_index,
                    base_value
                );
            }
        }
    }

    #[test]
    fn test_object_kind_only_moves_at_rounding_boundary() {
        let base = map_v1(&MacroVars::uniform(50));
        let stepped = map_v1(&MacroVars::uniform(50).with(2, 51));
        assert_eq!(stepped.object.kind, base.object.kind);
        assert!(stepped.object_kind_value > base.object_kind_value);
    }
}
