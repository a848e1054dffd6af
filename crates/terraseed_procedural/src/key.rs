//! # Generation Keys
//!
//! The identity of a generated region: where it is, and the parameters it
//! is generated from.
//!
//! Construction never fails. Macro vars arrive from shareable links and
//! other untrusted sources, so every constructor clamps instead of
//! rejecting.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mixer::hash_ints;

/// Number of macro vars in a parameter set.
pub const MACRO_VAR_COUNT: usize = 10;

/// Largest legal macro var value.
pub const MACRO_VAR_MAX: u8 = 100;

/// Value used for missing or unparseable macro vars.
pub const DEFAULT_MACRO_VAR: u8 = 50;

/// Region coordinate in the world grid (in regions, not cells).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionCoord {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
}

impl RegionCoord {
    /// Creates a region coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The four axis-aligned neighbours, in north, east, south, west order.
    ///
    /// At the edge of the `i32` range a neighbour saturates to the
    /// coordinate itself; callers filter those out.
    #[must_use]
    pub const fn neighbors(self) -> [Self; 4] {
        [
            Self::new(self.x, self.y.saturating_sub(1)),
            Self::new(self.x.saturating_add(1), self.y),
            Self::new(self.x, self.y.saturating_add(1)),
            Self::new(self.x.saturating_sub(1), self.y),
        ]
    }
}

impl fmt::Display for RegionCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The ten user-facing generation sliders, each in `[0, 100]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MacroVars([u8; MACRO_VAR_COUNT]);

impl MacroVars {
    /// Creates macro vars, clamping each value to `[0, 100]`.
    #[must_use]
    pub const fn new(values: [u8; MACRO_VAR_COUNT]) -> Self {
        let mut clamped = values;
        let mut i = 0;
        while i < MACRO_VAR_COUNT {
            if clamped[i] > MACRO_VAR_MAX {
                clamped[i] = MACRO_VAR_MAX;
            }
            i += 1;
        }
        Self(clamped)
    }

    /// All ten vars set to the same value (clamped).
    #[must_use]
    pub const fn uniform(value: u8) -> Self {
        Self::new([value; MACRO_VAR_COUNT])
    }

    /// Builds vars from arbitrary integers.
    ///
    /// Values are clamped to `[0, 100]`. Slices shorter than ten entries
    /// are padded with [`DEFAULT_MACRO_VAR`]; extra entries are ignored.
    #[must_use]
    pub fn from_ints(values: &[i64]) -> Self {
        let mut vars = [DEFAULT_MACRO_VAR; MACRO_VAR_COUNT];
        for (slot, &value) in vars.iter_mut().zip(values) {
            *slot = clamp_int(value);
        }
        Self(vars)
    }

    /// Builds vars from floating point input.
    ///
    /// Values are rounded then clamped. NaN maps to [`DEFAULT_MACRO_VAR`].
    /// Length handling matches [`MacroVars::from_ints`].
    #[must_use]
    pub fn from_floats(values: &[f64]) -> Self {
        let mut vars = [DEFAULT_MACRO_VAR; MACRO_VAR_COUNT];
        for (slot, &value) in vars.iter_mut().zip(values) {
            *slot = clamp_float(value);
        }
        Self(vars)
    }

    /// Returns a copy with one var replaced (clamped). Out-of-range indices
    /// leave the vars unchanged.
    #[must_use]
    pub fn with(mut self, index: usize, value: i64) -> Self {
        if let Some(slot) = self.0.get_mut(index) {
            *slot = clamp_int(value);
        }
        self
    }

    /// Returns the raw values.
    #[inline]
    #[must_use]
    pub const fn values(&self) -> &[u8; MACRO_VAR_COUNT] {
        &self.0
    }

    /// Returns var `index` as a fraction in `[0, 1]`.
    #[inline]
    #[must_use]
    pub fn fraction(&self, index: usize) -> f64 {
        f64::from(self.0[index]) / f64::from(MACRO_VAR_MAX)
    }

    /// Order-sensitive digest of all ten values.
    #[must_use]
    pub fn digest(&self) -> u32 {
        let mut values = [0_i64; MACRO_VAR_COUNT];
        for (out, &value) in values.iter_mut().zip(&self.0) {
            *out = i64::from(value);
        }
        hash_ints(&values)
    }
}

impl Default for MacroVars {
    fn default() -> Self {
        Self::uniform(DEFAULT_MACRO_VAR)
    }
}

fn clamp_int(value: i64) -> u8 {
    value.clamp(0, i64::from(MACRO_VAR_MAX)) as u8
}

fn clamp_float(value: f64) -> u8 {
    if value.is_nan() {
        return DEFAULT_MACRO_VAR;
    }
    value.round().clamp(0.0, f64::from(MACRO_VAR_MAX)) as u8
}

/// Which frozen parameter mapping a key is generated with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingVersion {
    /// Direct linear remap of macro vars.
    V1,
    /// Archetype selection plus micro vars.
    #[default]
    V2,
}

impl MappingVersion {
    /// The mapping new keys use unless told otherwise.
    pub const CURRENT: Self = Self::V2;

    /// Numeric tag used in links and hashes.
    #[inline]
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
        }
    }

    /// Parses a numeric tag.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::V1),
            2 => Some(Self::V2),
            _ => None,
        }
    }
}

impl fmt::Display for MappingVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.tag())
    }
}

/// Identity of one generated region.
///
/// Two equal keys always resolve to equal artifacts. The region coordinate
/// is part of the identity but does not feed terrain synthesis: the same
/// seed and vars produce the same grid wherever they are placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GenerationKey {
    region: RegionCoord,
    seed: i64,
    vars: MacroVars,
    mapping: MappingVersion,
}

impl GenerationKey {
    /// Creates a key using the current mapping version.
    #[must_use]
    pub const fn new(region: RegionCoord, seed: i64, vars: MacroVars) -> Self {
        Self::with_mapping(region, seed, vars, MappingVersion::CURRENT)
    }

    /// Creates a key pinned to a mapping version.
    #[must_use]
    pub const fn with_mapping(
        region: RegionCoord,
        seed: i64,
        vars: MacroVars,
        mapping: MappingVersion,
    ) -> Self {
        Self { region, seed, vars, mapping }
    }

    /// Region coordinate.
    #[inline]
    #[must_use]
    pub const fn region(&self) -> RegionCoord {
        self.region
    }

    /// World seed.
    #[inline]
    #[must_use]
    pub const fn seed(&self) -> i64 {
        self.seed
    }

    /// Macro vars.
    #[inline]
    #[must_use]
    pub const fn vars(&self) -> &MacroVars {
        &self.vars
    }

    /// Mapping version.
    #[inline]
    #[must_use]
    pub const fn mapping(&self) -> MappingVersion {
        self.mapping
    }

    /// The same parameters placed at another region.
    #[must_use]
    pub const fn at(self, region: RegionCoord) -> Self {
        Self { region, ..self }
    }
}

impl fmt::Display for GenerationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} seed={}", self.mapping, self.region, self.seed)
    }
}
