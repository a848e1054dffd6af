//! # Canonical Grid Synthesis
//!
//! Turns a [`GenerationKey`] and its [`MappedParameters`] into a
//! [`WorldArtifact`]. The pipeline runs in a fixed order:
//!
//! 1. Elevation and moisture fields, row-major
//! 2. Base classification per cell
//! 3. Path network
//! 4. Rivers, carved into the elevation field
//! 5. Feature merge (bridge > path > river > base terrain)
//! 6. Planted object, spawn point, landmarks
//! 7. Content hash
//!
//! Each stage is a pure function of the key and the grid size. There is no
//! shared RNG: every random draw names its coordinates explicitly, so the
//! artifact for a key is identical across runs, threads and processes.

pub mod features;
pub mod grid;
pub mod hash;
pub mod terrain;

pub use grid::{
    Cell, ContentHash, GridPos, PlantedObject, TerrainType, WorldArtifact, FLAG_BRIDGE,
    FLAG_PATH, FLAG_RIVER,
};
pub use hash::{content_hash, dequantize, quantize, HASH_FORMAT_VERSION};
pub use terrain::TerrainSampler;

use grid::ArtifactParts;

use crate::config::GeneratorConfig;
use crate::key::GenerationKey;
use crate::mapping::{map_key, MappedParameters};

/// Smallest supported grid edge.
pub const MIN_GRID_SIZE: usize = 16;

/// Largest supported grid edge.
pub const MAX_GRID_SIZE: usize = 512;

/// Grid edge used when nothing else is configured.
pub const DEFAULT_GRID_SIZE: usize = 64;

/// Extra moisture on river cells.
const RIVER_MOISTURE: f64 = 0.3;

/// Builds world artifacts.
///
/// Cheap to clone and `Send + Sync`; the cache shares one across its
/// blocking build tasks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Synthesizer {
    grid_size: usize,
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_SIZE)
    }
}

impl Synthesizer {
    /// Creates a synthesizer. The grid size is clamped to the supported range.
    #[must_use]
    pub fn new(grid_size: usize) -> Self {
        Self {
            grid_size: grid_size.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE),
        }
    }

    /// Creates a synthesizer from generator configuration.
    #[must_use]
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.grid_size)
    }

    /// Grid edge length.
    #[inline]
    #[must_use]
    pub const fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Maps the key's parameters and synthesizes.
    #[must_use]
    pub fn build(&self, key: &GenerationKey) -> WorldArtifact {
        self.synthesize(key, &map_key(key))
    }

    /// Synthesizes an artifact from already mapped parameters.
    ///
    /// Never fails. A cell whose elevation is not finite is classified as
    /// ground and counted in [`WorldArtifact::anomalies`].
    #[must_use]
    pub fn synthesize(&self, key: &GenerationKey, params: &MappedParameters) -> WorldArtifact {
        let size = self.grid_size;
        let seed = key.seed();
        let knobs = params.knobs();
        let sampler = TerrainSampler::new(seed, knobs, size);

        // Stage 1-2: fields and base classification.
        let mut elevation = Vec::with_capacity(size * size);
        let mut base = Vec::with_capacity(size * size);
        let mut anomalies = 0u32;
        for y in 0..size {
            for x in 0..size {
                let e = sampler.elevation(x, y);
                let kind = sampler.classify(x, y, e).unwrap_or_else(|| {
                    anomalies += 1;
                    tracing::warn!(
                        "Non-finite elevation at ({x}, {y}) for {key}, classified as ground"
                    );
                    TerrainType::Ground
                });
                elevation.push(if e.is_finite() { e } else { 0.0 });
                base.push(kind);
            }
        }
        let moisture: Vec<f64> = (0..size * size)
            .map(|i| sampler.moisture(i % size, i / size, elevation[i]))
            .collect();

        // Stage 3-4: features.
        let paths = features::trace_paths(seed, &knobs, size);
        let rivers = features::trace_rivers(seed, &knobs, size, &elevation);

        // Stage 5: merge.
        let cells: Vec<Cell> = (0..size * size)
            .map(|i| {
                let mut e = elevation[i];
                let mut m = moisture[i];
                let mut cell = Cell { kind: base[i], ..Cell::default() };

                if rivers[i] {
                    e = features::carve_river(e, &knobs);
                    m = (m + RIVER_MOISTURE).min(1.0);
                }

                if paths[i] && (rivers[i] || base[i] == TerrainType::Water) {
                    cell.kind = TerrainType::Bridge;
                    cell.is_bridge = true;
                } else if paths[i] {
                    cell.kind = TerrainType::Path;
                    cell.is_path = true;
                } else if rivers[i] {
                    cell.kind = TerrainType::Water;
                    cell.has_river = true;
                }

                cell.elevation = e as f32;
                cell.moisture = m as f32;
                cell
            })
            .collect();

        // Stage 6: placement.
        let kinds: Vec<TerrainType> = cells.iter().map(|cell| cell.kind).collect();
        let planted_object = features::place_object(&knobs.object, size);
        let spawn_point = features::find_spawn(&kinds, size);
        let landmarks = features::place_landmarks(seed, &knobs, &kinds, size, &planted_object);

        // Stage 7: hash.
        let artifact = WorldArtifact::seal(ArtifactParts {
            key: *key,
            archetype: params.archetype(),
            grid_size: size,
            cells,
            planted_object,
            spawn_point,
            landmarks,
            anomalies,
        });

        tracing::debug!(
            "Synthesized {} ({}x{}) hash={} landmarks={}",
            key,
            size,
            size,
            artifact.content_hash(),
            artifact.landmarks().len()
        );

        artifact
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{MacroVars, MappingVersion, RegionCoord};
    use crate::mapping::map;

    fn key(seed: i64, vars: MacroVars, mapping: MappingVersion) -> GenerationKey {
        GenerationKey::with_mapping(RegionCoord::new(0, 0), seed, vars, mapping)
    }

    #[test]
    fn test_grid_size_clamped() {
        assert_eq!(Synthesizer::new(1).grid_size(), MIN_GRID_SIZE);
        assert_eq!(Synthesizer::new(10_000).grid_size(), MAX_GRID_SIZE);
        assert_eq!(Synthesizer::default().grid_size(), DEFAULT_GRID_SIZE);
    }

    #[test]
    fn test_synthesis_is_repeatable() {
        let synth = Synthesizer::new(48);
        let vars = MacroVars::new([10, 90, 30, 60, 40, 70, 80, 65, 20, 50]);
        let k = key(777, vars, MappingVersion::V2);
        let a = synth.build(&k);
        let b = synth.build(&k);
        assert_eq!(a.content_hash(), b.content_hash());
        assert_eq!(a, b);
    }

    #[test]
    fn test_cell_invariants() {
        let synth = Synthesizer::new(64);
        for seed in [1, 2, 3, 12345] {
            let artifact = synth.build(&key(seed, MacroVars::uniform(70), MappingVersion::V2));
            assert_eq!(artifact.cells().len(), 64 * 64);
            assert_eq!(artifact.anomalies(), 0);
            for cell in artifact.cells() {
                assert!((0.0..=1.0).contains(&cell.elevation));
                assert!((0.0..=1.0).contains(&cell.moisture));
                assert!(cell.flags().count_ones() <= 1);
                assert_eq!(cell.is_bridge, cell.kind == TerrainType::Bridge);
                assert_eq!(cell.is_path, cell.kind == TerrainType::Path);
                if cell.has_river {
                    assert_eq!(cell.kind, TerrainType::Water);
                }
            }
        }
    }

    #[test]
    fn test_region_is_identity_only() {
        let synth = Synthesizer::new(32);
        let a = key(9, MacroVars::default(), MappingVersion::V2);
        let b = a.at(RegionCoord::new(5, -3));
        assert_eq!(synth.build(&a).content_hash(), synth.build(&b).content_hash());
    }

    #[test]
    fn test_mapping_version_changes_output() {
        let synth = Synthesizer::new(32);
        let v1 = synth.build(&key(9, MacroVars::default(), MappingVersion::V1));
        let v2 = synth.build(&key(9, MacroVars::default(), MappingVersion::V2));
        assert!(v1.archetype().is_none());
        assert!(v2.archetype().is_some());
        assert_ne!(v1.content_hash(), v2.content_hash());
    }

    #[test]
    fn test_paths_appear_with_density() {
        let synth = Synthesizer::new(64);
        let mut vars = MacroVars::default().with(7, 100);
        let dense = synth.build(&key(4, vars, MappingVersion::V1));
        vars = vars.with(7, 0);
        let none = synth.build(&key(4, vars, MappingVersion::V1));

        let path_like =
            |a: &WorldArtifact| a.count(TerrainType::Path) + a.count(TerrainType::Bridge);
        assert!(path_like(&dense) > 64);
        assert_eq!(path_like(&none), 0);
    }

    #[test]
    fn test_water_level_drives_water_share() {
        let synth = Synthesizer::new(64);
        let dry = synth.build(&key(21, MacroVars::default().with(4, 0), MappingVersion::V1));
        let wet = synth.build(&key(21, MacroVars::default().with(4, 100), MappingVersion::V1));
        assert!(wet.count(TerrainType::Water) > dry.count(TerrainType::Water));
    }

    #[test]
    fn test_spawn_is_walkable() {
        let synth = Synthesizer::new(64);
        for seed in 0..10 {
            let artifact = synth.build(&key(seed, MacroVars::default(), MappingVersion::V2));
            let spawn = artifact.spawn_point();
            let cell = artifact.cell(spawn.x as usize, spawn.y as usize);
            assert!(cell.is_some_and(|c| c.kind.is_walkable()));
        }
    }

    #[test]
    fn test_synthesize_uses_given_params() {
        let synth = Synthesizer::new(32);
        let k = key(5, MacroVars::default(), MappingVersion::V2);
        let forced_v1 = synth.synthesize(&k, &map(MappingVersion::V1, 5, k.vars()));
        assert!(forced_v1.archetype().is_none());
        assert_eq!(*forced_v1.key(), k);
    }
}
