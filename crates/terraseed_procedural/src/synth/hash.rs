//! # Content Hash
//!
//! Fixed-order digest of an artifact's cell data.
//!
//! Floats never enter the accumulator. Elevation and moisture are rounded
//! to 8-bit quanta first, so two platforms that disagree in the last bits
//! of an `f64` noise sum still agree on the hash.
//!
//! Feeding order: format version, grid size, every cell in row-major order
//! as `(kind, elevation quantum, moisture quantum, flag bits)`, the planted
//! object, the spawn point, then landmarks.

use super::grid::{Cell, ContentHash, GridPos, PlantedObject};
use crate::mixer::Fnv32;

/// Bumped whenever the feeding order changes.
pub const HASH_FORMAT_VERSION: u32 = 1;

/// Quantization steps for `[0, 1]` values.
pub const QUANTUM_STEPS: f32 = 255.0;

/// Rounds a `[0, 1]` value to its 8-bit quantum.
///
/// Out-of-range values clamp; non-finite values quantize to zero.
#[inline]
#[must_use]
pub fn quantize(value: f32) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * QUANTUM_STEPS).round() as u8
}

/// Expands a quantum back to `[0, 1]`.
#[inline]
#[must_use]
pub fn dequantize(quantum: u8) -> f32 {
    f32::from(quantum) / QUANTUM_STEPS
}

/// Hashes finished artifact data.
#[must_use]
pub fn content_hash(
    grid_size: usize,
    cells: &[Cell],
    object: &PlantedObject,
    spawn: GridPos,
    landmarks: &[GridPos],
) -> ContentHash {
    let mut hasher = Fnv32::new();
    hasher.write_u32(HASH_FORMAT_VERSION);
    hasher.write_u32(grid_size as u32);

    for cell in cells {
        hasher.write_u8(cell.kind.id());
        hasher.write_u8(quantize(cell.elevation));
        hasher.write_u8(quantize(cell.moisture));
        hasher.write_u8(cell.flags());
    }

    hasher.write_u8(object.kind.index());
    write_pos(&mut hasher, object.position);
    write_pos(&mut hasher, spawn);

    hasher.write_u32(landmarks.len() as u32);
    for &landmark in landmarks {
        write_pos(&mut hasher, landmark);
    }

    ContentHash::from_raw(hasher.finish())
}

fn write_pos(hasher: &mut Fnv32, pos: GridPos) {
    hasher.write_u32(pos.x);
    hasher.write_u32(pos.y);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::ObjectKind;
    use crate::synth::grid::TerrainType;

    fn sample_cells() -> Vec<Cell> {
        (0..16)
            .map(|i| Cell {
                kind: if i % 3 == 0 { TerrainType::Water } else { TerrainType::Ground },
                elevation: 0.31,
                moisture: 0.62,
                ..Cell::default()
            })
            .collect()
    }

    fn object() -> PlantedObject {
        PlantedObject {
            kind: ObjectKind::Well,
            position: GridPos::new(2, 2),
        }
    }

    fn hash_of(cells: &[Cell]) -> ContentHash {
        content_hash(4, cells, &object(), GridPos::new(1, 1), &[])
    }

    #[test]
    fn test_quantize_bounds() {
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(1.0), 255);
        assert_eq!(quantize(-3.0), 0);
        assert_eq!(quantize(7.0), 255);
        assert_eq!(quantize(f32::NAN), 0);
    }

    #[test]
    fn test_dequantize_round_trips() {
        for quantum in 0..=255u8 {
            assert_eq!(quantize(dequantize(quantum)), quantum);
        }
    }

    #[test]
    fn test_sub_quantum_noise_is_invisible() {
        let cells = sample_cells();
        let mut jittered = cells.clone();
        jittered[5].elevation += 1e-5;
        assert_eq!(hash_of(&cells), hash_of(&jittered));
    }

    #[test]
    fn test_any_cell_change_is_visible() {
        let cells = sample_cells();
        let base = hash_of(&cells);

        let mut kind_changed = cells.clone();
        kind_changed[7].kind = TerrainType::Forest;
        assert_ne!(base, hash_of(&kind_changed));

        let mut flag_changed = cells.clone();
        flag_changed[7].is_path = true;
        assert_ne!(base, hash_of(&flag_changed));

        let mut elevation_changed = cells;
        elevation_changed[0].elevation = 0.5;
        assert_ne!(base, hash_of(&elevation_changed));
    }

    #[test]
    fn test_features_are_hashed() {
        let cells = sample_cells();
        let base = hash_of(&cells);
        let moved_spawn = content_hash(4, &cells, &object(), GridPos::new(2, 1), &[]);
        let with_landmark =
            content_hash(4, &cells, &object(), GridPos::new(1, 1), &[GridPos::new(3, 3)]);
        assert_ne!(base, moved_spawn);
        assert_ne!(base, with_landmark);
    }
}
