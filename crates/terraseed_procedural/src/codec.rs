//! # Artifact Codec
//!
//! Compact binary form of a [`WorldArtifact`] for shipping a grid to
//! rendering clients.
//!
//! ## Layout (before compression)
//!
//! ```text
//! [PackedHeader: 72 bytes]
//! [landmarks: count × (x: u32 LE, y: u32 LE)]
//! [cells: grid_size² × PackedCell (4 bytes)]
//! ```
//!
//! The whole buffer is LZ4-compressed with its length prepended. Cells
//! store quantized elevation and moisture, which is exactly what the
//! content hash sees, so a decoded artifact rehashes to the stored hash.
//! Decoding recomputes the hash and rejects the payload if it differs.

use std::mem::size_of;

use bytemuck::{Pod, Zeroable};
use lz4_flex::{compress_prepend_size, decompress_size_prepended};

use crate::error::{ProceduralError, ProceduralResult};
use crate::key::{GenerationKey, MacroVars, MappingVersion, RegionCoord, MACRO_VAR_COUNT};
use crate::mapping::{Archetype, ObjectKind};
use crate::synth::grid::ArtifactParts;
use crate::synth::{
    dequantize, quantize, Cell, GridPos, PlantedObject, TerrainType, WorldArtifact, FLAG_BRIDGE,
    FLAG_PATH, FLAG_RIVER, MAX_GRID_SIZE, MIN_GRID_SIZE,
};

/// Payload magic.
pub const CODEC_MAGIC: [u8; 4] = *b"TSRA";

/// Payload format version.
pub const CODEC_VERSION: u8 = 1;

const NO_ARCHETYPE: u8 = u8::MAX;
const KNOWN_FLAGS: u8 = FLAG_RIVER | FLAG_PATH | FLAG_BRIDGE;
const HEADER_LEN: usize = size_of::<PackedHeader>();

/// One cell in 4 bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct PackedCell {
    /// Terrain id.
    pub kind: u8,
    /// Elevation quantum.
    pub elevation: u8,
    /// Moisture quantum.
    pub moisture: u8,
    /// Feature flag bits.
    pub flags: u8,
}

impl PackedCell {
    /// Packs a cell.
    #[inline]
    #[must_use]
    pub fn pack(cell: &Cell) -> Self {
        Self {
            kind: cell.kind.id(),
            elevation: quantize(cell.elevation),
            moisture: quantize(cell.moisture),
            flags: cell.flags(),
        }
    }

    /// Unpacks a cell.
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::CorruptArtifact`] for an unknown terrain
    /// id or unknown flag bits.
    pub fn unpack(self) -> ProceduralResult<Cell> {
        let kind = TerrainType::from_id(self.kind)
            .ok_or_else(|| ProceduralError::corrupt(format!("unknown terrain id {}", self.kind)))?;
        if self.flags & !KNOWN_FLAGS != 0 {
            return Err(ProceduralError::corrupt(format!("unknown cell flags {:#04x}", self.flags)));
        }
        Ok(Cell {
            kind,
            elevation: dequantize(self.elevation),
            moisture: dequantize(self.moisture),
            has_river: self.flags & FLAG_RIVER != 0,
            is_path: self.flags & FLAG_PATH != 0,
            is_bridge: self.flags & FLAG_BRIDGE != 0,
        })
    }
}

/// Fixed header. Multi-byte fields are little-endian on the wire.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
struct PackedHeader {
    magic: [u8; 4],
    version: u8,
    mapping: u8,
    archetype: u8,
    object_kind: u8,
    region_x: i32,
    region_y: i32,
    seed: i64,
    grid_size: u32,
    object_x: u32,
    object_y: u32,
    spawn_x: u32,
    spawn_y: u32,
    anomalies: u32,
    landmark_count: u32,
    content_hash: u32,
    vars: [u8; MACRO_VAR_COUNT],
    _reserved: [u8; 6],
}

/// Encodes and decodes artifacts.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArtifactCodec;

impl ArtifactCodec {
    /// Encodes an artifact into a compressed payload.
    #[must_use]
    pub fn encode(artifact: &WorldArtifact) -> Vec<u8> {
        let key = artifact.key();
        let object = artifact.planted_object();
        let spawn = artifact.spawn_point();
        let landmarks = artifact.landmarks();

        let header = PackedHeader {
            magic: CODEC_MAGIC,
            version: CODEC_VERSION,
            mapping: key.mapping().tag(),
            archetype: artifact.archetype().map_or(NO_ARCHETYPE, |a| a.index() as u8),
            object_kind: object.kind.index(),
            region_x: key.region().x.to_le(),
            region_y: key.region().y.to_le(),
            seed: key.seed().to_le(),
            grid_size: (artifact.grid_size() as u32).to_le(),
            object_x: object.position.x.to_le(),
            object_y: object.position.y.to_le(),
            spawn_x: spawn.x.to_le(),
            spawn_y: spawn.y.to_le(),
            anomalies: artifact.anomalies().to_le(),
            landmark_count: (landmarks.len() as u32).to_le(),
            content_hash: artifact.content_hash().raw().to_le(),
            vars: *key.vars().values(),
            _reserved: [0; 6],
        };

        let cells: Vec<PackedCell> = artifact.cells().iter().map(PackedCell::pack).collect();

        let mut raw = Vec::with_capacity(
            HEADER_LEN + landmarks.len() * 8 + cells.len() * size_of::<PackedCell>(),
        );
        raw.extend_from_slice(bytemuck::bytes_of(&header));
        for landmark in landmarks {
            raw.extend_from_slice(&landmark.x.to_le_bytes());
            raw.extend_from_slice(&landmark.y.to_le_bytes());
        }
        raw.extend_from_slice(bytemuck::cast_slice(&cells));

        compress_prepend_size(&raw)
    }

    /// Decodes a payload produced by [`ArtifactCodec::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::Decompress`] if the LZ4 stream is broken
    /// and [`ProceduralError::CorruptArtifact`] if the contents are
    /// malformed or do not rehash to the stored content hash.
    pub fn decode(payload: &[u8]) -> ProceduralResult<WorldArtifact> {
        let raw = decompress_size_prepended(payload)?;
        if raw.len() < HEADER_LEN {
            return Err(ProceduralError::corrupt("payload shorter than header"));
        }
        let header: PackedHeader = bytemuck::pod_read_unaligned(&raw[..HEADER_LEN]);

        if header.magic != CODEC_MAGIC {
            return Err(ProceduralError::corrupt("bad magic"));
        }
        if header.version != CODEC_VERSION {
            return Err(ProceduralError::corrupt(format!("unsupported version {}", header.version)));
        }

        let mapping = MappingVersion::from_tag(header.mapping).ok_or_else(|| {
            ProceduralError::corrupt(format!("unknown mapping {}", header.mapping))
        })?;
        let archetype = match header.archetype {
            NO_ARCHETYPE => None,
            index => Some(
                *Archetype::ALL
                    .get(usize::from(index))
                    .ok_or_else(|| ProceduralError::corrupt(format!("unknown archetype {index}")))?,
            ),
        };
        if header.object_kind > ObjectKind::Crystal.index() {
            return Err(ProceduralError::corrupt(format!(
                "unknown object kind {}",
                header.object_kind
            )));
        }

        let grid_size = u32::from_le(header.grid_size) as usize;
        if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&grid_size) {
            return Err(ProceduralError::corrupt(format!("grid size {grid_size} out of range")));
        }

        let landmark_count = u32::from_le(header.landmark_count) as usize;
        let cell_count = grid_size * grid_size;
        let landmark_bytes = landmark_count
            .checked_mul(8)
            .ok_or_else(|| ProceduralError::corrupt("landmark count overflow"))?;
        let expected = HEADER_LEN + landmark_bytes + cell_count * size_of::<PackedCell>();
        if raw.len() != expected {
            return Err(ProceduralError::corrupt(format!(
                "payload is {} bytes, expected {expected}",
                raw.len()
            )));
        }

        let landmark_end = HEADER_LEN + landmark_bytes;
        let landmarks: Vec<GridPos> = raw[HEADER_LEN..landmark_end]
            .chunks_exact(8)
            .map(|pair| GridPos::new(read_u32(&pair[..4]), read_u32(&pair[4..])))
            .collect();

        let cells = bytemuck::cast_slice::<u8, PackedCell>(&raw[landmark_end..])
            .iter()
            .map(|packed| packed.unpack())
            .collect::<ProceduralResult<Vec<Cell>>>()?;

        let key = GenerationKey::with_mapping(
            RegionCoord::new(i32::from_le(header.region_x), i32::from_le(header.region_y)),
            i64::from_le(header.seed),
            MacroVars::new(header.vars),
            mapping,
        );

        let artifact = WorldArtifact::seal(ArtifactParts {
            key,
            archetype,
            grid_size,
            cells,
            planted_object: PlantedObject {
                kind: ObjectKind::from_index(header.object_kind),
                position: GridPos::new(
                    u32::from_le(header.object_x),
                    u32::from_le(header.object_y),
                ),
            },
            spawn_point: GridPos::new(u32::from_le(header.spawn_x), u32::from_le(header.spawn_y)),
            landmarks,
            anomalies: u32::from_le(header.anomalies),
        });

        let stored = u32::from_le(header.content_hash);
        if artifact.content_hash().raw() != stored {
            return Err(ProceduralError::corrupt(format!(
                "content hash mismatch: stored {stored:08x}, decoded {}",
                artifact.content_hash()
            )));
        }

        Ok(artifact)
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::Synthesizer;

    fn artifact() -> WorldArtifact {
        let key = GenerationKey::new(RegionCoord::new(-2, 9), 31337, MacroVars::uniform(60));
        Synthesizer::new(32).build(&key)
    }

    #[test]
    fn test_header_has_no_padding() {
        assert_eq!(HEADER_LEN, 72);
        assert_eq!(size_of::<PackedCell>(), 4);
    }

    #[test]
    fn test_decode_preserves_hash_and_features() {
        let original = artifact();
        let decoded = ArtifactCodec::decode(&ArtifactCodec::encode(&original)).unwrap();

        assert_eq!(decoded.content_hash(), original.content_hash());
        assert_eq!(decoded.key(), original.key());
        assert_eq!(decoded.archetype(), original.archetype());
        assert_eq!(decoded.spawn_point(), original.spawn_point());
        assert_eq!(decoded.landmarks(), original.landmarks());
        assert_eq!(decoded.planted_object(), original.planted_object());
        for (a, b) in decoded.cells().iter().zip(original.cells()) {
            assert_eq!(a.kind, b.kind);
            assert_eq!(a.flags(), b.flags());
            assert!((a.elevation - b.elevation).abs() <= 0.5 / 255.0 + 1e-6);
        }
    }

    #[test]
    fn test_compression_shrinks_grid() {
        let original = artifact();
        let encoded = ArtifactCodec::encode(&original);
        assert!(encoded.len() < HEADER_LEN + original.cells().len() * 4);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(ArtifactCodec::decode(&[1, 2, 3]).is_err());
        let short = compress_prepend_size(&[0u8; 10]);
        assert!(matches!(
            ArtifactCodec::decode(&short),
            Err(ProceduralError::CorruptArtifact { .. })
        ));
    }

    #[test]
    fn test_tampered_cell_fails_hash_check() {
        let original = artifact();
        let mut raw = decompress_size_prepended(&ArtifactCodec::encode(&original)).unwrap();
        let last = raw.len() - 3;
        raw[last] = raw[last].wrapping_add(1);
        let err = ArtifactCodec::decode(&compress_prepend_size(&raw)).unwrap_err();
        assert!(err.to_string().contains("hash mismatch"), "{err}");
    }

    #[test]
    fn test_unknown_terrain_id() {
        let packed = PackedCell { kind: 42, ..PackedCell::default() };
        assert!(packed.unpack().is_err());
    }
}
