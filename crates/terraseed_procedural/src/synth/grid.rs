//! # World Artifact
//!
//! The canonical output of synthesis: a square grid of classified cells
//! plus feature placement and a content hash.
//!
//! Artifacts are immutable once built. Nothing hands out `&mut` access to
//! cells; consumers share them as `Arc<WorldArtifact>`.

use std::fmt;
use std::mem::size_of;

use super::hash::content_hash;
use crate::key::GenerationKey;
use crate::mapping::{Archetype, ObjectKind};

/// Terrain classification of one cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TerrainType {
    /// Standing water or river channel.
    Water = 0,
    /// Open ground.
    #[default]
    Ground = 1,
    /// Wooded ground.
    Forest = 2,
    /// Mountain slope.
    Mountain = 3,
    /// Walkable path.
    Path = 4,
    /// Path crossing water.
    Bridge = 5,
    /// Shoreline sand.
    Sand = 6,
    /// Exposed rock below the peaks.
    Rock = 7,
    /// Snow-capped peak.
    Snow = 8,
}

impl TerrainType {
    /// Every terrain type, in id order.
    pub const ALL: [Self; 9] = [
        Self::Water,
        Self::Ground,
        Self::Forest,
        Self::Mountain,
        Self::Path,
        Self::Bridge,
        Self::Sand,
        Self::Rock,
        Self::Snow,
    ];

    /// Numeric id.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Converts from a numeric id.
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Water),
            1 => Some(Self::Ground),
            2 => Some(Self::Forest),
            3 => Some(Self::Mountain),
            4 => Some(Self::Path),
            5 => Some(Self::Bridge),
            6 => Some(Self::Sand),
            7 => Some(Self::Rock),
            8 => Some(Self::Snow),
            _ => None,
        }
    }

    /// Whether a traveller can stand here.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, Self::Ground | Self::Forest | Self::Path | Self::Bridge | Self::Sand)
    }
}

/// Flag bit for [`Cell::has_river`].
pub const FLAG_RIVER: u8 = 1 << 0;
/// Flag bit for [`Cell::is_path`].
pub const FLAG_PATH: u8 = 1 << 1;
/// Flag bit for [`Cell::is_bridge`].
pub const FLAG_BRIDGE: u8 = 1 << 2;

/// One grid cell.
///
/// At most one of `has_river`, `is_path` and `is_bridge` is set.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cell {
    /// Terrain classification.
    pub kind: TerrainType,
    /// Elevation in `[0, 1]`.
    pub elevation: f32,
    /// Moisture in `[0, 1]`.
    pub moisture: f32,
    /// Part of a river channel.
    pub has_river: bool,
    /// Part of the path network.
    pub is_path: bool,
    /// Path crossing water.
    pub is_bridge: bool,
}

impl Cell {
    /// Packs the three feature flags into bits.
    #[inline]
    #[must_use]
    pub const fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.has_river {
            flags |= FLAG_RIVER;
        }
        if self.is_path {
            flags |= FLAG_PATH;
        }
        if self.is_bridge {
            flags |= FLAG_BRIDGE;
        }
        flags
    }
}

/// A cell position in the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPos {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl GridPos {
    /// Creates a grid position.
    #[inline]
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// The single planted object of a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlantedObject {
    /// Object kind.
    pub kind: ObjectKind,
    /// Grid position, always away from the border.
    pub position: GridPos,
}

/// Digest of an artifact's quantized cell data.
///
/// Equal hashes across processes mean identical rendering input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(u32);

impl ContentHash {
    /// Wraps a raw hash value.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw hash value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Eight lowercase hex digits.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("{:08x}", self.0)
    }

    /// Parses the form produced by [`ContentHash::to_hex`].
    #[must_use]
    pub fn from_hex(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() || text.len() > 8 {
            return None;
        }
        u32::from_str_radix(text, 16).ok().map(Self)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// A generated region.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldArtifact {
    key: GenerationKey,
    archetype: Option<Archetype>,
    grid_size: usize,
    cells: Vec<Cell>,
    planted_object: PlantedObject,
    spawn_point: GridPos,
    landmarks: Vec<GridPos>,
    anomalies: u32,
    content_hash: ContentHash,
}

/// Fields of an artifact before hashing.
#[derive(Clone, Debug)]
pub(crate) struct ArtifactParts {
    pub key: GenerationKey,
    pub archetype: Option<Archetype>,
    pub grid_size: usize,
    pub cells: Vec<Cell>,
    pub planted_object: PlantedObject,
    pub spawn_point: GridPos,
    pub landmarks: Vec<GridPos>,
    pub anomalies: u32,
}

impl WorldArtifact {
    /// Seals parts into an artifact, computing the content hash.
    pub(crate) fn seal(parts: ArtifactParts) -> Self {
        debug_assert_eq!(parts.cells.len(), parts.grid_size * parts.grid_size);
        let content_hash = content_hash(
            parts.grid_size,
            &parts.cells,
            &parts.planted_object,
            parts.spawn_point,
            &parts.landmarks,
        );
        Self {
            key: parts.key,
            archetype: parts.archetype,
            grid_size: parts.grid_size,
            cells: parts.cells,
            planted_object: parts.planted_object,
            spawn_point: parts.spawn_point,
            landmarks: parts.landmarks,
            anomalies: parts.anomalies,
            content_hash,
        }
    }

    /// Key this artifact was generated for.
    #[inline]
    #[must_use]
    pub const fn key(&self) -> &GenerationKey {
        &self.key
    }

    /// Archetype, for V2 artifacts.
    #[inline]
    #[must_use]
    pub const fn archetype(&self) -> Option<Archetype> {
        self.archetype
    }

    /// Width and height of the grid.
    #[inline]
    #[must_use]
    pub const fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// All cells in row-major order.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cell at `(x, y)`, or `None` outside the grid.
    #[inline]
    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        if x < self.grid_size && y < self.grid_size {
            self.cells.get(y * self.grid_size + x)
        } else {
            None
        }
    }

    /// One row of cells.
    #[must_use]
    pub fn row(&self, y: usize) -> Option<&[Cell]> {
        let start = y.checked_mul(self.grid_size)?;
        self.cells.get(start..start + self.grid_size)
    }

    /// The planted object.
    #[inline]
    #[must_use]
    pub const fn planted_object(&self) -> &PlantedObject {
        &self.planted_object
    }

    /// Where a visitor appears.
    #[inline]
    #[must_use]
    pub const fn spawn_point(&self) -> GridPos {
        self.spawn_point
    }

    /// Landmark positions in row-major order.
    #[inline]
    #[must_use]
    pub fn landmarks(&self) -> &[GridPos] {
        &self.landmarks
    }

    /// Cells with a non-finite elevation, classified as ground.
    #[inline]
    #[must_use]
    pub const fn anomalies(&self) -> u32 {
        self.anomalies
    }

    /// Content hash.
    #[inline]
    #[must_use]
    pub const fn content_hash(&self) -> ContentHash {
        self.content_hash
    }

    /// Number of cells of a terrain type.
    #[must_use]
    pub fn count(&self, kind: TerrainType) -> usize {
        self.cells.iter().filter(|cell| cell.kind == kind).count()
    }

    /// Approximate heap plus inline size, for cache budgeting.
    #[must_use]
    pub fn approx_bytes(&self) -> usize {
        size_of::<Self>()
            + self.cells.capacity() * size_of::<Cell>()
            + self.landmarks.capacity() * size_of::<GridPos>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terrain_ids_round_trip() {
        for kind in TerrainType::ALL {
            assert_eq!(TerrainType::from_id(kind.id()), Some(kind));
        }
        assert_eq!(TerrainType::from_id(9), None);
    }

    #[test]
    fn test_flags() {
        let mut cell = Cell::default();
        assert_eq!(cell.flags(), 0);
        cell.is_bridge = true;
        assert_eq!(cell.flags(), FLAG_BRIDGE);
        cell.is_bridge = false;
        cell.has_river = true;
        assert_eq!(cell.flags(), FLAG_RIVER);
    }

    #[test]
    fn test_hash_hex() {
        let hash = ContentHash::from_raw(0x00ab_cdef);
        assert_eq!(hash.to_hex(), "00abcdef");
        assert_eq!(hash.to_string(), "00abcdef");
        assert_eq!(ContentHash::from_hex("00abcdef"), Some(hash));
        assert_eq!(ContentHash::from_hex("xyz"), None);
        assert_eq!(ContentHash::from_hex("123456789"), None);
    }

    #[test]
    fn test_walkable() {
        assert!(TerrainType::Bridge.is_walkable());
        assert!(!TerrainType::Water.is_walkable());
        assert!(!TerrainType::Snow.is_walkable());
    }
}
