//! # TERRASEED Procedural Generation
//!
//! Deterministic tile-world regions from a seed and ten macro sliders.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: the same key always produces the same artifact,
//!    down to the content hash
//! 2. **Versioned**: parameter mappings are frozen once shipped
//! 3. **Total**: any input maps to some world; nothing in generation fails
//! 4. **Pure**: no global state, no shared RNG, no clocks
//!
//! ## Core Components
//!
//! - `mixer`: FNV-1a hashing and hashed random draws
//! - `noise`: lattice value noise
//! - `mapping`: macro vars to synthesis parameters (V1, V2)
//! - `Synthesizer`: the grid pipeline and content hash
//! - `DeterminismVerifier`: repeated synthesis with hash comparison
//! - `ShareLink`: text form of world parameters
//! - `ArtifactCodec`: compressed binary artifacts
//!
//! ## Example
//!
//! ```rust
//! use terraseed_procedural::{GenerationKey, MacroVars, RegionCoord, Synthesizer};
//!
//! let key = GenerationKey::new(RegionCoord::new(0, 0), 12345, MacroVars::default());
//! let synth = Synthesizer::new(32);
//!
//! let artifact = synth.build(&key);
//! assert_eq!(artifact.content_hash(), synth.build(&key).content_hash());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod codec;
pub mod config;
pub mod error;
pub mod key;
pub mod link;
pub mod mapping;
pub mod mixer;
pub mod noise;
pub mod synth;
pub mod verify;

pub use codec::{ArtifactCodec, PackedCell};
pub use config::GeneratorConfig;
pub use error::{ProceduralError, ProceduralResult};
pub use key::{GenerationKey, MacroVars, MappingVersion, RegionCoord, MACRO_VAR_COUNT};
pub use link::ShareLink;
pub use mapping::{map, map_key, Archetype, MappedParameters, MicroOverrides, ObjectKind};
pub use mixer::{hash_values, seeded_random01, HashPart};
pub use noise::ValueNoise;
pub use synth::{Cell, ContentHash, GridPos, Synthesizer, TerrainType, WorldArtifact};
pub use verify::{BreakKind, DeterminismRecord, DeterminismVerifier};
