//! # TERRASEED Region Streaming
//!
//! Serves generated regions through a bounded cache and keeps the regions
//! around a visitor warm.
//!
//! ## Core Components
//!
//! - `RegionCache`: ready artifacts under a byte budget, one build per key
//! - `NeighborPreloader`: follows the active region, prefetches neighbours
//! - `ParamSource`: where region params come from (`InMemoryRegistry`)
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use terraseed_procedural::{MacroVars, RegionCoord, Synthesizer};
//! use terraseed_streaming::{
//!     CacheConfig, InMemoryRegistry, NeighborPreloader, RegionCache, RegionParams,
//! };
//!
//! let registry = Arc::new(InMemoryRegistry::new());
//! registry.claim_around(RegionCoord::new(0, 0), 1, RegionParams::new(7, MacroVars::default()));
//!
//! let cache = RegionCache::new(Synthesizer::new(64), CacheConfig::default());
//! let mut preloader = NeighborPreloader::new(cache, registry);
//! let artifact = preloader.enter_region(RegionCoord::new(0, 0)).await?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod cache;
pub mod config;
pub mod error;
pub mod preload;
pub mod registry;

pub use cache::{
    CacheStats, EntryState, PreloadHandle, PreloadOutcome, RegionBuilder, RegionCache,
};
pub use config::CacheConfig;
pub use error::{BuildError, CacheError, EnterError, LookupError, StreamingError, StreamingResult};
pub use preload::NeighborPreloader;
pub use registry::{InMemoryRegistry, ParamSource, RegionParams};
