//! # Neighbor Preloading
//!
//! Session object that follows a visitor across regions. Entering a region
//! builds it (or picks it up from the cache) and, when the region changed,
//! schedules the four axis neighbours in the background.

use std::sync::Arc;

use terraseed_procedural::{GenerationKey, RegionCoord, Synthesizer, WorldArtifact};

use crate::cache::{PreloadHandle, RegionBuilder, RegionCache};
use crate::error::EnterError;
use crate::registry::{resolve_params, ParamSource};

/// Tracks the active region and keeps its neighbours warm.
pub struct NeighborPreloader<S: ParamSource, B: RegionBuilder = Synthesizer> {
    cache: RegionCache<B>,
    source: Arc<S>,
    active: Option<GenerationKey>,
    last_preload: Option<PreloadHandle>,
}

impl<S: ParamSource, B: RegionBuilder> NeighborPreloader<S, B> {
    /// Creates a preloader over a shared cache and parameter source.
    #[must_use]
    pub fn new(cache: RegionCache<B>, source: Arc<S>) -> Self {
        Self {
            cache,
            source,
            active: None,
            last_preload: None,
        }
    }

    /// Key of the region the visitor is in.
    #[must_use]
    pub const fn active(&self) -> Option<&GenerationKey> {
        self.active.as_ref()
    }

    /// The cache this preloader feeds.
    #[must_use]
    pub const fn cache(&self) -> &RegionCache<B> {
        &self.cache
    }

    /// Takes the handle of the most recent neighbour preload.
    pub fn take_preload(&mut self) -> Option<PreloadHandle> {
        self.last_preload.take()
    }

    /// Moves the visitor into `coord`.
    ///
    /// Returns `Ok(None)` for an unclaimed region, which leaves the active
    /// region unchanged. Neighbour preloads start only after the entered
    /// region is ready, and only when the active key changed.
    ///
    /// # Errors
    ///
    /// Returns [`EnterError::Lookup`] if the region's params cannot be
    /// resolved in time, or [`EnterError::Build`] if its build fails.
    pub async fn enter_region(
        &mut self,
        coord: RegionCoord,
    ) -> Result<Option<Arc<WorldArtifact>>, EnterError> {
        let timeout = self.cache.config().lookup_timeout();
        let Some(params) = resolve_params(self.source.as_ref(), coord, timeout).await? else {
            tracing::debug!("Region {} is unclaimed", coord);
            return Ok(None);
        };

        let key = params.key_at(coord);
        let artifact = self.cache.ensure_ready(key).await?;

        if self.active != Some(key) {
            tracing::debug!("Active region is now {}", key);
            self.active = Some(key);
            self.last_preload = Some(self.cache.preload_neighbors(&key, Arc::clone(&self.source)));
        }

        Ok(Some(artifact))
    }
}
