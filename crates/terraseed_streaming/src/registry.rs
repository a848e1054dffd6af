//! # Parameter Sources
//!
//! Where a region's seed and vars come from. In production this is an
//! ownership service; the in-memory registry serves tests and the probe.

use std::collections::HashMap;
use std::future::{ready, Future};
use std::time::Duration;

use parking_lot::RwLock;
use terraseed_procedural::{GenerationKey, MacroVars, MappingVersion, RegionCoord, ShareLink};

use crate::error::LookupError;

/// Generation parameters claimed for one region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegionParams {
    /// World seed.
    pub seed: i64,
    /// Macro vars.
    pub vars: MacroVars,
    /// Mapping version.
    pub mapping: MappingVersion,
}

impl RegionParams {
    /// Creates params with the current mapping version.
    #[must_use]
    pub const fn new(seed: i64, vars: MacroVars) -> Self {
        Self {
            seed,
            vars,
            mapping: MappingVersion::CURRENT,
        }
    }

    /// Params carried by a shareable link.
    #[must_use]
    pub const fn from_link(link: &ShareLink) -> Self {
        Self {
            seed: link.seed,
            vars: link.vars,
            mapping: link.mapping,
        }
    }

    /// Generation key for these params at `region`.
    #[must_use]
    pub const fn key_at(&self, region: RegionCoord) -> GenerationKey {
        GenerationKey::with_mapping(region, self.seed, self.vars, self.mapping)
    }
}

/// Resolves region coordinates to generation parameters.
///
/// `Ok(None)` means the region is unclaimed and has no world.
pub trait ParamSource: Send + Sync + 'static {
    /// Looks up the params of one region.
    fn region_params(
        &self,
        coord: RegionCoord,
    ) -> impl Future<Output = Result<Option<RegionParams>, LookupError>> + Send;
}

/// Looks up `coord`, giving up after `timeout` if one is set.
pub(crate) async fn resolve_params<S: ParamSource>(
    source: &S,
    coord: RegionCoord,
    timeout: Option<Duration>,
) -> Result<Option<RegionParams>, LookupError> {
    let lookup = source.region_params(coord);
    match timeout {
        Some(limit) => tokio::time::timeout(limit, lookup)
            .await
            .unwrap_or(Err(LookupError::TimedOut)),
        None => lookup.await,
    }
}

/// Params held in a map.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    regions: RwLock<HashMap<RegionCoord, RegionParams>>,
}

impl InMemoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a region, replacing any previous params.
    pub fn claim(&self, coord: RegionCoord, params: RegionParams) {
        self.regions.write().insert(coord, params);
    }

    /// Claims every region in the square of `radius` around `centre`.
    pub fn claim_around(&self, centre: RegionCoord, radius: i32, params: RegionParams) {
        let mut regions = self.regions.write();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let coord =
                    RegionCoord::new(centre.x.saturating_add(dx), centre.y.saturating_add(dy));
                regions.insert(coord, params);
            }
        }
    }

    /// Releases a region.
    pub fn release(&self, coord: RegionCoord) -> Option<RegionParams> {
        self.regions.write().remove(&coord)
    }

    /// Params of a region, if claimed.
    #[must_use]
    pub fn get(&self, coord: RegionCoord) -> Option<RegionParams> {
        self.regions.read().get(&coord).copied()
    }

    /// Number of claimed regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.read().len()
    }

    /// Whether nothing is claimed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.read().is_empty()
    }
}

impl ParamSource for InMemoryRegistry {
    fn region_params(
        &self,
        coord: RegionCoord,
    ) -> impl Future<Output = Result<Option<RegionParams>, LookupError>> + Send {
        ready(Ok(self.get(coord)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_and_release() {
        let registry = InMemoryRegistry::new();
        let coord = RegionCoord::new(1, 2);
        let params = RegionParams::new(5, MacroVars::default());

        assert!(registry.is_empty());
        registry.claim(coord, params);
        assert_eq!(registry.get(coord), Some(params));
        assert_eq!(registry.release(coord), Some(params));
        assert_eq!(registry.get(coord), None);
    }

    #[test]
    fn test_claim_around() {
        let registry = InMemoryRegistry::new();
        let params = RegionParams::new(1, MacroVars::default());
        registry.claim_around(RegionCoord::new(0, 0), 1, params);
        assert_eq!(registry.len(), 9);
    }

    #[test]
    fn test_link_params() {
        let link = ShareLink::decode("v1:99:10,20");
        let params = RegionParams::from_link(&link);
        let key = params.key_at(RegionCoord::new(4, 4));
        assert_eq!(key.seed(), 99);
        assert_eq!(key.mapping(), MappingVersion::V1);
        assert_eq!(key.vars().values()[1], 20);
    }
}
