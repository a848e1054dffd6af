//! # Region Cache
//!
//! Bounded store of built artifacts with deduplicated async builds.
//!
//! ## Architecture
//!
//! ```text
//!   get ───────────────► entries (ready artifacts, LRU by stamp)
//!                              ▲
//!   ensure_ready ──► in_flight ┤ publish: insert, evict, unregister
//!        │          (watch rx) │
//!        └─ absent ─► tokio::spawn ─► spawn_blocking(builder)
//! ```
//!
//! ## Invariants
//!
//! - At most one build per key is in flight. Every caller for a building
//!   key awaits the same `watch` channel.
//! - Only finished artifacts enter `entries`, so `get` never observes a
//!   partial build.
//! - Only ready entries are evictable; in-flight builds are not in the
//!   store at all.
//! - Lock order is `in_flight` then `entries`. `get` takes `entries` alone.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use terraseed_procedural::{GenerationKey, RegionCoord, Synthesizer, WorldArtifact};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::CacheConfig;
use crate::error::{BuildError, CacheError, LookupError};
use crate::registry::{resolve_params, ParamSource};

/// Builds artifacts for the cache. Runs on the blocking pool.
pub trait RegionBuilder: Send + Sync + 'static {
    /// Builds the artifact for `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] if the artifact cannot be produced.
    fn build_region(&self, key: &GenerationKey) -> Result<WorldArtifact, BuildError>;
}

impl RegionBuilder for Synthesizer {
    fn build_region(&self, key: &GenerationKey) -> Result<WorldArtifact, BuildError> {
        Ok(self.build(key))
    }
}

/// Observable state of a cache entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryState {
    /// Not cached and not building.
    Absent,
    /// A build is in flight.
    Building,
    /// A finished artifact is resident.
    Ready,
}

/// Counters and gauges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests served from a ready entry.
    pub hits: u64,
    /// Requests that found no ready entry.
    pub misses: u64,
    /// Builds started.
    pub builds_started: u64,
    /// Builds that produced an artifact.
    pub builds_completed: u64,
    /// Builds that failed, panicked or were abandoned.
    pub builds_failed: u64,
    /// Ready entries evicted.
    pub evictions: u64,
    /// Bytes held by ready entries.
    pub resident_bytes: usize,
    /// Number of ready entries.
    pub resident_entries: usize,
    /// Builds currently in flight.
    pub in_flight: usize,
}

type BuildSlot = Option<Result<Arc<WorldArtifact>, CacheError>>;

struct ReadyEntry {
    artifact: Arc<WorldArtifact>,
    bytes: usize,
    stamp: u64,
}

/// Ready artifacts plus a recency index keyed by access stamp.
#[derive(Default)]
struct EntryStore {
    entries: HashMap<GenerationKey, ReadyEntry>,
    recency: BTreeMap<u64, GenerationKey>,
    resident_bytes: usize,
    next_stamp: u64,
}

impl EntryStore {
    fn stamp(&mut self) -> u64 {
        self.next_stamp += 1;
        self.next_stamp
    }

    /// Returns the artifact and marks it most recently used.
    fn touch(&mut self, key: &GenerationKey) -> Option<Arc<WorldArtifact>> {
        let stamp = self.stamp();
        let entry = self.entries.get_mut(key)?;
        self.recency.remove(&entry.stamp);
        entry.stamp = stamp;
        self.recency.insert(stamp, *key);
        Some(Arc::clone(&entry.artifact))
    }

    fn contains(&self, key: &GenerationKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Inserts a ready artifact and evicts least recent entries down to
    /// `budget`. The new entry itself is never evicted.
    fn insert(
        &mut self,
        key: GenerationKey,
        artifact: Arc<WorldArtifact>,
        budget: usize,
    ) -> Vec<GenerationKey> {
        let bytes = artifact.approx_bytes();
        let stamp = self.stamp();
        if let Some(old) = self.entries.insert(key, ReadyEntry { artifact, bytes, stamp }) {
            self.recency.remove(&old.stamp);
            self.resident_bytes -= old.bytes;
        }
        self.recency.insert(stamp, key);
        self.resident_bytes += bytes;

        let mut evicted = Vec::new();
        while self.resident_bytes > budget {
            let Some((&oldest_stamp, &oldest_key)) = self.recency.iter().next() else {
                break;
            };
            if oldest_key == key {
                break;
            }
            self.recency.remove(&oldest_stamp);
            if let Some(entry) = self.entries.remove(&oldest_key) {
                self.resident_bytes -= entry.bytes;
            }
            evicted.push(oldest_key);
        }
        evicted
    }
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    builds_started: AtomicU64,
    builds_completed: AtomicU64,
    builds_failed: AtomicU64,
    evictions: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

struct Inner<B> {
    builder: B,
    config: CacheConfig,
    entries: Mutex<EntryStore>,
    in_flight: Mutex<HashMap<GenerationKey, watch::Receiver<BuildSlot>>>,
    counters: Counters,
}

impl<B: RegionBuilder> Inner<B> {
    /// Stores the outcome, unregisters the build, then wakes waiters.
    fn publish(
        &self,
        key: GenerationKey,
        result: Result<Arc<WorldArtifact>, CacheError>,
        tx: &watch::Sender<BuildSlot>,
    ) {
        {
            let mut in_flight = self.in_flight.lock();
            if let Ok(artifact) = &result {
                let evicted = self
                    .entries
                    .lock()
                    .insert(key, Arc::clone(artifact), self.config.byte_budget);
                for victim in &evicted {
                    Counters::bump(&self.counters.evictions);
                    tracing::debug!("Evicted {}", victim);
                }
            }
            in_flight.remove(&key);
        }

        match &result {
            Ok(_) => Counters::bump(&self.counters.builds_completed),
            Err(err) => {
                Counters::bump(&self.counters.builds_failed);
                tracing::warn!("Region build failed: {}", err);
            }
        }
        tx.send_replace(Some(result));
    }
}

/// Unregisters a build whose task ends without publishing.
struct BuildGuard<B: RegionBuilder> {
    inner: Arc<Inner<B>>,
    key: GenerationKey,
    tx: Option<watch::Sender<BuildSlot>>,
}

impl<B: RegionBuilder> BuildGuard<B> {
    fn publish(mut self, result: Result<Arc<WorldArtifact>, CacheError>) {
        if let Some(tx) = self.tx.take() {
            self.inner.publish(self.key, result, &tx);
        }
    }
}

impl<B: RegionBuilder> Drop for BuildGuard<B> {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            self.inner
                .publish(self.key, Err(CacheError::BuildAbandoned { key: self.key }), &tx);
        }
    }
}

/// Bounded, deduplicating region cache.
///
/// Cloning is cheap and every clone shares the same store.
pub struct RegionCache<B: RegionBuilder = Synthesizer> {
    inner: Arc<Inner<B>>,
}

impl<B: RegionBuilder> Clone for RegionCache<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: RegionBuilder> RegionCache<B> {
    /// Creates a cache around a builder.
    #[must_use]
    pub fn new(builder: B, config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                builder,
                config,
                entries: Mutex::new(EntryStore::default()),
                in_flight: Mutex::new(HashMap::new()),
                counters: Counters::default(),
            }),
        }
    }

    /// Cache configuration.
    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// The builder.
    #[must_use]
    pub fn builder(&self) -> &B {
        &self.inner.builder
    }

    /// Returns a ready artifact without waiting, and marks it recently used.
    #[must_use]
    pub fn get(&self, key: &GenerationKey) -> Option<Arc<WorldArtifact>> {
        let found = self.inner.entries.lock().touch(key);
        let counters = &self.inner.counters;
        Counters::bump(if found.is_some() { &counters.hits } else { &counters.misses });
        found
    }

    /// Returns the artifact for `key`, building it if needed.
    ///
    /// Concurrent callers for the same key share one build. The build runs
    /// in a detached task, so dropping this future does not cancel it.
    ///
    /// # Errors
    ///
    /// Returns the build's [`CacheError`]. The entry is absent again
    /// afterwards, so a later call retries.
    pub async fn ensure_ready(&self, key: GenerationKey) -> Result<Arc<WorldArtifact>, CacheError> {
        let mut rx = {
            let mut in_flight = self.inner.in_flight.lock();
            if let Some(artifact) = self.inner.entries.lock().touch(&key) {
                Counters::bump(&self.inner.counters.hits);
                return Ok(artifact);
            }
            Counters::bump(&self.inner.counters.misses);

            match in_flight.get(&key).cloned() {
                Some(rx) => {
                    tracing::debug!("Joining in-flight build for {}", key);
                    rx
                }
                None => {
                    let (tx, rx) = watch::channel(None);
                    in_flight.insert(key, rx.clone());
                    Counters::bump(&self.inner.counters.builds_started);
                    self.spawn_build(key, tx);
                    rx
                }
            }
        };

        let slot = rx.wait_for(Option::is_some).await;
        match slot.as_deref() {
            Ok(Some(result)) => result.clone(),
            _ => Err(CacheError::BuildAbandoned { key }),
        }
    }

    fn spawn_build(&self, key: GenerationKey, tx: watch::Sender<BuildSlot>) {
        let guard = BuildGuard {
            inner: Arc::clone(&self.inner),
            key,
            tx: Some(tx),
        };

        tokio::spawn(async move {
            let inner = Arc::clone(&guard.inner);
            let started = Instant::now();
            let outcome =
                tokio::task::spawn_blocking(move || inner.builder.build_region(&key)).await;

            let result = match outcome {
                Ok(Ok(artifact)) => {
                    tracing::info!(
                        "Built {} hash={} in {:.1}ms",
                        key,
                        artifact.content_hash(),
                        started.elapsed().as_secs_f64() * 1000.0
                    );
                    Ok(Arc::new(artifact))
                }
                Ok(Err(err)) => Err(CacheError::BuildFailed {
                    key,
                    reason: err.to_string(),
                }),
                Err(join) if join.is_panic() => Err(CacheError::BuildPanicked { key }),
                Err(_) => Err(CacheError::BuildAbandoned { key }),
            };

            guard.publish(result);
        });
    }

    /// Current state of `key`.
    #[must_use]
    pub fn state(&self, key: &GenerationKey) -> EntryState {
        let in_flight = self.inner.in_flight.lock();
        if self.inner.entries.lock().contains(key) {
            EntryState::Ready
        } else if in_flight.contains_key(key) {
            EntryState::Building
        } else {
            EntryState::Absent
        }
    }

    /// Snapshot of counters and gauges.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let in_flight = self.inner.in_flight.lock().len();
        let (resident_bytes, resident_entries) = {
            let entries = self.inner.entries.lock();
            (entries.resident_bytes, entries.entries.len())
        };
        let c = &self.inner.counters;
        CacheStats {
            hits: c.hits.load(Ordering::Relaxed),
            misses: c.misses.load(Ordering::Relaxed),
            builds_started: c.builds_started.load(Ordering::Relaxed),
            builds_completed: c.builds_completed.load(Ordering::Relaxed),
            builds_failed: c.builds_failed.load(Ordering::Relaxed),
            evictions: c.evictions.load(Ordering::Relaxed),
            resident_bytes,
            resident_entries,
            in_flight,
        }
    }

    /// Starts background builds for the four axis neighbours of `active`.
    ///
    /// Each neighbour's params are resolved through `source`. An unclaimed
    /// neighbour, a failed lookup or a lookup timeout is skipped quietly.
    /// The active key itself is never scheduled. Dropping the returned
    /// handle does not cancel anything.
    pub fn preload_neighbors<S: ParamSource>(
        &self,
        active: &GenerationKey,
        source: Arc<S>,
    ) -> PreloadHandle {
        let timeout = self.inner.config.lookup_timeout();
        let active = *active;

        let tasks = active
            .region()
            .neighbors()
            .into_iter()
            .map(|coord| {
                let cache = self.clone();
                let source = Arc::clone(&source);
                tokio::spawn(async move {
                    let params = match resolve_params(source.as_ref(), coord, timeout).await {
                        Ok(Some(params)) => params,
                        Ok(None) => {
                            tracing::debug!("Preload skipped {}: unclaimed", coord);
                            return PreloadOutcome::Unclaimed(coord);
                        }
                        Err(err) => {
                            tracing::debug!("Preload skipped {}: {}", coord, err);
                            return PreloadOutcome::LookupFailed(coord, err);
                        }
                    };

                    let key = params.key_at(coord);
                    if key == active {
                        return PreloadOutcome::SkippedActive(coord);
                    }
                    match cache.ensure_ready(key).await {
                        Ok(_) => PreloadOutcome::Ready(key),
                        Err(err) => {
                            tracing::debug!("Preload of {} failed: {}", key, err);
                            PreloadOutcome::BuildFailed(err)
                        }
                    }
                })
            })
            .collect();

        PreloadHandle { tasks }
    }
}

/// What happened to one neighbour preload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PreloadOutcome {
    /// The neighbour's artifact is ready.
    Ready(GenerationKey),
    /// Nobody has claimed the neighbour.
    Unclaimed(RegionCoord),
    /// The parameter lookup failed or timed out.
    LookupFailed(RegionCoord, LookupError),
    /// The neighbour resolved to the active key.
    SkippedActive(RegionCoord),
    /// The build failed.
    BuildFailed(CacheError),
}

/// Handle to the preload tasks of one region entry.
///
/// Dropping it detaches the tasks; they still run to completion.
#[derive(Debug)]
pub struct PreloadHandle {
    tasks: Vec<JoinHandle<PreloadOutcome>>,
}

impl PreloadHandle {
    /// Number of neighbour tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no neighbour was scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Waits for every neighbour, in north, east, south, west order.
    ///
    /// A task that panicked or was cancelled is left out.
    pub async fn join(self) -> Vec<PreloadOutcome> {
        let mut outcomes = Vec::with_capacity(self.tasks.len());
        for task in self.tasks {
            if let Ok(outcome) = task.await {
                outcomes.push(outcome);
            }
        }
        outcomes
    }
}
