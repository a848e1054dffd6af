//! # Determinism Verification
//!
//! Re-runs mapping and synthesis for a key and compares content hashes.
//! A mismatch between runs in the same process points at a hidden source
//! of nondeterminism; a mismatch against a previously recorded hash points
//! at drift between mapping or synthesis versions.
//!
//! The verifier only reports. It never patches artifacts or hashes.

use std::fmt;

use crate::config::{GeneratorConfig, MIN_VERIFICATION_RUNS};
use crate::key::GenerationKey;
use crate::mapping::map_key;
use crate::synth::{ContentHash, Synthesizer};

/// How a determinism check failed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BreakKind {
    /// Every run agreed, and matched the expected hash if one was given.
    #[default]
    None,
    /// Runs in this process disagreed with each other.
    NondeterministicSource,
    /// Runs agreed but differ from the expected hash.
    VersionDrift,
}

impl fmt::Display for BreakKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::NondeterministicSource => "nondeterministic-source",
            Self::VersionDrift => "version-drift",
        };
        f.write_str(name)
    }
}

/// Outcome of one determinism check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeterminismRecord {
    /// Key that was checked.
    pub key: GenerationKey,
    /// Hash the caller expected, if any.
    pub expected_hash: Option<ContentHash>,
    /// Hash of the first run.
    pub actual_hash: ContentHash,
    /// Hash of every run, in order.
    pub run_hashes: Vec<ContentHash>,
    /// No break was found.
    pub is_valid: bool,
    /// What kind of break was found.
    pub break_kind: BreakKind,
}

/// Repeats synthesis and compares hashes.
#[derive(Clone, Copy, Debug)]
pub struct DeterminismVerifier {
    synthesizer: Synthesizer,
    runs: u32,
}

impl Default for DeterminismVerifier {
    fn default() -> Self {
        Self::new(Synthesizer::default(), MIN_VERIFICATION_RUNS)
    }
}

impl DeterminismVerifier {
    /// Creates a verifier. Fewer than three runs are raised to three.
    #[must_use]
    pub fn new(synthesizer: Synthesizer, runs: u32) -> Self {
        Self {
            synthesizer,
            runs: runs.max(MIN_VERIFICATION_RUNS),
        }
    }

    /// Creates a verifier from generator configuration.
    #[must_use]
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(Synthesizer::from_config(config), config.verification_runs)
    }

    /// Runs per check.
    #[must_use]
    pub const fn runs(&self) -> u32 {
        self.runs
    }

    /// Checks `key`, optionally against a previously recorded hash.
    #[must_use]
    pub fn verify(&self, key: &GenerationKey, expected: Option<ContentHash>) -> DeterminismRecord {
        let run_hashes: Vec<ContentHash> = (0..self.runs)
            .map(|_| self.synthesizer.synthesize(key, &map_key(key)).content_hash())
            .collect();
        let actual_hash = run_hashes[0];

        let break_kind = if run_hashes.iter().any(|&h| h != actual_hash) {
            BreakKind::NondeterministicSource
        } else if expected.is_some_and(|e| e != actual_hash) {
            BreakKind::VersionDrift
        } else {
            BreakKind::None
        };

        let record = DeterminismRecord {
            key: *key,
            expected_hash: expected,
            actual_hash,
            run_hashes,
            is_valid: break_kind == BreakKind::None,
            break_kind,
        };

        if record.is_valid {
            tracing::debug!("Determinism check passed for {} hash={}", key, actual_hash);
        } else {
            tracing::warn!(
                "Determinism break ({}) for {}: expected={:?} runs={:?}",
                break_kind,
                key,
                expected.map(ContentHash::to_hex),
                record.run_hashes.iter().map(|h| h.to_hex()).collect::<Vec<_>>()
            );
        }

        record
    }
}
