//! # Mixer
//!
//! Deterministic integer hashing used by every other generation stage.
//!
//! ## Determinism Guarantee
//!
//! Everything here is explicit 32-bit wrapping integer arithmetic over
//! little-endian bytes. No floating point enters the hash state and strings
//! are hashed as raw UTF-8, so the same input sequence yields the same value
//! on any platform, any run.
//!
//! The core is FNV-1a followed by a 32-bit avalanche finalizer. FNV alone
//! has weak low bits; the finalizer spreads them so the output can be used
//! directly as a uniform draw.

/// FNV-1a 32-bit offset basis.
const FNV_OFFSET: u32 = 0x811c_9dc5;
/// FNV-1a 32-bit prime.
const FNV_PRIME: u32 = 0x0100_0193;

/// Type tag written before an integer part.
const TAG_INT: u8 = 0x01;
/// Type tag written before a string part.
const TAG_STR: u8 = 0x02;
/// Written after string bytes so `("ab", "c")` and `("a", "bc")` differ.
const STR_TERMINATOR: u8 = 0xFF;

/// Scale from a `u32` hash to `[0, 1)`.
const U32_RANGE: f64 = 4_294_967_296.0;

/// One element of a hashed sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashPart<'a> {
    /// An integer, fed as 8 little-endian bytes.
    Int(i64),
    /// A string, fed as UTF-8 bytes plus a terminator.
    Str(&'a str),
}

impl From<i64> for HashPart<'_> {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for HashPart<'_> {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for HashPart<'_> {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl<'a> From<&'a str> for HashPart<'a> {
    fn from(value: &'a str) -> Self {
        Self::Str(value)
    }
}

/// Streaming FNV-1a accumulator.
///
/// Feeding order is significant. Two accumulators fed the same bytes in the
/// same order always finish to the same value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fnv32 {
    state: u32,
}

impl Fnv32 {
    /// Creates an accumulator at the FNV offset basis.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { state: FNV_OFFSET }
    }

    /// Feeds one byte.
    #[inline]
    pub fn write_u8(&mut self, byte: u8) {
        self.state ^= u32::from(byte);
        self.state = self.state.wrapping_mul(FNV_PRIME);
    }

    /// Feeds a byte slice in order.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.write_u8(byte);
        }
    }

    /// Feeds a `u32` as 4 little-endian bytes.
    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Feeds an `i64` as 8 little-endian bytes.
    #[inline]
    pub fn write_i64(&mut self, value: i64) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Feeds a tagged part.
    #[inline]
    pub fn write_part(&mut self, part: HashPart<'_>) {
        match part {
            HashPart::Int(value) => {
                self.write_u8(TAG_INT);
                self.write_i64(value);
            }
            HashPart::Str(text) => {
                self.write_u8(TAG_STR);
                self.write_bytes(text.as_bytes());
                self.write_u8(STR_TERMINATOR);
            }
        }
    }

    /// Returns the finalized hash.
    #[inline]
    #[must_use]
    pub const fn finish(self) -> u32 {
        avalanche(self.state)
    }
}

impl Default for Fnv32 {
    fn default() -> Self {
        Self::new()
    }
}

/// 32-bit avalanche finalizer (murmur3 `fmix32`).
#[inline]
#[must_use]
pub const fn avalanche(mut hash: u32) -> u32 {
    hash ^= hash >> 16;
    hash = hash.wrapping_mul(0x85eb_ca6b);
    hash ^= hash >> 13;
    hash = hash.wrapping_mul(0xc2b2_ae35);
    hash ^= hash >> 16;
    hash
}

/// Hashes an ordered sequence of parts.
///
/// # Example
///
/// ```rust
/// use terraseed_procedural::mixer::{hash_values, HashPart};
///
/// let a = hash_values(&[HashPart::Int(7), HashPart::Str("path")]);
/// let b = hash_values(&[HashPart::Str("path"), HashPart::Int(7)]);
/// assert_ne!(a, b);
/// ```
#[must_use]
pub fn hash_values(parts: &[HashPart<'_>]) -> u32 {
    let mut hasher = Fnv32::new();
    for &part in parts {
        hasher.write_part(part);
    }
    hasher.finish()
}

/// Hashes a sequence of integers.
///
/// Equivalent to [`hash_values`] with every element wrapped in
/// [`HashPart::Int`], without building the slice.
#[must_use]
pub fn hash_ints(values: &[i64]) -> u32 {
    let mut hasher = Fnv32::new();
    for &value in values {
        hasher.write_part(HashPart::Int(value));
    }
    hasher.finish()
}

/// Pseudo-random draw in `[0, 1)` from a seed and integer coordinates.
#[inline]
#[must_use]
pub fn seeded_random01(seed: i64, coords: &[i64]) -> f64 {
    let mut hasher = Fnv32::new();
    hasher.write_part(HashPart::Int(seed));
    for &coord in coords {
        hasher.write_part(HashPart::Int(coord));
    }
    f64::from(hasher.finish()) / U32_RANGE
}

/// Derives an independent sub-seed for a named purpose.
///
/// Used to give each noise channel its own stream from one world seed.
#[must_use]
pub fn derive_seed(seed: i64, purpose: &str) -> i64 {
    let high = hash_values(&[HashPart::Int(seed), HashPart::Str(purpose)]);
    let low = hash_values(&[HashPart::Int(seed), HashPart::Str(purpose), HashPart::Int(1)]);
    ((u64::from(high) << 32) | u64::from(low)) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        // Pinned so any change to the mixing scheme is caught.
        assert_eq!(Fnv32::new().finish(), 0xab3e_7c0b);
        assert_eq!(hash_ints(&[0]), 0x1eda_f075);
        assert_eq!(hash_values(&[HashPart::Str("terraseed")]), 0x6786_a165);
    }

    #[test]
    fn test_order_sensitive() {
        assert_ne!(hash_ints(&[1, 2]), hash_ints(&[2, 1]));
        assert_ne!(
            hash_values(&[HashPart::Str("ab"), HashPart::Str("c")]),
            hash_values(&[HashPart::Str("a"), HashPart::Str("bc")]),
        );
    }

    #[test]
    fn test_int_and_string_parts_differ() {
        assert_ne!(
            hash_values(&[HashPart::Int(1)]),
            hash_values(&[HashPart::Str("1")]),
        );
    }

    #[test]
    fn test_hash_ints_matches_hash_values() {
        let parts: Vec<HashPart<'_>> = [3_i64, -9, 1 << 40].iter().map(|&v| v.into()).collect();
        assert_eq!(hash_values(&parts), hash_ints(&[3, -9, 1 << 40]));
    }

    #[test]
    fn test_random01_range_and_determinism() {
        for i in 0..10_000 {
            let value = seeded_random01(12345, &[i, i * 7]);
            assert!((0.0..1.0).contains(&value), "draw {value} out of range");
            assert_eq!(value, seeded_random01(12345, &[i, i * 7]));
        }
    }

    #[test]
    fn test_random01_is_spread() {
        let mut buckets = [0u32; 10];
        for i in 0..10_000 {
            let value = seeded_random01(42, &[i]);
            buckets[(value * 10.0) as usize] += 1;
        }
        for (index, count) in buckets.iter().enumerate() {
            assert!(
                (700..1300).contains(count),
                "bucket {index} has {count} draws"
            );
        }
    }

    #[test]
    fn test_seed_derivation() {
        let base = 42;
        assert_eq!(derive_seed(base, "elevation"), derive_seed(base, "elevation"));
        assert_ne!(derive_seed(base, "elevation"), derive_seed(base, "moisture"));
        assert_ne!(derive_seed(base, "elevation"), derive_seed(base + 1, "elevation"));
    }
}
