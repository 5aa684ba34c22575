//! Content fingerprints for change detection.
//!
//! A view body's serialized source is hashed with xxh3. Two reloads of the
//! same source produce the same fingerprint; any edit produces a new one.

use std::fmt;

use xxhash_rust::xxh3::xxh3_64;

/// Deterministic hash of a view body's source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Fingerprint a source string.
    pub fn of(source: &str) -> Self {
        Self(xxh3_64(source.as_bytes()))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
