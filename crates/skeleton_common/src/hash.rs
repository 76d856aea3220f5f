//! Checksums for emitted skeleton images.

use serde::{Deserialize, Serialize};
use std::fmt;

/// XXH3-128 digest of an image payload.
///
/// Written into the frame header of every mapped image and recomputed when the
/// image is mapped back, so a truncated or overwritten temp file is rejected
/// instead of reaching a metadata reader. Loaded metadata carries it for logs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(u128);

impl ContentHash {
    /// Digests `data`.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(xxhash_rust::xxh3::xxh3_128(data))
    }

    /// The leading 32 bits as eight hex digits, for log fields.
    pub fn short(&self) -> String {
        format!("{:08x}", self.0 >> 96)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({}..)", self.short())
    }
}
