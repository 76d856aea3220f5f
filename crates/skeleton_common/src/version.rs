//! Dependent semantic version stamps.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of fresh stamps. Starts at 1 so `create` never yields [`VersionStamp::DEFAULT`].
static NEXT_STAMP: AtomicU64 = AtomicU64::new(1);

/// An opaque stamp for the semantic state of a unit and everything it
/// transitively depends on.
///
/// Two equal stamps mean the units are interchangeable for cross-language
/// resolution. Stamps are only compared for equality; their numeric order
/// carries no meaning for the cache.
///
/// [`VersionStamp::DEFAULT`] is reserved for "nothing computed yet" and is
/// never the result of a real version computation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VersionStamp(u64);

impl VersionStamp {
    /// The reserved "uninitialized" stamp.
    pub const DEFAULT: VersionStamp = VersionStamp(0);

    /// Mints a new stamp, distinct from every stamp minted before it in this process.
    pub fn create() -> Self {
        Self(NEXT_STAMP.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates a stamp from a raw value.
    ///
    /// Intended for collaborators that persist stamps and for tests. A raw value
    /// of zero produces [`VersionStamp::DEFAULT`].
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value of this stamp.
    pub fn as_raw(self) -> u64 {
        self.0
    }

    /// Returns `true` if this is the reserved uninitialized stamp.
    pub fn is_default(self) -> bool {
        self == Self::DEFAULT
    }
}

impl fmt::Display for VersionStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            write!(f, "v<default>")
        } else {
            write!(f, "v{}", self.0)
        }
    }
}

impl fmt::Debug for VersionStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VersionStamp({self})")
    }
}
