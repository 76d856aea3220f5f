//! Shared foundational types for the skeleton reference cache.
//!
//! This crate provides the content hash used to checksum emitted skeleton
//! images and the opaque [`VersionStamp`] that identifies a unit's dependent
//! semantic version.

#![warn(missing_docs)]

pub mod hash;
pub mod version;

pub use hash::ContentHash;
pub use version::VersionStamp;
