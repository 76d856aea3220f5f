//! Cross-language skeleton reference cache.
//!
//! A unit written in one language is made visible to units in another by
//! emitting a metadata-only "skeleton" image of its public surface. This crate
//! decides when such an image has to be emitted, shares it between every unit
//! state that has the same compilation, and hands out one reference object per
//! (image, link properties) pair.
//!
//! The moving parts:
//!
//! - [`SkeletonReferenceCache`] is owned by each unit and remembers the
//!   (version, artifact) pair it last committed.
//! - [`SkeletonTable`] maps compilation identity to a single shared build.
//! - [`SkeletonBuilder`] emits the image and writes it to
//!   [`TemporaryStorage`].
//! - [`SkeletonService`] is the entry point a host calls with its units.

#![warn(missing_docs)]

pub mod artifact;
pub mod builder;
pub mod cache;
pub mod compilation;
pub mod documentation;
pub mod error;
pub mod link;
pub mod metadata;
pub mod reference;
pub mod service;
pub mod storage;
pub mod table;

pub use artifact::SkeletonArtifact;
pub use builder::SkeletonBuilder;
pub use cache::SkeletonReferenceCache;
pub use compilation::{Compilation, CompilationTracker, EmitOptions, EmitResult, SkeletonLogger};
pub use documentation::DeferredDocumentation;
pub use error::{CacheError, CacheResult};
pub use link::{LinkProperties, ReferenceKind};
pub use metadata::SkeletonMetadata;
pub use reference::SkeletonReference;
pub use service::{SkeletonService, SkeletonUnit};
pub use storage::{
    ImageBytes, ImageHeader, InMemoryStorage, MappedFileStorage, StorageHandle, TemporaryStorage,
};
pub use table::SkeletonTable;

pub use skeleton_common::VersionStamp;
pub use tokio_util::sync::CancellationToken;
