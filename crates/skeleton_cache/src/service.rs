//! Entry points used by the host to obtain cross-language references.

use std::sync::Arc;

use skeleton_config::{SkeletonConfig, StorageBackend};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::artifact::SkeletonArtifact;
use crate::builder::SkeletonBuilder;
use crate::cache::SkeletonReferenceCache;
use crate::compilation::{Compilation, CompilationTracker, SkeletonLogger};
use crate::error::CacheResult;
use crate::link::LinkProperties;
use crate::reference::SkeletonReference;
use crate::storage::{InMemoryStorage, MappedFileStorage, TemporaryStorage};
use crate::table::SkeletonTable;

/// A tracked unit that owns a skeleton cache.
pub trait SkeletonUnit: CompilationTracker {
    /// The unit's per-unit skeleton cache.
    fn skeleton_cache(&self) -> &SkeletonReferenceCache;
}

/// Builds and hands out skeleton references for tracked units.
///
/// Cheap to clone; clones share the identity table and the builder.
#[derive(Clone)]
pub struct SkeletonService {
    table: Arc<SkeletonTable>,
    builder: Arc<SkeletonBuilder>,
}

impl SkeletonService {
    /// Creates a service over the process-wide table.
    pub fn new(
        storage: Arc<dyn TemporaryStorage>,
        logger: Option<Arc<dyn SkeletonLogger>>,
    ) -> Self {
        Self::with_table(
            SkeletonTable::global(),
            SkeletonBuilder::new(storage).with_logger(logger),
        )
    }

    /// Creates a service over a private table.
    pub fn with_table(table: Arc<SkeletonTable>, builder: SkeletonBuilder) -> Self {
        Self {
            table,
            builder: Arc::new(builder),
        }
    }

    /// Creates a service over the process-wide table, with storage and
    /// telemetry chosen by `config`.
    pub fn from_config(config: &SkeletonConfig, logger: Option<Arc<dyn SkeletonLogger>>) -> Self {
        let storage: Arc<dyn TemporaryStorage> = match config.storage.backend {
            StorageBackend::Mapped => match &config.storage.directory {
                Some(directory) => Arc::new(MappedFileStorage::new(directory.clone())),
                None => Arc::new(MappedFileStorage::in_temp_dir()),
            },
            StorageBackend::Memory => Arc::new(InMemoryStorage::new()),
        };
        debug!(backend = ?config.storage.backend, "configured skeleton storage");

        let builder = SkeletonBuilder::new(storage)
            .with_logger(logger)
            .with_forward_diagnostics(config.telemetry.forward_diagnostics);
        Self::with_table(SkeletonTable::global(), builder)
    }

    /// The identity table this service builds through.
    pub fn table(&self) -> &Arc<SkeletonTable> {
        &self.table
    }

    /// Returns the unit's already-built reference, if any. Never blocks on a
    /// build and never checks whether the skeleton is current.
    pub fn try_get_cached_reference<U: SkeletonUnit>(
        &self,
        unit: &U,
        properties: &LinkProperties,
    ) -> Option<Arc<SkeletonReference>> {
        unit.skeleton_cache().try_get_already_built_reference(properties)
    }

    /// Returns a reference to the unit's skeleton at its current version,
    /// building one if needed.
    pub async fn get_or_build_reference<U: SkeletonUnit>(
        &self,
        unit: &U,
        properties: &LinkProperties,
        cancel: &CancellationToken,
    ) -> CacheResult<Option<Arc<SkeletonReference>>> {
        unit.skeleton_cache()
            .get_or_build_reference(unit, self, properties, cancel)
            .await
    }

    /// Copies the unit's cache for a forked unit.
    pub fn clone_cache<U: SkeletonUnit>(&self, unit: &U) -> SkeletonReferenceCache {
        unit.skeleton_cache().clone()
    }

    pub(crate) async fn fetch_or_build(
        &self,
        compilation: &Arc<dyn Compilation>,
        cancel: &CancellationToken,
    ) -> CacheResult<Option<Arc<SkeletonArtifact>>> {
        let builder = Arc::clone(&self.builder);
        self.table
            .get_or_create(
                compilation,
                move |compilation, cancel| builder.build(&compilation, &cancel),
                cancel,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skeleton_config::load_config_from_str;

    #[test]
    fn new_uses_global_table() {
        let service = SkeletonService::new(Arc::new(InMemoryStorage::new()), None);
        assert!(Arc::ptr_eq(service.table(), &SkeletonTable::global()));
    }

    #[test]
    fn clones_share_table() {
        let service = SkeletonService::with_table(
            Arc::new(SkeletonTable::new()),
            SkeletonBuilder::new(Arc::new(InMemoryStorage::new())),
        );
        let other = service.clone();
        assert!(Arc::ptr_eq(service.table(), other.table()));
        assert!(!Arc::ptr_eq(service.table(), &SkeletonTable::global()));
    }

    #[test]
    fn from_config_accepts_each_backend() {
        let dir = tempfile::tempdir().unwrap();
        let mapped = load_config_from_str(&format!(
            "[storage]\nbackend = \"mapped\"\ndirectory = {:?}\n",
            dir.path().display().to_string()
        ))
        .unwrap();
        let memory = load_config_from_str("[storage]\nbackend = \"memory\"\n").unwrap();

        for config in [mapped, memory] {
            let service = SkeletonService::from_config(&config, None);
            assert!(Arc::ptr_eq(service.table(), &SkeletonTable::global()));
        }
    }
}
