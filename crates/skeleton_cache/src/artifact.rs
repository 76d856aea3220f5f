//! Successfully built skeletons and their memoized references.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::documentation::DeferredDocumentation;
use crate::link::LinkProperties;
use crate::metadata::SkeletonMetadata;
use crate::reference::SkeletonReference;

/// One successfully emitted metadata-only image of a compilation.
///
/// Immutable apart from the reference memo. Shared through `Arc` by the global
/// table entry and every per-unit cache that adopted it. The storage handle
/// lives inside the metadata and is released exactly once, after the artifact
/// and every reference it handed out are gone.
pub struct SkeletonArtifact {
    metadata: SkeletonMetadata,
    references: Mutex<HashMap<LinkProperties, Arc<SkeletonReference>>>,
    assembly_name: String,
    documentation: DeferredDocumentation,
}

impl SkeletonArtifact {
    /// Wraps a loaded image.
    pub fn new(
        metadata: SkeletonMetadata,
        assembly_name: impl Into<String>,
        documentation: DeferredDocumentation,
    ) -> Self {
        Self {
            metadata,
            references: Mutex::new(HashMap::new()),
            assembly_name: assembly_name.into(),
            documentation,
        }
    }

    /// Returns the reference for `properties`, creating it on first request.
    ///
    /// Every call with equal properties returns the same `Arc`.
    pub fn get_or_create_reference(&self, properties: &LinkProperties) -> Arc<SkeletonReference> {
        let mut references = self.references.lock();
        if let Some(existing) = references.get(properties) {
            return Arc::clone(existing);
        }
        let reference = Arc::new(SkeletonReference::new(
            properties.clone(),
            self.metadata.clone(),
            self.assembly_name.clone(),
            self.documentation.clone(),
        ));
        references.insert(properties.clone(), Arc::clone(&reference));
        reference
    }

    /// The name of the assembly the image was emitted for.
    pub fn assembly_name(&self) -> &str {
        &self.assembly_name
    }

    /// The loaded metadata view.
    pub fn metadata(&self) -> &SkeletonMetadata {
        &self.metadata
    }

    /// The documentation adapter for the originating compilation.
    pub fn documentation(&self) -> &DeferredDocumentation {
        &self.documentation
    }

    /// Identifier of the storage backing this artifact.
    pub fn storage_id(&self) -> &str {
        self.metadata.storage_id()
    }

    /// Number of distinct link properties a reference has been created for.
    pub fn reference_count(&self) -> usize {
        self.references.lock().len()
    }
}

impl fmt::Debug for SkeletonArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkeletonArtifact")
            .field("assembly_name", &self.assembly_name)
            .field("storage", &self.metadata.storage_id())
            .field("bytes", &self.metadata.len())
            .finish()
    }
}
