//! Cross-language references handed out to consuming units.

use std::fmt;

use crate::documentation::DeferredDocumentation;
use crate::link::LinkProperties;
use crate::metadata::SkeletonMetadata;

/// A reference to a skeleton image under one set of link properties.
///
/// Downstream symbol caches key on reference identity, so a skeleton artifact
/// hands out at most one `SkeletonReference` per distinct [`LinkProperties`]
/// and callers should compare references with `Arc::ptr_eq`.
///
/// A reference shares the artifact's loaded image, so the image's storage stays
/// alive while any reference to it does.
pub struct SkeletonReference {
    properties: LinkProperties,
    metadata: SkeletonMetadata,
    assembly_name: String,
    documentation: DeferredDocumentation,
}

impl SkeletonReference {
    pub(crate) fn new(
        properties: LinkProperties,
        metadata: SkeletonMetadata,
        assembly_name: String,
        documentation: DeferredDocumentation,
    ) -> Self {
        Self {
            properties,
            metadata,
            assembly_name,
            documentation,
        }
    }

    /// The link properties this reference was created for.
    pub fn properties(&self) -> &LinkProperties {
        &self.properties
    }

    /// The metadata view backing this reference.
    pub fn metadata(&self) -> &SkeletonMetadata {
        &self.metadata
    }

    /// The referenced assembly's name.
    pub fn assembly_name(&self) -> &str {
        &self.assembly_name
    }

    /// Looks up documentation for a symbol of the referenced assembly.
    pub fn documentation_for(&self, symbol: &str) -> Option<String> {
        self.documentation.documentation_for(symbol)
    }

    /// A display string in the form `Name (assembly, 1234 bytes)`.
    pub fn display(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SkeletonReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {} bytes)",
            self.assembly_name,
            self.properties,
            self.metadata.len()
        )
    }
}

impl fmt::Debug for SkeletonReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkeletonReference")
            .field("assembly_name", &self.assembly_name)
            .field("properties", &self.properties)
            .field("checksum", &self.metadata.checksum())
            .finish()
    }
}
