//! The loaded metadata view of a skeleton image.

use std::fmt;
use std::sync::Arc;

use skeleton_common::ContentHash;

use crate::error::{CacheError, CacheResult};
use crate::storage::{ImageBytes, StorageHandle};

struct LoadedImage {
    // Field order matters: the view (and any mapping) drops before the handle
    // releases the storage behind it.
    image: ImageBytes,
    storage: Box<dyn StorageHandle>,
}

/// A metadata-only image opened for random access, together with the storage
/// handle it was read from.
///
/// The byte layout belongs to the emitter; the cache only needs the bytes, their
/// length and a checksum for logging. Clones share one loaded image. The
/// storage handle is released exactly once, when the last clone is dropped, and
/// never before the bytes are unmapped.
#[derive(Clone)]
pub struct SkeletonMetadata {
    loaded: Arc<LoadedImage>,
    checksum: ContentHash,
}

impl SkeletonMetadata {
    /// Reads the image behind `storage` and takes ownership of the handle.
    ///
    /// Fails with [`CacheError::EmptyImage`] if the image has no bytes. On
    /// failure the handle is dropped and its storage released.
    pub fn load(storage: Box<dyn StorageHandle>) -> CacheResult<Self> {
        let image = storage.read_temporary()?;
        if image.is_empty() {
            return Err(CacheError::EmptyImage);
        }
        let checksum = ContentHash::from_bytes(&image);
        Ok(Self {
            loaded: Arc::new(LoadedImage { image, storage }),
            checksum,
        })
    }

    /// The raw image bytes.
    pub fn image(&self) -> &[u8] {
        &self.loaded.image
    }

    /// Returns `true` if the bytes are served from a memory mapping.
    pub fn is_mapped(&self) -> bool {
        self.loaded.image.is_mapped()
    }

    /// Identifier of the storage backing the image.
    pub fn storage_id(&self) -> &str {
        self.loaded.storage.identifier()
    }

    /// Size of the image in bytes.
    pub fn len(&self) -> usize {
        self.loaded.image.len()
    }

    /// Always `false`: empty images are rejected by [`load`](Self::load).
    pub fn is_empty(&self) -> bool {
        self.loaded.image.is_empty()
    }

    /// Content hash of the image bytes.
    pub fn checksum(&self) -> ContentHash {
        self.checksum
    }
}

impl fmt::Debug for SkeletonMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkeletonMetadata")
            .field("storage", &self.storage_id())
            .field("len", &self.len())
            .field("checksum", &self.checksum)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryStorage, MappedFileStorage, TemporaryStorage};
    use std::path::Path;

    #[test]
    fn rejects_empty_image() {
        let handle = InMemoryStorage::new().write_temporary(b"").unwrap();
        assert!(matches!(
            SkeletonMetadata::load(handle),
            Err(CacheError::EmptyImage)
        ));
    }

    #[test]
    fn exposes_bytes_and_checksum() {
        let handle = InMemoryStorage::new().write_temporary(b"surface").unwrap();
        let metadata = SkeletonMetadata::load(handle).unwrap();
        assert_eq!(metadata.len(), 7);
        assert!(!metadata.is_empty());
        assert!(!metadata.is_mapped());
        assert_eq!(metadata.image(), b"surface");
        assert_eq!(metadata.checksum(), ContentHash::from_bytes(b"surface"));
        assert!(metadata.storage_id().starts_with("memory:"));
    }

    #[test]
    fn clones_share_bytes() {
        let handle = InMemoryStorage::new().write_temporary(b"shared").unwrap();
        let metadata = SkeletonMetadata::load(handle).unwrap();
        let copy = metadata.clone();
        assert_eq!(copy.image().as_ptr(), metadata.image().as_ptr());
    }

    #[test]
    fn mapped_file_lives_until_last_clone_drops() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MappedFileStorage::new(dir.path());
        let metadata = SkeletonMetadata::load(storage.write_temporary(b"mapped").unwrap()).unwrap();
        assert!(metadata.is_mapped());
        let path = metadata.storage_id().to_string();
        let copy = metadata.clone();

        drop(metadata);
        assert!(Path::new(&path).exists());
        assert_eq!(copy.image(), b"mapped");

        drop(copy);
        assert!(!Path::new(&path).exists());
    }
}
