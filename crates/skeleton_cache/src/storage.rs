//! Temporary storage for emitted skeleton images.
//!
//! An emitted image is written once through a [`TemporaryStorage`] and read
//! back as an [`ImageBytes`] view. The returned [`StorageHandle`] is the scarce
//! resource: it is owned by exactly one skeleton artifact and dropping it
//! releases the underlying storage.

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::ops::{Deref, Range};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use skeleton_common::ContentHash;
use tempfile::NamedTempFile;

use crate::error::{CacheError, CacheResult};

/// Magic bytes identifying a framed skeleton image.
const IMAGE_MAGIC: [u8; 4] = *b"SKEL";

/// Current image frame format version. Increment on breaking changes to the
/// header layout.
const IMAGE_FORMAT_VERSION: u32 = 1;

/// Header prepended to every image written by [`MappedFileStorage`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageHeader {
    /// Magic bytes: must be `b"SKEL"`.
    pub magic: [u8; 4],

    /// Frame format version.
    pub format_version: u32,

    /// Content hash of the payload.
    pub checksum: ContentHash,
}

/// Accepts emitted bytes and persists them for the lifetime of the returned handle.
pub trait TemporaryStorage: Send + Sync {
    /// Persists `data` and returns the handle that owns it.
    fn write_temporary(&self, data: &[u8]) -> CacheResult<Box<dyn StorageHandle>>;
}

/// Owns one persisted image. Dropping the handle releases the storage.
pub trait StorageHandle: Send + Sync {
    /// Re-opens the persisted image as a random-access byte source.
    fn read_temporary(&self) -> CacheResult<ImageBytes>;

    /// A stable name for this piece of storage, used in log lines.
    fn identifier(&self) -> &str;
}

enum ImageSource {
    Mapped(Mmap),
    Owned(Arc<[u8]>),
}

/// A random-access view of an image read back from a [`StorageHandle`].
///
/// A mapped view keeps the file mapped, so it must not outlive the handle that
/// produced it. [`SkeletonMetadata`](crate::SkeletonMetadata) owns both and
/// drops the view first.
pub struct ImageBytes {
    source: ImageSource,
    range: Range<usize>,
}

impl ImageBytes {
    /// Wraps owned bytes.
    pub fn from_owned(bytes: Arc<[u8]>) -> Self {
        let range = 0..bytes.len();
        Self {
            source: ImageSource::Owned(bytes),
            range,
        }
    }

    fn from_mapping(mmap: Mmap, range: Range<usize>) -> Self {
        Self {
            source: ImageSource::Mapped(mmap),
            range,
        }
    }

    /// Returns `true` if the view is backed by a memory mapping.
    pub fn is_mapped(&self) -> bool {
        matches!(self.source, ImageSource::Mapped(_))
    }
}

impl Deref for ImageBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        let all: &[u8] = match &self.source {
            ImageSource::Mapped(mmap) => &mmap[..],
            ImageSource::Owned(bytes) => &bytes[..],
        };
        &all[self.range.clone()]
    }
}

impl fmt::Debug for ImageBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBytes")
            .field("mapped", &self.is_mapped())
            .field("len", &self.len())
            .finish()
    }
}

/// Frames `data` as `4-byte LE header length + bincode header + payload`.
fn frame_image(data: &[u8]) -> CacheResult<Vec<u8>> {
    let header = ImageHeader {
        magic: IMAGE_MAGIC,
        format_version: IMAGE_FORMAT_VERSION,
        checksum: ContentHash::from_bytes(data),
    };

    let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
        .map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;

    let header_len = header_bytes.len() as u32;
    let mut output = Vec::with_capacity(4 + header_bytes.len() + data.len());
    output.extend_from_slice(&header_len.to_le_bytes());
    output.extend_from_slice(&header_bytes);
    output.extend_from_slice(data);
    Ok(output)
}

/// Validates a framed image and returns the payload's byte range within `raw`.
fn unframe_image(path: &Path, raw: &[u8]) -> CacheResult<Range<usize>> {
    let invalid = |reason: &str| CacheError::InvalidHeader {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    if raw.len() < 4 {
        return Err(invalid("missing header length"));
    }
    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&raw[..4]);
    let header_len = u32::from_le_bytes(len_bytes) as usize;
    if raw.len() < 4 + header_len {
        return Err(invalid("truncated header"));
    }

    let (header, _): (ImageHeader, usize) =
        bincode::serde::decode_from_slice(&raw[4..4 + header_len], bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

    if header.magic != IMAGE_MAGIC {
        return Err(invalid("bad magic bytes"));
    }
    if header.format_version != IMAGE_FORMAT_VERSION {
        return Err(CacheError::VersionMismatch {
            path: path.to_path_buf(),
            expected: IMAGE_FORMAT_VERSION,
            actual: header.format_version,
        });
    }

    let payload = 4 + header_len..raw.len();
    let actual = ContentHash::from_bytes(&raw[payload.clone()]);
    if actual != header.checksum {
        return Err(CacheError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: header.checksum.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(payload)
}

/// Stores images as framed temporary files and reads them back through a
/// memory mapping.
///
/// Each image lives in its own `skeleton-*.img` file under the storage
/// directory; the file is deleted when its handle is dropped.
pub struct MappedFileStorage {
    directory: PathBuf,
}

impl MappedFileStorage {
    /// Creates a storage rooted at `directory`. The directory is created on
    /// first write.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Creates a storage in the OS temp directory.
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir())
    }

    /// Returns the directory images are written to.
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl TemporaryStorage for MappedFileStorage {
    fn write_temporary(&self, data: &[u8]) -> CacheResult<Box<dyn StorageHandle>> {
        std::fs::create_dir_all(&self.directory).map_err(|e| CacheError::Io {
            path: self.directory.clone(),
            source: e,
        })?;

        let framed = frame_image(data)?;
        let mut file = tempfile::Builder::new()
            .prefix("skeleton-")
            .suffix(".img")
            .tempfile_in(&self.directory)
            .map_err(|e| CacheError::Io {
                path: self.directory.clone(),
                source: e,
            })?;
        file.write_all(&framed)
            .and_then(|()| file.flush())
            .map_err(|e| CacheError::Io {
                path: file.path().to_path_buf(),
                source: e,
            })?;

        let identifier = file.path().display().to_string();
        Ok(Box::new(MappedFileHandle { file, identifier }))
    }
}

struct MappedFileHandle {
    file: NamedTempFile,
    identifier: String,
}

impl StorageHandle for MappedFileHandle {
    fn read_temporary(&self) -> CacheResult<ImageBytes> {
        let path = self.file.path();
        let io_err = |e| CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        };
        let file = File::open(path).map_err(io_err)?;
        // SAFETY: the file is private to this handle and never written again
        // after `write_temporary` returns, so the mapping cannot change underneath.
        let mmap = unsafe { Mmap::map(&file) }.map_err(io_err)?;
        let payload = unframe_image(path, &mmap)?;
        Ok(ImageBytes::from_mapping(mmap, payload))
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// Keeps images on the heap. Useful where temp files are unavailable.
#[derive(Default)]
pub struct InMemoryStorage {
    next_id: AtomicU64,
}

impl InMemoryStorage {
    /// Creates an empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TemporaryStorage for InMemoryStorage {
    fn write_temporary(&self, data: &[u8]) -> CacheResult<Box<dyn StorageHandle>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(InMemoryHandle {
            bytes: Arc::from(data),
            identifier: format!("memory:{id}"),
        }))
    }
}

struct InMemoryHandle {
    bytes: Arc<[u8]>,
    identifier: String,
}

impl StorageHandle for InMemoryHandle {
    fn read_temporary(&self) -> CacheResult<ImageBytes> {
        Ok(ImageBytes::from_owned(Arc::clone(&self.bytes)))
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}
