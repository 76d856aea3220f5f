//! Error types for skeleton cache operations.

use std::path::PathBuf;

/// Result alias used throughout the skeleton cache.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur during skeleton cache operations.
///
/// Only [`VersionUnavailable`](CacheError::VersionUnavailable),
/// [`UninitializedVersion`](CacheError::UninitializedVersion) and
/// [`Cancelled`](CacheError::Cancelled) ever reach a caller asking for a
/// reference. Emission and storage failures are absorbed by the builder and
/// turn into "no new skeleton", which the per-unit cache answers with its
/// previous artifact.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The upstream unit could not report its dependent semantic version.
    #[error("dependent semantic version unavailable: {reason}")]
    VersionUnavailable {
        /// Why the version could not be computed.
        reason: String,
    },

    /// A version computation returned the reserved uninitialized stamp.
    #[error("version source returned the reserved uninitialized version")]
    UninitializedVersion,

    /// The operation was cancelled before it committed anything.
    #[error("skeleton operation cancelled")]
    Cancelled,

    /// An I/O error occurred while writing or reading temporary storage.
    #[error("skeleton storage I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A stored image has an invalid or missing header.
    #[error("invalid skeleton image header in {path}: {reason}")]
    InvalidHeader {
        /// The image file path.
        path: PathBuf,
        /// Description of the header problem.
        reason: String,
    },

    /// The stored checksum does not match the payload.
    #[error("checksum mismatch in {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The image file path.
        path: PathBuf,
        /// The checksum recorded in the header.
        expected: String,
        /// The checksum computed from the payload.
        actual: String,
    },

    /// The image was written with a different format version.
    #[error("format version mismatch in {path}: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The image file path.
        path: PathBuf,
        /// The expected format version.
        expected: u32,
        /// The format version found in the file.
        actual: u32,
    },

    /// The image header could not be encoded or decoded.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// Emission succeeded but produced no bytes.
    #[error("emitted skeleton image is empty")]
    EmptyImage,
}

impl CacheError {
    /// Returns `true` for cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CacheError::Cancelled)
    }
}
