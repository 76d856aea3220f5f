//! Configuration types deserialized from `skeleton.toml`.

use serde::Deserialize;
use std::path::PathBuf;

/// The top-level skeleton cache configuration.
///
/// Every section is optional; an empty file yields the defaults (memory-mapped
/// storage in the OS temp directory, diagnostics forwarded to the logger).
#[derive(Debug, Default, Deserialize)]
pub struct SkeletonConfig {
    /// Where emitted skeleton images are kept.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logger and telemetry behavior.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Temporary storage settings.
#[derive(Debug, Default, Deserialize)]
pub struct StorageConfig {
    /// Which storage backend holds emitted images.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Directory for memory-mapped image files. Defaults to the OS temp dir.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

/// The storage backend for emitted skeleton images.
#[derive(Debug, Default, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Temporary files read back through a memory mapping (default).
    #[default]
    Mapped,
    /// Heap-allocated buffers.
    Memory,
}

/// Logger and telemetry settings.
#[derive(Debug, Deserialize)]
pub struct TelemetryConfig {
    /// Forward every emit diagnostic message to the collaborator logger.
    #[serde(default = "default_true")]
    pub forward_diagnostics: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            forward_diagnostics: true,
        }
    }
}

fn default_true() -> bool {
    true
}
