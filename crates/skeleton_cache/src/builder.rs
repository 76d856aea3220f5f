//! Emits metadata-only images and wraps them as skeleton artifacts.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use skeleton_diagnostics::{CodeSummary, Diagnostic};
use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, info, warn};

use crate::artifact::SkeletonArtifact;
use crate::compilation::{Compilation, EmitOptions, SkeletonLogger};
use crate::documentation::DeferredDocumentation;
use crate::error::{CacheError, CacheResult};
use crate::metadata::SkeletonMetadata;
use crate::storage::TemporaryStorage;

/// Builds [`SkeletonArtifact`]s from compilations.
///
/// A build either produces an artifact, produces nothing (emission reported
/// errors, or storage failed), or is cancelled. Only cancellation is an `Err`;
/// failures are logged and reported through telemetry so the caller can fall
/// back to an older skeleton.
pub struct SkeletonBuilder {
    storage: Arc<dyn TemporaryStorage>,
    logger: Option<Arc<dyn SkeletonLogger>>,
    forward_diagnostics: bool,
}

impl SkeletonBuilder {
    /// Creates a builder writing images through `storage`.
    pub fn new(storage: Arc<dyn TemporaryStorage>) -> Self {
        Self {
            storage,
            logger: None,
            forward_diagnostics: true,
        }
    }

    /// Attaches a logger that receives build progress lines.
    pub fn with_logger(mut self, logger: Option<Arc<dyn SkeletonLogger>>) -> Self {
        self.logger = logger;
        self
    }

    /// Controls whether each emit diagnostic is forwarded to the logger on failure.
    pub fn with_forward_diagnostics(mut self, forward: bool) -> Self {
        self.forward_diagnostics = forward;
        self
    }

    /// Emits a metadata-only image of `compilation` and wraps it as an artifact.
    ///
    /// Returns `Ok(None)` when no skeleton could be produced.
    pub fn build(
        &self,
        compilation: &Arc<dyn Compilation>,
        cancel: &CancellationToken,
    ) -> CacheResult<Option<Arc<SkeletonArtifact>>> {
        if cancel.is_cancelled() {
            return Err(CacheError::Cancelled);
        }

        let assembly = compilation.assembly_name().to_string();
        self.log(format_args!(
            "Beginning to create a skeleton assembly for {assembly}..."
        ));
        let result = self.emit_and_store(compilation, &assembly, cancel);
        self.log(format_args!(
            "Done trying to create a skeleton assembly for {assembly}"
        ));
        result
    }

    fn emit_and_store(
        &self,
        compilation: &Arc<dyn Compilation>,
        assembly: &str,
        cancel: &CancellationToken,
    ) -> CacheResult<Option<Arc<SkeletonArtifact>>> {
        let _span = debug_span!("emit_metadata_only_image", assembly).entered();
        let started = Instant::now();

        let handle = {
            let mut stream = Vec::new();
            let emit = compilation.emit(&EmitOptions::METADATA_ONLY, &mut stream, cancel);
            if cancel.is_cancelled() {
                return Err(CacheError::Cancelled);
            }
            if !emit.success || stream.is_empty() {
                self.report_emit_failure(assembly, &emit.diagnostics);
                return Ok(None);
            }
            self.log(format_args!(
                "Successfully emitted a skeleton assembly for {assembly}"
            ));

            match self.storage.write_temporary(&stream) {
                Ok(handle) => handle,
                Err(err) => {
                    self.report_storage_failure(assembly, &err);
                    return Ok(None);
                }
            }
        };

        let metadata = match SkeletonMetadata::load(handle) {
            Ok(metadata) => metadata,
            Err(err) => {
                self.report_storage_failure(assembly, &err);
                return Ok(None);
            }
        };

        debug!(
            storage = metadata.storage_id(),
            bytes = metadata.len(),
            checksum = %metadata.checksum().short(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "emitted skeleton image"
        );

        Ok(Some(Arc::new(SkeletonArtifact::new(
            metadata,
            assembly,
            DeferredDocumentation::new(compilation),
        ))))
    }

    fn report_emit_failure(&self, assembly: &str, diagnostics: &[Diagnostic]) {
        if let Some(logger) = &self.logger {
            logger.log(&format!("Failed to create a skeleton assembly for {assembly}:"));
            if self.forward_diagnostics {
                for diagnostic in diagnostics {
                    logger.log(&format!("  {}", diagnostic.message));
                }
            }
        }

        let summary = CodeSummary::from_diagnostics(diagnostics);
        let errors = diagnostics.iter().filter(|d| d.severity.is_error()).count();
        info!(
            target: "skeleton::telemetry",
            assembly,
            diagnostics = summary.total(),
            errors,
            codes = %summary,
            "metadata-only emit failed"
        );
    }

    fn report_storage_failure(&self, assembly: &str, err: &CacheError) {
        self.log(format_args!(
            "Failed to store the skeleton assembly for {assembly}: {err}"
        ));
        warn!(assembly, %err, "skeleton image storage failed");
    }

    fn log(&self, message: fmt::Arguments<'_>) {
        if let Some(logger) = &self.logger {
            logger.log(&message.to_string());
        }
    }
}
