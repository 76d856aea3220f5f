//! Interfaces the skeleton cache consumes from its collaborators.
//!
//! The cache never produces compilations or versions itself. A host provides a
//! [`CompilationTracker`] per unit, the [`Compilation`] objects it hands out,
//! and optionally a [`SkeletonLogger`].

use std::future::Future;
use std::io::Write;
use std::sync::Arc;

use skeleton_common::VersionStamp;
use skeleton_diagnostics::Diagnostic;
use tokio_util::sync::CancellationToken;

use crate::error::CacheResult;

/// Options passed to [`Compilation::emit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmitOptions {
    /// Emit metadata only, no method bodies.
    pub metadata_only: bool,
    /// Include private members in the image.
    pub include_private_members: bool,
}

impl EmitOptions {
    /// The only options the skeleton builder uses.
    ///
    /// Private members are never needed to resolve a unit's public surface from
    /// another language, and including them adds emit cost and failure modes.
    pub const METADATA_ONLY: EmitOptions = EmitOptions {
        metadata_only: true,
        include_private_members: false,
    };
}

/// Outcome of an emission.
#[derive(Clone, Debug, Default)]
pub struct EmitResult {
    /// Whether the image written to the output stream is usable.
    pub success: bool,
    /// Diagnostics produced while emitting. Usually empty on success.
    pub diagnostics: Vec<Diagnostic>,
}

impl EmitResult {
    /// A successful emission with no diagnostics.
    pub fn succeeded() -> Self {
        Self {
            success: true,
            diagnostics: Vec::new(),
        }
    }

    /// A failed emission carrying the given diagnostics.
    pub fn failed(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            success: false,
            diagnostics,
        }
    }
}

/// A fully bound compiled unit.
///
/// Compilations are identified by the address of their `Arc` allocation: two
/// handles name the same compilation iff they point at the same object. A
/// compilation may be expensive to keep alive, so the cache only ever holds it
/// weakly outside of an in-progress build.
pub trait Compilation: Send + Sync + 'static {
    /// The name of the assembly this compilation produces. Used in log lines.
    fn assembly_name(&self) -> &str;

    /// Writes an image of this compilation to `out`.
    ///
    /// This is CPU-bound and synchronous. Implementations should poll `cancel`
    /// and bail out early when it fires; the builder discards the output of a
    /// cancelled emission.
    fn emit(
        &self,
        options: &EmitOptions,
        out: &mut dyn Write,
        cancel: &CancellationToken,
    ) -> EmitResult;

    /// Looks up the documentation comment for a symbol in the source of this
    /// compilation.
    fn documentation_for(&self, _symbol: &str) -> Option<String> {
        None
    }
}

/// Tracks the evolving state of one compiled unit.
///
/// Both operations may trigger upstream compilation work and therefore suspend.
pub trait CompilationTracker: Send + Sync {
    /// Returns the unit's current dependent semantic version.
    ///
    /// Must never resolve to [`VersionStamp::DEFAULT`]. Fails with
    /// [`CacheError::VersionUnavailable`](crate::CacheError::VersionUnavailable)
    /// when the version cannot currently be computed.
    fn dependent_semantic_version(
        &self,
        cancel: &CancellationToken,
    ) -> impl Future<Output = CacheResult<VersionStamp>> + Send;

    /// Returns the unit's finished compilation, building it if needed.
    fn compilation(
        &self,
        cancel: &CancellationToken,
    ) -> impl Future<Output = CacheResult<Arc<dyn Compilation>>> + Send;
}

/// Optional line sink for skeleton build progress.
pub trait SkeletonLogger: Send + Sync {
    /// Records one message.
    fn log(&self, message: &str);
}

/// Returns the address that identifies a compilation.
pub(crate) fn identity_of(compilation: &Arc<dyn Compilation>) -> usize {
    Arc::as_ptr(compilation) as *const () as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl Compilation for Named {
        fn assembly_name(&self) -> &str {
            self.0
        }

        fn emit(&self, _: &EmitOptions, _: &mut dyn Write, _: &CancellationToken) -> EmitResult {
            EmitResult::succeeded()
        }
    }

    #[test]
    fn metadata_only_excludes_privates() {
        assert!(EmitOptions::METADATA_ONLY.metadata_only);
        assert!(!EmitOptions::METADATA_ONLY.include_private_members);
    }

    #[test]
    fn identity_is_per_allocation() {
        let a: Arc<dyn Compilation> = Arc::new(Named("Lib"));
        let b: Arc<dyn Compilation> = Arc::new(Named("Lib"));
        assert_eq!(identity_of(&a), identity_of(&Arc::clone(&a)));
        assert_ne!(identity_of(&a), identity_of(&b));
    }

    #[test]
    fn default_documentation_is_none() {
        assert!(Named("Lib").documentation_for("T:Lib.Widget").is_none());
    }

    #[test]
    fn emit_result_constructors() {
        assert!(EmitResult::succeeded().success);
        let failed = EmitResult::failed(Vec::new());
        assert!(!failed.success);
    }
}
