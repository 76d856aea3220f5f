//! Test doubles shared by the integration suites.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use skeleton_cache::{
    CacheError, CacheResult, CancellationToken, Compilation, CompilationTracker, EmitOptions,
    EmitResult, ImageBytes, InMemoryStorage, SkeletonBuilder, SkeletonLogger,
    SkeletonReferenceCache, SkeletonService, SkeletonTable, SkeletonUnit, StorageHandle,
    TemporaryStorage, VersionStamp,
};
use skeleton_diagnostics::{Diagnostic, DiagnosticCode};

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// A compilation whose emit outcome is controlled by the test.
pub struct ScriptedCompilation {
    name: String,
    emits: AtomicUsize,
    fail: AtomicBool,
    delay: Duration,
    docs: HashMap<String, String>,
}

impl ScriptedCompilation {
    pub fn succeeding(name: &str) -> Arc<Self> {
        Self::build(name, false, Duration::ZERO)
    }

    pub fn failing(name: &str) -> Arc<Self> {
        Self::build(name, true, Duration::ZERO)
    }

    /// Succeeds after sleeping in `emit`, to widen race windows.
    pub fn slow(name: &str, delay: Duration) -> Arc<Self> {
        Self::build(name, false, delay)
    }

    pub fn with_doc(name: &str, symbol: &str, doc: &str) -> Arc<Self> {
        let mut compilation = Self::new(name, false, Duration::ZERO);
        compilation.docs.insert(symbol.to_string(), doc.to_string());
        Arc::new(compilation)
    }

    fn build(name: &str, fail: bool, delay: Duration) -> Arc<Self> {
        Arc::new(Self::new(name, fail, delay))
    }

    fn new(name: &str, fail: bool, delay: Duration) -> Self {
        Self {
            name: name.to_string(),
            emits: AtomicUsize::new(0),
            fail: AtomicBool::new(fail),
            delay,
            docs: HashMap::new(),
        }
    }

    pub fn emits(&self) -> usize {
        self.emits.load(Ordering::SeqCst)
    }

    pub fn image(&self) -> Vec<u8> {
        format!("{} public surface", self.name).into_bytes()
    }
}

impl Compilation for ScriptedCompilation {
    fn assembly_name(&self) -> &str {
        &self.name
    }

    fn emit(&self, options: &EmitOptions, out: &mut dyn Write, cancel: &CancellationToken) -> EmitResult {
        assert_eq!(*options, EmitOptions::METADATA_ONLY);
        self.emits.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if cancel.is_cancelled() {
            return EmitResult::failed(Vec::new());
        }
        if self.fail.load(Ordering::SeqCst) {
            return EmitResult::failed(vec![
                Diagnostic::error(DiagnosticCode::error(246), "The type 'Missing' could not be found"),
                Diagnostic::error(DiagnosticCode::error(1002), "; expected"),
            ]);
        }
        out.write_all(&self.image()).unwrap();
        EmitResult::succeeded()
    }

    fn documentation_for(&self, symbol: &str) -> Option<String> {
        self.docs.get(symbol).cloned()
    }
}

// ---------------------------------------------------------------------------
// Unit
// ---------------------------------------------------------------------------

/// A tracked unit with a settable version and compilation.
pub struct FakeUnit {
    version: Mutex<Option<VersionStamp>>,
    compilation: Mutex<Arc<dyn Compilation>>,
    compilation_requests: AtomicUsize,
    cache: SkeletonReferenceCache,
}

impl FakeUnit {
    pub fn new(version: VersionStamp, compilation: Arc<dyn Compilation>) -> Self {
        Self::with_cache(version, compilation, SkeletonReferenceCache::new())
    }

    pub fn with_cache(
        version: VersionStamp,
        compilation: Arc<dyn Compilation>,
        cache: SkeletonReferenceCache,
    ) -> Self {
        Self {
            version: Mutex::new(Some(version)),
            compilation: Mutex::new(compilation),
            compilation_requests: AtomicUsize::new(0),
            cache,
        }
    }

    /// A fork sharing this unit's version and compilation, seeded with a copy of
    /// its cache.
    pub fn fork(&self, service: &SkeletonService) -> Self {
        Self::with_cache(
            self.current_version().unwrap_or_default(),
            self.compilation.lock().clone(),
            service.clone_cache(self),
        )
    }

    pub fn advance(&self, version: VersionStamp, compilation: Arc<dyn Compilation>) {
        *self.version.lock() = Some(version);
        *self.compilation.lock() = compilation;
    }

    /// Makes the version source fail until the next `advance`.
    pub fn unload(&self) {
        *self.version.lock() = None;
    }

    pub fn current_version(&self) -> Option<VersionStamp> {
        *self.version.lock()
    }

    pub fn compilation_requests(&self) -> usize {
        self.compilation_requests.load(Ordering::SeqCst)
    }

    pub fn release_compilation(&self, replacement: Arc<dyn Compilation>) {
        *self.compilation.lock() = replacement;
    }
}

impl CompilationTracker for FakeUnit {
    async fn dependent_semantic_version(&self, cancel: &CancellationToken) -> CacheResult<VersionStamp> {
        if cancel.is_cancelled() {
            return Err(CacheError::Cancelled);
        }
        let version = *self.version.lock();
        version.ok_or_else(|| CacheError::VersionUnavailable {
            reason: "unit is unloaded".to_string(),
        })
    }

    async fn compilation(&self, cancel: &CancellationToken) -> CacheResult<Arc<dyn Compilation>> {
        if cancel.is_cancelled() {
            return Err(CacheError::Cancelled);
        }
        self.compilation_requests.fetch_add(1, Ordering::SeqCst);
        let compilation = self.compilation.lock().clone();
        Ok(compilation)
    }
}

impl SkeletonUnit for FakeUnit {
    fn skeleton_cache(&self) -> &SkeletonReferenceCache {
        &self.cache
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Storage that counts writes and handle releases.
#[derive(Default)]
pub struct CountingStorage {
    inner: InMemoryStorage,
    writes: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
}

impl CountingStorage {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.writes() - self.releases()
    }
}

impl TemporaryStorage for CountingStorage {
    fn write_temporary(&self, data: &[u8]) -> CacheResult<Box<dyn StorageHandle>> {
        let inner = self.inner.write_temporary(data)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountingHandle {
            inner,
            releases: Arc::clone(&self.releases),
        }))
    }
}

struct CountingHandle {
    inner: Box<dyn StorageHandle>,
    releases: Arc<AtomicUsize>,
}

impl StorageHandle for CountingHandle {
    fn read_temporary(&self) -> CacheResult<ImageBytes> {
        self.inner.read_temporary()
    }

    fn identifier(&self) -> &str {
        self.inner.identifier()
    }
}

impl Drop for CountingHandle {
    fn drop(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingLogger {
    lines: Mutex<Vec<String>>,
}

impl RecordingLogger {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl SkeletonLogger for RecordingLogger {
    fn log(&self, message: &str) {
        self.lines.lock().push(message.to_string());
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A service over a private table and counting storage.
pub fn service_with(storage: &Arc<CountingStorage>, logger: Option<&Arc<RecordingLogger>>) -> SkeletonService {
    let builder = SkeletonBuilder::new(Arc::clone(storage) as Arc<dyn TemporaryStorage>)
        .with_logger(logger.map(|l| Arc::clone(l) as Arc<dyn SkeletonLogger>));
    SkeletonService::with_table(Arc::new(SkeletonTable::new()), builder)
}
