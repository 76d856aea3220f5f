//! Documentation lookups for symbols resolved through a skeleton.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::compilation::Compilation;

/// Resolves documentation comments against the compilation a skeleton was
/// emitted from, for as long as that compilation is alive.
///
/// Holding the compilation weakly keeps the skeleton from extending the
/// compilation's lifetime; once it is gone, lookups return `None`.
#[derive(Clone)]
pub struct DeferredDocumentation {
    compilation: Weak<dyn Compilation>,
}

impl DeferredDocumentation {
    /// Creates an adapter for `compilation`.
    pub fn new(compilation: &Arc<dyn Compilation>) -> Self {
        Self {
            compilation: Arc::downgrade(compilation),
        }
    }

    /// Returns the documentation comment for `symbol`, if the compilation is
    /// still alive and has one.
    pub fn documentation_for(&self, symbol: &str) -> Option<String> {
        self.compilation.upgrade()?.documentation_for(symbol)
    }

    /// Returns `true` while the originating compilation is alive.
    pub fn is_available(&self) -> bool {
        self.compilation.strong_count() > 0
    }
}

impl fmt::Debug for DeferredDocumentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredDocumentation")
            .field("available", &self.is_available())
            .finish()
    }
}
