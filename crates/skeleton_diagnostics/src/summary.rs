//! Per-code grouping of emit diagnostics for telemetry.

use crate::code::DiagnosticCode;
use crate::diagnostic::Diagnostic;
use std::collections::HashMap;
use std::fmt;

/// Counts of diagnostics grouped by code, in order of first appearance.
///
/// Displays as `E0246:1;E1002:10`, the format emitted with the
/// metadata-only emit failure event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeSummary {
    counts: Vec<(DiagnosticCode, usize)>,
}

impl CodeSummary {
    /// Groups the given diagnostics by code.
    pub fn from_diagnostics<'a>(diagnostics: impl IntoIterator<Item = &'a Diagnostic>) -> Self {
        let mut index: HashMap<DiagnosticCode, usize> = HashMap::new();
        let mut counts: Vec<(DiagnosticCode, usize)> = Vec::new();
        for diag in diagnostics {
            match index.get(&diag.code) {
                Some(&slot) => counts[slot].1 += 1,
                None => {
                    index.insert(diag.code, counts.len());
                    counts.push((diag.code, 1));
                }
            }
        }
        Self { counts }
    }

    /// Returns the total number of diagnostics summarized.
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }
}

impl fmt::Display for CodeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (code, count)) in self.counts.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{code}:{count}")?;
        }
        Ok(())
    }
}
