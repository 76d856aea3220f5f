//! Structured diagnostic messages reported by the emitter.

use crate::code::DiagnosticCode;
use crate::severity::Severity;

/// A diagnostic produced while emitting a metadata-only image.
///
/// The skeleton cache never renders these to users; it forwards the message
/// to the optional logger and summarizes them by code for telemetry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The code identifying the kind of diagnostic.
    pub code: DiagnosticCode,
    /// The diagnostic message.
    pub message: String,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    /// Creates a new warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    fn new(severity: Severity, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Category;

    #[test]
    fn create_error() {
        let diag = Diagnostic::error(DiagnosticCode::error(246), "type not found");
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.code.to_string(), "E0246");
        assert_eq!(diag.message, "type not found");
    }

    #[test]
    fn create_warning() {
        let code = DiagnosticCode::new(Category::Warning, 1591);
        let diag = Diagnostic::warning(code, "missing doc comment");
        assert_eq!(diag.severity, Severity::Warning);
    }
}
