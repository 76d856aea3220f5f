//! Diagnostic codes with category prefixes for structured error identification.

use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Category {
    /// Compiler errors that block emission, prefixed with `E`.
    Error,
    /// Compiler warnings, prefixed with `W`.
    Warning,
    /// Failures of the metadata writer itself, prefixed with `M`.
    Emit,
    /// Informational messages, prefixed with `I`.
    Info,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Emit => 'M',
            Category::Info => 'I',
        }
    }
}

/// A structured diagnostic code combining a category prefix and a numeric identifier.
///
/// Displayed as the category prefix followed by a zero-padded 4-digit number,
/// e.g. `E0246`, `M0001`. Telemetry groups emit failures by this display form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }

    /// Shorthand for an error-category code.
    pub fn error(number: u16) -> Self {
        Self::new(Category::Error, number)
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:04}", self.category.prefix(), self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_prefixes() {
        assert_eq!(Category::Error.prefix(), 'E');
        assert_eq!(Category::Warning.prefix(), 'W');
        assert_eq!(Category::Emit.prefix(), 'M');
        assert_eq!(Category::Info.prefix(), 'I');
    }

    #[test]
    fn display_format() {
        assert_eq!(DiagnosticCode::error(246).to_string(), "E0246");
        assert_eq!(
            DiagnosticCode::new(Category::Emit, 1).to_string(),
            "M0001"
        );
        assert_eq!(
            DiagnosticCode::new(Category::Warning, 1591).to_string(),
            "W1591"
        );
    }
}
