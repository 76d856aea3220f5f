//! Diagnostic severity levels.

/// The severity of an emit diagnostic, ordered from least to most severe.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Severity {
    /// Hidden or informational output from the emitter.
    Info,
    /// A problem that does not prevent emission.
    Warning,
    /// A problem that makes emission fail.
    Error,
}

impl Severity {
    /// Returns `true` if this severity is [`Error`](Severity::Error).
    pub fn is_error(self) -> bool {
        self == Severity::Error
    }
}
