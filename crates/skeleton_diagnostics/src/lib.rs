//! Diagnostics reported by metadata-only emission.
//!
//! Emission failures are an expected outcome when building skeletons for code
//! with errors. This crate provides the structured [`Diagnostic`] the emitter
//! reports, its [`DiagnosticCode`], and [`CodeSummary`], which groups a batch of
//! diagnostics by code for telemetry.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod severity;
pub mod summary;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use severity::Severity;
pub use summary::CodeSummary;
