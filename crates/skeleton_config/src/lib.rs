//! Parsing and validation of `skeleton.toml` configuration files.
//!
//! This crate reads the skeleton cache configuration and produces a
//! strongly-typed [`SkeletonConfig`] selecting the temporary storage backend
//! and telemetry behavior.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use types::*;
