//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::{SkeletonConfig, StorageBackend};
use std::path::Path;

/// Name of the configuration file looked up in a directory.
pub const CONFIG_FILE: &str = "skeleton.toml";

/// Loads and validates `skeleton.toml` from a directory.
///
/// A missing file is not an error: the defaults apply.
pub fn load_config(dir: &Path) -> Result<SkeletonConfig, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(SkeletonConfig::default());
    }
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `skeleton.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<SkeletonConfig, ConfigError> {
    let config: SkeletonConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that the storage section is consistent.
fn validate_config(config: &SkeletonConfig) -> Result<(), ConfigError> {
    match (&config.storage.backend, &config.storage.directory) {
        (StorageBackend::Memory, Some(_)) => Err(ConfigError::ValidationError(
            "storage.directory is only valid with the mapped backend".to_string(),
        )),
        (StorageBackend::Mapped, Some(dir)) if dir.as_os_str().is_empty() => Err(
            ConfigError::ValidationError("storage.directory is empty".to_string()),
        ),
        _ => Ok(()),
    }
}
