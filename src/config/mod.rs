//! Configuration module for linkstash
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every field has a default so the tool also runs with no config
//! file at all.

mod types;
mod validation;

// Re-export types
pub use types::{Config, MetadataConfig, ServerConfig, StorageConfig};

// Re-export validation
pub use validation::validate;

use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let config: Config = toml::from_str(&content)?;

    validate(&config)?;

    Ok(config)
}
