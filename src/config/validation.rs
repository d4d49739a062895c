use crate::config::types::{Config, MetadataConfig, ServerConfig, StorageConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_server_config(&config.server)?;
    validate_metadata_config(&config.metadata)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

/// Validates the shortening service configuration
fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidUrl(format!(
            "base-url must be http or https, got '{}'",
            other
        ))),
    }
}

/// Validates the metadata fetcher configuration
fn validate_metadata_config(config: &MetadataConfig) -> Result<(), ConfigError> {
    Url::parse(&config.favicon_endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid favicon-endpoint: {}", e)))?;

    if config.icon_size < 1 || config.icon_size > 512 {
        return Err(ConfigError::Validation(format!(
            "icon-size must be between 1 and 512, got {}",
            config.icon_size
        )));
    }

    if config.request_timeout_secs < 1 || config.request_timeout_secs > 120 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be between 1 and 120, got {}",
            config.request_timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
