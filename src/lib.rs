//! Linkstash: save, shorten, and browse links
//!
//! This crate keeps a local record store of aliases held by a remote
//! URL-shortening service and enriches stored links for display by
//! resolving each alias and fetching a page title and favicon for the
//! resolved target URL.

pub mod config;
pub mod enrich;
pub mod metadata;
pub mod resolver;
pub mod storage;

use thiserror::Error;

use crate::enrich::PipelineError;
use crate::resolver::ResolverError;
use crate::storage::StoreError;

/// Main error type for linkstash operations
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Resolver error: {0}")]
    Resolver(#[from] ResolverError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LinkError {
    /// Renders this error as a short human-readable message.
    ///
    /// The mapping is total: every variant of the underlying error
    /// taxonomies has exactly one rendering, and anything else falls
    /// back to the error's `Display` output.
    pub fn user_message(&self) -> String {
        match self {
            Self::Store(e) => store_message(e),
            Self::Resolver(e) => resolver_message(e),
            Self::Pipeline(PipelineError::Store(e)) => format!("Storage error: {}", e),
            Self::Pipeline(PipelineError::Other(msg)) => msg.clone(),
            other => other.to_string(),
        }
    }
}

fn store_message(error: &StoreError) -> String {
    match error {
        StoreError::DuplicateServerId => "Duplicate link".to_string(),
        StoreError::NotFound => "Local item not found".to_string(),
        StoreError::PersistenceFailed(cause) => format!("Persistence failed: {}", cause),
    }
}

fn resolver_message(error: &ResolverError) -> String {
    match error {
        ResolverError::InvalidUrl => "Invalid URL".to_string(),
        ResolverError::InvalidResponse => "Invalid response".to_string(),
        ResolverError::NotFound => "Not found".to_string(),
        ResolverError::DecodingFailed(cause) => format!("Decoding failed: {}", cause),
        ResolverError::EncodingFailed(cause) => format!("Encoding failed: {}", cause),
        ResolverError::Http { status, .. } => format!("HTTP error: {}", status),
        ResolverError::Network(cause) => format!("Network error: {}", cause),
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for linkstash operations
pub type Result<T> = std::result::Result<T, LinkError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use enrich::{EnrichedLink, EnrichmentPipeline, LinkIcon, Snapshot};
pub use metadata::MetadataFetcher;
pub use resolver::{normalize_raw_url, AliasResolver, ResolvedAlias};
pub use storage::{LinkRecord, LinkStore, SqliteStore};
