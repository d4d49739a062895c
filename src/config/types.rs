use serde::Deserialize;

/// Main configuration structure for linkstash
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Remote shortening service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the URL-shortening service
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Metadata fetcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataConfig {
    /// Base URL of the favicon aggregation endpoint
    #[serde(rename = "favicon-endpoint", default = "default_favicon_endpoint")]
    pub favicon_endpoint: String,

    /// Requested favicon size in pixels
    #[serde(rename = "icon-size", default = "default_icon_size")]
    pub icon_size: u32,

    /// Per-request timeout for all network calls (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// User agent sent when fetching target pages for title extraction
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            favicon_endpoint: default_favicon_endpoint(),
            icon_size: default_icon_size(),
            request_timeout_secs: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Local storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_base_url() -> String {
    "https://url-shortener-server.onrender.com".to_string()
}

fn default_favicon_endpoint() -> String {
    "https://t0.gstatic.com/faviconV2".to_string()
}

fn default_icon_size() -> u32 {
    128
}

fn default_request_timeout() -> u64 {
    15
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; GPTBot/1.0)".to_string()
}

fn default_database_path() -> String {
    "linkstash.db".to_string()
}
