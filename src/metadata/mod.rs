//! Metadata fetchers for stored links
//!
//! Two independent best-effort network calls enrich a resolved link for
//! display: a favicon from an aggregation endpoint and a page title scraped
//! from the target URL itself. Both are soft: they never return an error,
//! any failure collapses to `None`.

mod favicon;
mod title;

pub use title::extract_title;

use crate::config::MetadataConfig;
use crate::ConfigError;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Best-effort fetcher for favicons and page titles
#[derive(Debug, Clone)]
pub struct MetadataFetcher {
    client: Client,
    favicon_endpoint: Url,
    user_agent: String,
}

impl MetadataFetcher {
    /// Builds a fetcher from the metadata configuration
    ///
    /// # Errors
    ///
    /// * `ConfigError::InvalidUrl` - the favicon endpoint does not parse
    /// * `ConfigError::Validation` - the HTTP client could not be built
    pub fn new(config: &MetadataConfig) -> Result<Self, ConfigError> {
        let favicon_endpoint = Url::parse(&config.favicon_endpoint)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid favicon-endpoint: {}", e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| ConfigError::Validation(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            favicon_endpoint,
            user_agent: config.user_agent.clone(),
        })
    }

    /// Fetches favicon bytes for a site, or `None` on any failure
    ///
    /// # Arguments
    ///
    /// * `site_url` - The site to fetch a favicon for
    /// * `size` - Desired pixel size
    pub async fn fetch_favicon(&self, site_url: &Url, size: u32) -> Option<Vec<u8>> {
        favicon::fetch(&self.client, &self.favicon_endpoint, site_url, size).await
    }

    /// Fetches and extracts the page title for a site, or `None` on any
    /// failure
    pub async fn fetch_page_title(&self, site_url: &Url) -> Option<String> {
        title::fetch(&self.client, &self.user_agent, site_url).await
    }
}
