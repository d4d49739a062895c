//! HTTP client for the URL-shortening service
//!
//! Status mapping, shared by both calls:
//! 200/201 decode the JSON payload, 404 maps to `NotFound`, any other
//! status maps to `Http` carrying the response body, and transport
//! failures map to `Network`.

use crate::resolver::{is_valid_server_id, ResolverError, ResolverResult};
use crate::storage::LinkRecord;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

const CREATE_PATH: &str = "/api/alias";

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    alias: String,
    #[serde(rename = "_links")]
    #[allow(dead_code)]
    links: AliasLinks,
}

#[derive(Debug, Deserialize)]
struct AliasLinks {
    #[serde(rename = "self")]
    #[allow(dead_code)]
    self_href: String,
    #[allow(dead_code)]
    short: String,
}

#[derive(Debug, Deserialize)]
struct ResolveResponse {
    url: String,
}

/// A resolved alias: the stored server ID together with its target URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAlias {
    pub server_id: String,
    pub url: String,
}

/// Client for the remote URL-shortening API
#[derive(Debug, Clone)]
pub struct AliasResolver {
    client: Client,
    base_url: Url,
}

impl AliasResolver {
    /// Creates a resolver against the given service base URL
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the shortening service
    /// * `timeout` - Per-request timeout
    ///
    /// # Errors
    ///
    /// * `InvalidUrl` - the base URL does not parse
    /// * `Network` - the HTTP client could not be built
    pub fn new(base_url: &str, timeout: Duration) -> ResolverResult<Self> {
        let base_url = Url::parse(base_url).map_err(|_| ResolverError::InvalidUrl)?;

        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(ResolverError::Network)?;

        Ok(Self { client, base_url })
    }

    /// Registers a raw URL with the shortening service
    ///
    /// Returns a new [`LinkRecord`] with a freshly generated local
    /// identifier and the returned alias as its `server_id`.
    pub async fn create(&self, raw_url: &str) -> ResolverResult<LinkRecord> {
        let endpoint = self
            .base_url
            .join(CREATE_PATH)
            .map_err(|_| ResolverError::InvalidUrl)?;

        let body = serde_json::to_vec(&CreateRequest { url: raw_url })
            .map_err(ResolverError::EncodingFailed)?;

        tracing::debug!(url = raw_url, "creating alias");

        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(ResolverError::Network)?;

        let status = response.status();
        match status {
            StatusCode::OK | StatusCode::CREATED => {
                let bytes = response.bytes().await.map_err(ResolverError::Network)?;
                let payload: CreateResponse =
                    serde_json::from_slice(&bytes).map_err(ResolverError::DecodingFailed)?;
                Ok(LinkRecord::new(payload.alias))
            }
            StatusCode::NOT_FOUND => Err(ResolverError::NotFound),
            _ => Err(http_error(status, response).await),
        }
    }

    /// Resolves a stored alias into its target URL
    ///
    /// The alias must match `[A-Za-z0-9_-]+`; anything else fails with
    /// `InvalidUrl` before any network call is made.
    pub async fn resolve(&self, server_id: &str) -> ResolverResult<ResolvedAlias> {
        if !is_valid_server_id(server_id) {
            return Err(ResolverError::InvalidUrl);
        }

        let endpoint = self
            .base_url
            .join(&format!("{}/{}", CREATE_PATH, server_id))
            .map_err(|_| ResolverError::InvalidUrl)?;

        tracing::debug!(server_id, "resolving alias");

        let response = self
            .client
            .get(endpoint)
            .send()
            .await
            .map_err(ResolverError::Network)?;

        let status = response.status();
        match status {
            StatusCode::OK => {
                let bytes = response.bytes().await.map_err(ResolverError::Network)?;
                let payload: ResolveResponse =
                    serde_json::from_slice(&bytes).map_err(ResolverError::DecodingFailed)?;
                Ok(ResolvedAlias {
                    server_id: server_id.to_string(),
                    url: payload.url,
                })
            }
            StatusCode::NOT_FOUND => Err(ResolverError::NotFound),
            _ => Err(http_error(status, response).await),
        }
    }
}

/// Builds an `Http` error, capturing the response body when readable
async fn http_error(status: StatusCode, response: reqwest::Response) -> ResolverError {
    let body = response.text().await.ok().filter(|b| !b.is_empty());
    ResolverError::Http {
        status: status.as_u16(),
        body,
    }
}
