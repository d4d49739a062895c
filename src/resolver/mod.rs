//! Remote resolver module
//!
//! This module wraps the URL-shortening HTTP API:
//! - `create` registers a raw URL and returns its alias
//! - `resolve` translates a stored alias back into its target URL
//!
//! It also normalizes raw user input into a URL the service will accept.

mod client;

pub use client::{AliasResolver, ResolvedAlias};

use thiserror::Error;
use url::Url;

/// Errors returned by the shortening-service client
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("invalid URL")]
    InvalidUrl,

    #[error("encoding failed: {0}")]
    EncodingFailed(#[source] serde_json::Error),

    #[error("decoding failed: {0}")]
    DecodingFailed(#[source] serde_json::Error),

    #[error("invalid response")]
    InvalidResponse,

    #[error("HTTP error: {status}")]
    Http { status: u16, body: Option<String> },

    #[error("not found")]
    NotFound,

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
}

/// Result type for resolver operations
pub type ResolverResult<T> = Result<T, ResolverError>;

/// Checks whether an alias is safe to interpolate into a request path.
///
/// Aliases are restricted to `[A-Za-z0-9_-]+`.
pub(crate) fn is_valid_server_id(server_id: &str) -> bool {
    !server_id.is_empty()
        && server_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Normalizes raw user input into a URL suitable for the shortening service.
///
/// Trims whitespace, prepends `https://` when no scheme is present, and
/// requires an http(s) scheme with a plausible host: `localhost`, an IPv6
/// literal, or at least two dot-separated labels.
///
/// # Returns
///
/// * `Some(Url)` - The normalized URL
/// * `None` - The input cannot be turned into an acceptable URL
pub fn normalize_raw_url(raw: &str) -> Option<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate).ok()?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return None,
    }

    let host = url.host_str()?;
    if !is_likely_valid_host(host) {
        return None;
    }

    Some(url)
}

/// Accepts localhost, IPv6 literals, and hosts with at least two labels
fn is_likely_valid_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    if host == "localhost" {
        return true;
    }
    if host.contains(':') {
        return true;
    }
    host.split('.').filter(|label| !label.is_empty()).count() >= 2
}
