//! Favicon fetching via an aggregation endpoint
//!
//! Issues a GET against the configured endpoint (reference:
//! `https://t0.gstatic.com/faviconV2`) parameterized by the target site and
//! the desired pixel size. The response body is only accepted when the
//! status is 2xx, the body is non-empty, and the Content-Type is absent or
//! an `image/` type.

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use url::Url;

/// Fetches favicon bytes for `site_url`, or `None` on any failure
pub(crate) async fn fetch(
    client: &Client,
    endpoint: &Url,
    site_url: &Url,
    size: u32,
) -> Option<Vec<u8>> {
    let mut request_url = endpoint.clone();
    request_url
        .query_pairs_mut()
        .append_pair("client", "SOCIAL")
        .append_pair("type", "FAVICON")
        .append_pair("fallback_opts", "TYPE,SIZE,URL")
        .append_pair("url", site_url.as_str())
        .append_pair("size", &size.to_string());

    let response = match client.get(request_url).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(site = %site_url, error = %e, "favicon request failed");
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::debug!(site = %site_url, status = %response.status(), "favicon request rejected");
        return None;
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase());

    // Accept when the header is absent, reject when it names a non-image type
    if let Some(mime) = &content_type {
        if !mime.starts_with("image/") {
            tracing::debug!(site = %site_url, mime = %mime, "favicon response is not an image");
            return None;
        }
    }

    let bytes = response.bytes().await.ok()?;
    if bytes.is_empty() {
        return None;
    }

    Some(bytes.to_vec())
}
