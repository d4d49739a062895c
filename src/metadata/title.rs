//! Page title extraction
//!
//! Fetches the target page directly (with a descriptive user agent and no
//! caching) and extracts a display title, preferring the `og:title` meta
//! tag over the `<title>` element.

use reqwest::header::{CACHE_CONTROL, USER_AGENT};
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

/// Fetches and extracts the page title for `site_url`, or `None` on any
/// failure
pub(crate) async fn fetch(client: &Client, user_agent: &str, site_url: &Url) -> Option<String> {
    let response = match client
        .get(site_url.clone())
        .header(USER_AGENT, user_agent)
        .header(CACHE_CONTROL, "no-cache")
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(site = %site_url, error = %e, "title request failed");
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::debug!(site = %site_url, status = %response.status(), "title request rejected");
        return None;
    }

    let bytes = response.bytes().await.ok()?;
    if bytes.is_empty() {
        return None;
    }

    let html = std::str::from_utf8(&bytes).ok()?;
    extract_title(html)
}

/// Extracts a display title from an HTML document
///
/// Priority order:
/// 1. The `content` attribute of `<meta property="og:title">`
/// 2. The inner text of the `<title>` element
///
/// Candidates are trimmed of whitespace and stray angle brackets; empty
/// candidates fall through. Returns `None` when neither yields a title.
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let og_selector = Selector::parse(r#"meta[property="og:title"]"#).ok()?;
    if let Some(element) = document.select(&og_selector).next() {
        if let Some(content) = element.value().attr("content") {
            let title = content.trim();
            if !title.is_empty() {
                return Some(title.to_string());
            }
        }
    }

    let title_selector = Selector::parse("title").ok()?;
    document
        .select(&title_selector)
        .next()
        .map(|element| {
            element
                .text()
                .collect::<String>()
                .trim()
                .trim_matches(|c: char| c == '<' || c == '>')
                .trim()
                .to_string()
        })
        .filter(|title| !title.is_empty())
}
