// src/crawl/extract.rs
// =============================================================================
// This module fetches one page and pulls every candidate URL out of it.
//
// We look in three places, in this order:
// 1. href attributes of <a> tags
// 2. src attributes of <img>, <script>, <link> and <iframe> tags
// 3. URL-looking text inside inline <script> blocks
//
// Links that start with "/" are resolved against the page's own URL.
// Anything that doesn't end up as an absolute http(s) URL is dropped.
// Duplicates are kept; the crawler deduplicates later.
//
// We use the `scraper` crate to parse HTML and select elements with CSS
// selectors, `url` to resolve and validate URLs, and `regex` to scan
// script text.
//
// Rust concepts:
// - Lazy statics: selectors and regexes are compiled once, on first use
// - Option chaining with ?: bail out of a helper as soon as a step fails
// =============================================================================

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use crate::error::FetchError;

// These selectors and the pattern are constants, so a parse failure is a
// programmer error and panicking is fine
static ANCHORS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

static SOURCES: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("img[src], script[src], link[src], iframe[src]")
        .expect("source selector is valid")
});

static SCRIPTS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script").expect("script selector is valid"));

// An absolute http(s):// prefix or a leading "/", then a run of URL-safe
// characters, then an optional query string
static SCRIPT_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:https?://|/)[\w/.:-]+(?:\?\S+)?").expect("script URL pattern is valid")
});

/// Fetches pages and extracts their links
#[derive(Clone)]
pub struct LinkExtractor {
    client: Client,
}

impl LinkExtractor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Downloads `url` and returns every candidate link on it
    ///
    /// The page's own status code doesn't matter: a custom 404 page still
    /// has a navigation bar worth following.
    pub async fn extract(&self, url: &str) -> Result<Vec<String>, FetchError> {
        let response = self.client.get(url).send().await?;
        let html = response.text().await?;
        Ok(extract_links(&html, url))
    }
}

/// Extracts candidate links from HTML content
///
/// Example:
///   html = `<a href="/docs">Docs</a>`
///   page_url = "https://example.com/page"
///   result = ["https://example.com/docs"]
pub fn extract_links(html: &str, page_url: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    // Without a valid page URL we can still keep absolute links, we just
    // can't resolve the root-relative ones
    let base = Url::parse(page_url).ok();
    let base = base.as_ref();

    let mut links = Vec::new();

    for element in document.select(&ANCHORS) {
        if let Some(href) = element.value().attr("href") {
            links.extend(accept(base, href));
        }
    }

    for element in document.select(&SOURCES) {
        if let Some(src) = element.value().attr("src") {
            links.extend(accept(base, src));
        }
    }

    for script in document.select(&SCRIPTS) {
        let text: String = script.text().collect();
        if text.trim().is_empty() {
            continue;
        }
        for found in SCRIPT_URL.find_iter(&text) {
            links.extend(accept(base, found.as_str()));
        }
    }

    links
}

// Turns a raw attribute or script match into an absolute URL, or None
//
// Only values starting with "/" are resolved. Other relative forms like
// "page.html" or "../up" are not absolute and get dropped.
fn accept(base: Option<&Url>, raw: &str) -> Option<String> {
    let raw = raw.trim();

    let candidate = if raw.starts_with('/') {
        base?.join(raw).ok()?.to_string()
    } else {
        raw.to_string()
    };

    is_absolute_http(&candidate).then_some(candidate)
}

// Checks that a string parses as an absolute http(s) URL with a host
fn is_absolute_http(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why keep the raw string instead of Url::to_string()?
//    - Url normalizes: "https://example.com" becomes "https://example.com/"
//    - We treat the exact text as the link's identity, so we only use the
//      normalized form when we had to resolve a "/path" ourselves
//
// 2. What does links.extend(option) do?
//    - Option implements IntoIterator: Some(x) yields x, None yields nothing
//    - So extend() pushes the value only when there is one
//
// 3. Why is Html parsing not async?
//    - Parsing is pure CPU work on a string that is already downloaded
//    - Only the network call (send + text) needs .await
// -----------------------------------------------------------------------------
