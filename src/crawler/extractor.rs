//! Link extraction and filtering
//!
//! Extraction resolves every `<a href>` against the page URL and keeps only
//! links on the crawled site. Filtering then drops trap paths and partitions
//! the survivors into pagination links (always followed) and product
//! candidates; everything else is dropped. This filter is the sole gate on
//! recursion fan-out.

use crate::patterns::SitePattern;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// URL substrings that lead to login walls, carts, and other crawl traps
const TRAP_SEGMENTS: &[&str] = &[
    "login",
    "signin",
    "cart",
    "checkout",
    "account",
    "wishlist",
    "unsubscribe",
    "email-preference",
];

/// Links that survived filtering, by the reason they were kept
#[derive(Debug, Default)]
pub struct FilteredLinks {
    /// Pagination links, always followed
    pub pagination: Vec<Url>,

    /// Links matching the site's product patterns
    pub candidates: Vec<Url>,
}

impl FilteredLinks {
    pub fn is_empty(&self) -> bool {
        self.pagination.is_empty() && self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pagination.len() + self.candidates.len()
    }

    /// All kept links, pagination first
    pub fn into_urls(self) -> impl Iterator<Item = Url> {
        self.pagination.into_iter().chain(self.candidates)
    }
}

/// Extracts all same-site links from an HTML document
///
/// # Arguments
///
/// * `base` - The URL the document was fetched from; relative links resolve
///   against it and its host/port bound which links are kept
/// * `html` - The document text
pub fn extract_links(base: &Url, html: &str) -> HashSet<Url> {
    let document = Html::parse_document(html);
    let mut links = HashSet::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(resolved) = resolve_link(href, base) {
                    if same_site(&resolved, base) {
                        links.insert(resolved);
                    }
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None for empty hrefs, fragment-only anchors, special schemes
/// (javascript:, mailto:, tel:, data:), unparseable hrefs, and anything that
/// is not HTTP(S) after resolution.
fn resolve_link(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let resolved = base.join(href).ok()?;
    matches!(resolved.scheme(), "http" | "https").then_some(resolved)
}

/// Whether two URLs share a network location (host and port)
fn same_site(url: &Url, base: &Url) -> bool {
    url.host_str() == base.host_str()
        && url.port_or_known_default() == base.port_or_known_default()
}

/// Partitions extracted links into the set worth recursing on
pub fn filter_links(links: HashSet<Url>, pattern: &SitePattern) -> FilteredLinks {
    let mut filtered = FilteredLinks::default();

    for link in links {
        let lowered = link.as_str().to_ascii_lowercase();
        if TRAP_SEGMENTS.iter().any(|trap| lowered.contains(trap)) {
            continue;
        }

        if pattern.is_pagination(&link) {
            filtered.pagination.push(link);
        } else if pattern.is_product(&link) {
            filtered.candidates.push(link);
        }
        // everything else is dropped
    }

    filtered
}
