//! Domain string handling
//!
//! Configured domains arrive as bare hosts ("shop.example.com"), hosts with a
//! scheme prefix, or full origins with a port. This module normalizes them
//! into a crawl target: the raw string (used as the results key), the
//! normalized host (used for registry lookup and the Referer header), and the
//! root URL the crawl starts from.

use crate::CrawlError;
use url::Url;

/// A single domain to crawl, in its three useful forms
#[derive(Debug, Clone)]
pub struct DomainTarget {
    /// The domain exactly as configured; keys the results mapping
    pub raw: String,

    /// Scheme- and slash-stripped form, e.g. "shop.example.com" or "127.0.0.1:8080"
    pub host: String,

    /// The URL the crawl starts from (depth 0)
    pub root: Url,
}

impl DomainTarget {
    /// Parses a configured domain string into a crawl target
    ///
    /// Bare hosts get an `https://` root; strings that already carry a scheme
    /// keep it (useful for crawling plain-HTTP test servers).
    pub fn parse(raw: &str) -> Result<Self, CrawlError> {
        let host = normalize_domain(raw);
        if host.is_empty() {
            return Err(CrawlError::InvalidDomain {
                domain: raw.to_string(),
                message: "empty after normalization".to_string(),
            });
        }

        let root = root_url(raw).map_err(|e| CrawlError::InvalidDomain {
            domain: raw.to_string(),
            message: e.to_string(),
        })?;

        if root.host_str().is_none() {
            return Err(CrawlError::InvalidDomain {
                domain: raw.to_string(),
                message: "no host".to_string(),
            });
        }

        Ok(Self {
            raw: raw.to_string(),
            host,
            root,
        })
    }
}

/// Strips any scheme prefix and trailing slashes from a domain string
///
/// # Examples
///
/// ```
/// use shopcrawl::domain::normalize_domain;
///
/// assert_eq!(normalize_domain("https://shop.example.com/"), "shop.example.com");
/// assert_eq!(normalize_domain("shop.example.com"), "shop.example.com");
/// ```
pub fn normalize_domain(raw: &str) -> String {
    raw.trim()
        .strip_prefix("https://")
        .or_else(|| raw.trim().strip_prefix("http://"))
        .unwrap_or(raw.trim())
        .trim_end_matches('/')
        .to_string()
}

/// Builds the root URL for a configured domain string
pub fn root_url(raw: &str) -> Result<Url, url::ParseError> {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Url::parse(trimmed.trim_end_matches('/'))
    } else {
        Url::parse(&format!("https://{}", normalize_domain(trimmed)))
    }
}
