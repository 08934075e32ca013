//! Site pattern registry
//!
//! Maps a domain to the regex sets that recognize its product and pagination
//! URLs, plus a flag for sites that only produce useful markup after
//! JavaScript rendering. Lookup is by substring containment against known
//! retailer identifiers, first match wins, with a mandatory default entry for
//! everything else.

use regex::RegexSet;
use url::Url;

/// Product/pagination recognizers for one retailer family
#[derive(Debug)]
pub struct SitePattern {
    product: RegexSet,
    pagination: RegexSet,
    requires_rendering: bool,
}

impl SitePattern {
    fn new(
        product: &[&str],
        pagination: &[&str],
        requires_rendering: bool,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            product: RegexSet::new(product)?,
            pagination: RegexSet::new(pagination)?,
            requires_rendering,
        })
    }

    /// Whether this URL looks like a product page
    ///
    /// Matching runs against the lowercased path + query only, so digit runs
    /// in the host (ports, IP literals) never count as product IDs.
    pub fn is_product(&self, url: &Url) -> bool {
        self.product.is_match(&match_target(url))
    }

    /// Whether this URL looks like a pagination link
    pub fn is_pagination(&self, url: &Url) -> bool {
        self.pagination.is_match(&match_target(url))
    }

    /// Whether this site needs a headless renderer to produce real markup
    pub fn requires_rendering(&self) -> bool {
        self.requires_rendering
    }
}

/// The portion of a URL that classification applies to
fn match_target(url: &Url) -> String {
    let target = match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    };
    target.to_ascii_lowercase()
}

/// Registry of per-retailer patterns with a default fallback
#[derive(Debug)]
pub struct PatternRegistry {
    sites: Vec<(String, SitePattern)>,
    default: SitePattern,
}

impl PatternRegistry {
    /// Builds the registry of known retailers
    ///
    /// The default entry carries the generic product heuristics (`/product/`,
    /// `/item/`, `/p/`, `/products?/`, `/shop/`, and a 4-8 digit ID run);
    /// retailer entries override them with site-specific shapes.
    pub fn builtin() -> Result<Self, regex::Error> {
        let sites = vec![
            (
                "amazon".to_string(),
                SitePattern::new(&[r"/dp/", r"/gp/product/"], &[r"[?&]page=\d+"], false)?,
            ),
            (
                "ebay".to_string(),
                SitePattern::new(&[r"/itm/"], &[r"[?&]_pgn=\d+"], false)?,
            ),
            (
                "etsy".to_string(),
                SitePattern::new(&[r"/listing/\d+"], &[r"[?&]page=\d+"], false)?,
            ),
            (
                "target".to_string(),
                SitePattern::new(&[r"/p/"], &[r"[?&]nao=\d+"], false)?,
            ),
            (
                "argos".to_string(),
                SitePattern::new(&[r"/product/\d+"], &[r"/page:\d+"], false)?,
            ),
            (
                "hm.com".to_string(),
                SitePattern::new(&[r"productpage\.\d+"], &[r"[?&]page=\d+"], false)?,
            ),
            // Zara ships an empty shell without JavaScript; the fetcher must
            // go through the renderer for anything useful.
            (
                "zara".to_string(),
                SitePattern::new(&[r"-p\d+\.html"], &[r"[?&]page=\d+"], true)?,
            ),
        ];

        let default = SitePattern::new(
            &[r"/product/", r"/item/", r"/p/", r"/products?/", r"/shop/", r"\d{4,8}"],
            &[r"[?&]page=\d+", r"[?&]p=\d+", r"/page/\d+"],
            false,
        )?;

        Ok(Self { sites, default })
    }

    /// Looks up the pattern set for a domain
    ///
    /// First registry entry whose identifier is contained in the domain wins;
    /// unknown domains get the default entry. Pure, no failure mode.
    pub fn lookup(&self, domain: &str) -> &SitePattern {
        let domain = domain.to_ascii_lowercase();
        self.sites
            .iter()
            .find(|(key, _)| domain.contains(key.as_str()))
            .map(|(_, pattern)| pattern)
            .unwrap_or(&self.default)
    }
}
