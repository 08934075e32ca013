//! Per-domain crawl engine
//!
//! Depth-bounded recursive traversal over one domain. Each page is claimed in
//! the visited set before it is fetched (one atomic check-and-insert under
//! the set's lock), so racing sibling branches can never dispatch the same
//! URL twice. Children of a page are crawled as one unordered group and
//! awaited together; concurrency across the whole tree is bounded by an
//! explicit semaphore rather than the shape of the recursion. The entire
//! tree lives inside one future, so dropping it (domain timeout) cancels all
//! in-flight and pending work at the next suspension point.

use crate::config::CrawlerConfig;
use crate::crawler::extractor::{extract_links, filter_links};
use crate::crawler::fetcher::Fetcher;
use crate::domain::DomainTarget;
use crate::patterns::PatternRegistry;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use rand::Rng;
use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

/// Crawls a single domain and accumulates its product URLs
pub struct CrawlEngine {
    target: DomainTarget,
    max_depth: u32,
    delay_range_ms: [u64; 2],
    fetcher: Fetcher,
    registry: Arc<PatternRegistry>,
    semaphore: Semaphore,
    visited: Mutex<HashSet<String>>,
    products: Mutex<BTreeSet<String>>,
}

impl CrawlEngine {
    pub fn new(
        target: DomainTarget,
        config: &CrawlerConfig,
        fetcher: Fetcher,
        registry: Arc<PatternRegistry>,
    ) -> Self {
        Self {
            target,
            max_depth: config.max_depth,
            delay_range_ms: config.delay_range_ms,
            fetcher,
            registry,
            semaphore: Semaphore::new(config.concurrency_limit as usize),
            visited: Mutex::new(HashSet::new()),
            products: Mutex::new(BTreeSet::new()),
        }
    }

    /// The configured domain string this engine reports under
    pub fn domain_key(&self) -> &str {
        &self.target.raw
    }

    /// Runs the crawl to completion and returns the discovered product URLs
    pub async fn run(&self) -> Vec<String> {
        tracing::info!(
            "crawling {} (max depth {})",
            self.target.host,
            self.max_depth
        );

        self.crawl_page(self.target.root.clone(), 0).await;

        let products = self.collected_products();
        tracing::info!(
            "{}: {} product URLs, {} pages visited",
            self.target.host,
            products.len(),
            self.visited.lock().unwrap().len()
        );
        products
    }

    /// The product URLs accumulated so far, sorted
    ///
    /// Safe to call while the crawl is still running; the orchestrator uses
    /// this to keep partial results when a domain times out.
    pub fn collected_products(&self) -> Vec<String> {
        self.products.lock().unwrap().iter().cloned().collect()
    }

    /// Crawls one page and recurses over its filtered links
    fn crawl_page(&self, url: Url, depth: u32) -> BoxFuture<'_, ()> {
        async move {
            if depth > self.max_depth {
                return;
            }

            // Claim the URL before fetching; losing this race means a
            // sibling already owns the page.
            if !self.visited.lock().unwrap().insert(url.to_string()) {
                return;
            }

            let body = {
                let _permit = match self.semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };
                self.pause_before_fetch().await;
                self.fetcher.fetch(url.as_str(), &self.target.host).await
            };

            let pattern = self.registry.lookup(&self.target.host);

            // The URL classifies on its own shape, whether or not the fetch
            // produced content.
            if pattern.is_product(&url) {
                tracing::info!("found product URL: {}", url);
                self.products.lock().unwrap().insert(url.to_string());
            }

            let html = match body {
                Ok(html) => html,
                Err(e) => {
                    // Terminal for this branch only; siblings are unaffected
                    tracing::warn!("abandoning branch at depth {}: {}", depth, e);
                    return;
                }
            };

            let links = extract_links(&url, &html);
            let filtered = filter_links(links, pattern);
            if filtered.is_empty() {
                return;
            }

            tracing::debug!(
                "{}: {} pagination / {} candidate links at depth {}",
                url,
                filtered.pagination.len(),
                filtered.candidates.len(),
                depth
            );

            let children: Vec<_> = filtered
                .into_urls()
                .map(|link| self.crawl_page(link, depth + 1))
                .collect();
            join_all(children).await;
        }
        .boxed()
    }

    /// Sleeps for a random duration inside the configured delay range
    async fn pause_before_fetch(&self) {
        let [min, max] = self.delay_range_ms;
        if max == 0 {
            return;
        }
        let wait = if min >= max {
            min
        } else {
            rand::thread_rng().gen_range(min..=max)
        };
        tokio::time::sleep(Duration::from_millis(wait)).await;
    }
}
