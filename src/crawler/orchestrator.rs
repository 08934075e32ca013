//! Domain orchestration
//!
//! Builds the shared collaborators once (HTTP client, header factory,
//! pattern registry, stats collector, optional renderer), runs one crawl
//! engine per configured domain concurrently, and aggregates the results.
//! Every domain gets its own deadline; a domain that times out contributes
//! whatever it had discovered by then, and no domain failure can remove
//! another domain from the final mapping.

use crate::config::Config;
use crate::crawler::engine::CrawlEngine;
use crate::crawler::fetcher::{build_http_client, Fetcher};
use crate::crawler::headers::HeaderFactory;
use crate::crawler::retry::RetryPolicy;
use crate::domain::DomainTarget;
use crate::patterns::PatternRegistry;
use crate::render::{ChromeRenderer, Renderer};
use crate::stats::{StatsCollector, StatsSnapshot};
use crate::CrawlError;
use reqwest::Client;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Runs the crawl across every configured domain
pub struct Orchestrator {
    config: Arc<Config>,
    client: Client,
    headers: Arc<HeaderFactory>,
    registry: Arc<PatternRegistry>,
    renderer: Option<Arc<dyn Renderer>>,
    stats: Arc<StatsCollector>,
}

impl Orchestrator {
    /// Creates an orchestrator and its shared collaborators
    pub fn new(config: Config) -> Result<Self, CrawlError> {
        let client = build_http_client(config.crawler.concurrency_limit)?;
        let headers = Arc::new(HeaderFactory::new(&config));
        let registry = Arc::new(PatternRegistry::builtin()?);
        let renderer: Option<Arc<dyn Renderer>> = if config.crawler.use_rendering {
            Some(Arc::new(ChromeRenderer::new()))
        } else {
            None
        };

        Ok(Self {
            config: Arc::new(config),
            client,
            headers,
            registry,
            renderer,
            stats: Arc::new(StatsCollector::new()),
        })
    }

    /// Replaces the renderer (used by tests to inject a stub)
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// The run's statistics collector
    pub fn stats(&self) -> Arc<StatsCollector> {
        Arc::clone(&self.stats)
    }

    /// Crawls every configured domain and returns domain -> product URLs
    ///
    /// The mapping always contains one entry per configured domain; timed-out
    /// domains report their partial results, and a panicked domain task
    /// reports an empty list.
    pub async fn discover(&self) -> Result<BTreeMap<String, Vec<String>>, CrawlError> {
        self.stats.mark_start();

        let deadline = Duration::from_secs(self.config.crawler.domain_timeout_secs);
        let mut handles = Vec::new();

        for raw in &self.config.domains {
            let target = DomainTarget::parse(raw)?;
            let engine = CrawlEngine::new(
                target,
                &self.config.crawler,
                Fetcher::new(
                    self.client.clone(),
                    Arc::clone(&self.headers),
                    RetryPolicy::from_config(&self.config.retry),
                    Arc::clone(&self.registry),
                    self.renderer.clone(),
                    Arc::clone(&self.stats),
                ),
                Arc::clone(&self.registry),
            );

            let handle = tokio::spawn(async move {
                match tokio::time::timeout(deadline, engine.run()).await {
                    Ok(products) => products,
                    Err(_) => {
                        tracing::warn!(
                            "crawl of {} timed out after {:?}, keeping partial results",
                            engine.domain_key(),
                            deadline
                        );
                        engine.collected_products()
                    }
                }
            });
            handles.push((raw.clone(), handle));
        }

        let mut results = BTreeMap::new();
        for (domain, handle) in handles {
            let products = match handle.await {
                Ok(products) => products,
                Err(e) => {
                    tracing::error!("crawl task for {} failed: {}", domain, e);
                    Vec::new()
                }
            };
            results.insert(domain, products);
        }

        self.stats.mark_finished();
        Ok(results)
    }
}

/// Runs a complete discovery pass for a configuration
///
/// This is the main library entry point: it builds an orchestrator, crawls
/// every domain, and returns the results alongside the run statistics.
///
/// # Example
///
/// ```no_run
/// use shopcrawl::config::load_config;
/// use shopcrawl::crawler::run_discovery;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let (results, stats) = run_discovery(config).await?;
/// for (domain, urls) in &results {
///     println!("{}: {} product URLs", domain, urls.len());
/// }
/// println!("{} requests total", stats.requests);
/// # Ok(())
/// # }
/// ```
pub async fn run_discovery(
    config: Config,
) -> Result<(BTreeMap<String, Vec<String>>, StatsSnapshot), CrawlError> {
    let orchestrator = Orchestrator::new(config)?;
    let results = orchestrator.discover().await?;
    let snapshot = orchestrator.stats().snapshot();
    Ok((results, snapshot))
}
