use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for shopcrawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Domains to crawl, as bare hosts or full origins
    pub domains: Vec<String>,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub output: OutputConfig,

    /// Custom header overlay; these win over every built-in header
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Replacement user-agent pool; empty means the built-in pool
    #[serde(default, rename = "user-agents")]
    pub user_agents: Vec<String>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum depth to crawl from each domain root
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of concurrent fetches per domain
    #[serde(rename = "concurrency-limit")]
    pub concurrency_limit: u32,

    /// Inclusive bounds for the randomized pre-fetch delay (milliseconds)
    #[serde(rename = "delay-range-ms")]
    pub delay_range_ms: [u64; 2],

    /// Per-domain crawl deadline (seconds)
    #[serde(rename = "domain-timeout-secs")]
    pub domain_timeout_secs: u64,

    /// Pick a random user-agent per request instead of a fixed one
    #[serde(rename = "rotate-user-agents")]
    pub rotate_user_agents: bool,

    /// Route rendering-required domains through the headless renderer
    #[serde(rename = "use-rendering")]
    pub use_rendering: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            concurrency_limit: 8,
            delay_range_ms: [2000, 5000],
            domain_timeout_secs: 300,
            rotate_user_agents: true,
            use_rendering: false,
        }
    }
}

/// Retry behavior for retryable fetch failures
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total network attempts per fetch, including the first
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Backoff before the first retry (milliseconds)
    #[serde(rename = "start-delay-ms")]
    pub start_delay_ms: u64,

    /// Backoff ceiling (milliseconds)
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,

    /// Multiplier applied per retry
    #[serde(rename = "backoff-factor")]
    pub backoff_factor: f64,

    /// HTTP status codes worth retrying
    #[serde(rename = "retryable-statuses")]
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            start_delay_ms: 1000,
            max_delay_ms: 10_000,
            backoff_factor: 2.0,
            retryable_statuses: vec![500, 502, 503, 504],
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the JSON results file
    #[serde(rename = "results-path")]
    pub results_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_path: "./product_urls.json".to_string(),
        }
    }
}
