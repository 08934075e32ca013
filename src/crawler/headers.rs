//! Per-request header construction
//!
//! Every request carries a fixed browser-like baseline, a user-agent (rotated
//! from a pool when enabled), a Referer pointing at the crawled domain, the
//! caller's custom overlay (which wins over everything), and a monotonically
//! advancing request timestamp.

use crate::config::Config;
use chrono::Utc;
use rand::seq::SliceRandom;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use std::sync::atomic::{AtomicI64, Ordering};

/// Fallback user-agent when the pool is empty or a pool entry is unusable
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Built-in rotation pool of common desktop browser user-agents
const USER_AGENT_POOL: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
];

/// Builds header sets for outgoing requests
#[derive(Debug)]
pub struct HeaderFactory {
    rotate_user_agents: bool,
    user_agents: Vec<String>,
    custom: Vec<(HeaderName, HeaderValue)>,
    last_timestamp: AtomicI64,
}

impl HeaderFactory {
    /// Creates a factory from the run configuration
    ///
    /// Custom headers were validated at config load; anything that still
    /// fails to parse is skipped with a warning rather than aborting
    /// requests.
    pub fn new(config: &Config) -> Self {
        let user_agents = if config.user_agents.is_empty() {
            USER_AGENT_POOL.iter().map(|s| s.to_string()).collect()
        } else {
            config.user_agents.clone()
        };

        let custom = config
            .headers
            .iter()
            .filter_map(|(name, value)| {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|_| tracing::warn!("skipping invalid header name '{}'", name))
                    .ok()?;
                let value = HeaderValue::from_str(value)
                    .map_err(|_| tracing::warn!("skipping invalid value for header '{}'", name))
                    .ok()?;
                Some((name, value))
            })
            .collect();

        Self {
            rotate_user_agents: config.crawler.rotate_user_agents,
            user_agents,
            custom,
            last_timestamp: AtomicI64::new(0),
        }
    }

    /// Builds the header set for one request against `domain`
    pub fn build(&self, domain: &str) -> HeaderMap {
        let mut headers = baseline_headers();

        headers.insert(header::USER_AGENT, self.pick_user_agent());

        if let Ok(referer) = HeaderValue::from_str(&format!("https://{}", domain)) {
            headers.insert(header::REFERER, referer);
        }

        // Caller overlay wins over every default
        for (name, value) in &self.custom {
            headers.insert(name.clone(), value.clone());
        }

        headers.insert(
            HeaderName::from_static("x-request-timestamp"),
            HeaderValue::from(self.next_timestamp()),
        );

        headers
    }

    fn pick_user_agent(&self) -> HeaderValue {
        let chosen = if self.rotate_user_agents {
            self.user_agents
                .choose(&mut rand::thread_rng())
                .map(String::as_str)
                .unwrap_or(DEFAULT_USER_AGENT)
        } else {
            DEFAULT_USER_AGENT
        };

        HeaderValue::from_str(chosen)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT))
    }

    /// Yields wall-clock millis, strictly increasing across calls
    fn next_timestamp(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let prev = self
            .last_timestamp
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |prev| {
                Some((prev + 1).max(now))
            })
            .unwrap_or(now);
        (prev + 1).max(now)
    }
}

/// The fixed browser-like baseline every request starts from
fn baseline_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert(
        header::ACCEPT_ENCODING,
        HeaderValue::from_static("gzip, deflate, br"),
    );
    headers.insert(header::DNT, HeaderValue::from_static("1"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("document"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("navigate"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("none"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-user"),
        HeaderValue::from_static("?1"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CrawlerConfig, OutputConfig, RetryConfig};
    use std::collections::BTreeMap;

    fn config_with(headers: BTreeMap<String, String>, user_agents: Vec<String>) -> Config {
        Config {
            domains: vec!["shop.example.com".to_string()],
            crawler: CrawlerConfig::default(),
            retry: RetryConfig::default(),
            output: OutputConfig::default(),
            headers,
            user_agents,
        }
    }

    #[test]
    fn test_baseline_headers_present() {
        let factory = HeaderFactory::new(&config_with(Default::default(), vec![]));
        let headers = factory.build("shop.example.com");

        assert!(headers.contains_key(header::ACCEPT));
        assert_eq!(
            headers.get(header::ACCEPT_ENCODING).unwrap(),
            "gzip, deflate, br"
        );
        assert_eq!(headers.get(header::DNT).unwrap(), "1");
        assert_eq!(headers.get("sec-fetch-mode").unwrap(), "navigate");
        assert!(headers.contains_key(header::USER_AGENT));
    }

    #[test]
    fn test_referer_points_at_domain() {
        let factory = HeaderFactory::new(&config_with(Default::default(), vec![]));
        let headers = factory.build("shop.example.com");

        assert_eq!(
            headers.get(header::REFERER).unwrap(),
            "https://shop.example.com"
        );
    }

    #[test]
    fn test_custom_headers_win_over_defaults() {
        let mut custom = BTreeMap::new();
        custom.insert("accept-language".to_string(), "de-DE".to_string());
        custom.insert("x-api-key".to_string(), "secret".to_string());

        let factory = HeaderFactory::new(&config_with(custom, vec![]));
        let headers = factory.build("shop.example.com");

        assert_eq!(headers.get(header::ACCEPT_LANGUAGE).unwrap(), "de-DE");
        assert_eq!(headers.get("x-api-key").unwrap(), "secret");
    }

    #[test]
    fn test_rotation_uses_configured_pool() {
        let factory = HeaderFactory::new(&config_with(
            Default::default(),
            vec!["TestAgent/1.0".to_string()],
        ));
        let headers = factory.build("shop.example.com");

        assert_eq!(headers.get(header::USER_AGENT).unwrap(), "TestAgent/1.0");
    }

    #[test]
    fn test_rotation_disabled_uses_default() {
        let mut config = config_with(Default::default(), vec!["TestAgent/1.0".to_string()]);
        config.crawler.rotate_user_agents = false;

        let factory = HeaderFactory::new(&config);
        let headers = factory.build("shop.example.com");

        assert_eq!(headers.get(header::USER_AGENT).unwrap(), DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_timestamps_strictly_increase() {
        let factory = HeaderFactory::new(&config_with(Default::default(), vec![]));

        let stamps: Vec<i64> = (0..50)
            .map(|_| {
                factory
                    .build("shop.example.com")
                    .get("x-request-timestamp")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
                    .unwrap()
            })
            .collect();

        for pair in stamps.windows(2) {
            assert!(pair[1] > pair[0], "timestamps must strictly increase");
        }
    }
}
