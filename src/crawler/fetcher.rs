//! HTTP fetcher
//!
//! One logical fetch per page: renderer delegation for rendering-required
//! domains, an HTTP GET with timeouts and redirect following otherwise,
//! retry-with-backoff on retryable statuses and network errors, and manual
//! body decoding. Errors come back as typed values for the engine to match
//! on; nothing here panics or aborts the crawl.

use crate::crawler::decode::{charset_from_content_type, decode_body, DecodeError};
use crate::crawler::headers::HeaderFactory;
use crate::crawler::retry::RetryPolicy;
use crate::patterns::PatternRegistry;
use crate::render::Renderer;
use crate::stats::StatsCollector;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Why a logical fetch was abandoned
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("decode error for {url}: {source}")]
    Decode { url: String, source: DecodeError },
}

/// Builds the shared HTTP client
///
/// Automatic decompression stays off so the decode step can observe
/// `Content-Encoding` itself. The pool's per-host idle cap tracks the
/// configured concurrency limit.
pub fn build_http_client(concurrency_limit: u32) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .pool_max_idle_per_host(concurrency_limit as usize)
        .build()
}

/// Fetches pages for the crawl engines
pub struct Fetcher {
    client: Client,
    headers: Arc<HeaderFactory>,
    policy: RetryPolicy,
    registry: Arc<PatternRegistry>,
    renderer: Option<Arc<dyn Renderer>>,
    stats: Arc<StatsCollector>,
}

impl Fetcher {
    pub fn new(
        client: Client,
        headers: Arc<HeaderFactory>,
        policy: RetryPolicy,
        registry: Arc<PatternRegistry>,
        renderer: Option<Arc<dyn Renderer>>,
        stats: Arc<StatsCollector>,
    ) -> Self {
        Self {
            client,
            headers,
            policy,
            registry,
            renderer,
            stats,
        }
    }

    /// Fetches one URL and returns its decoded body text
    ///
    /// The request counter ticks once per underlying network attempt
    /// (renderer calls and retries included); the success/failure counters
    /// tick exactly once per call.
    pub async fn fetch(&self, url: &str, domain: &str) -> Result<String, FetchError> {
        if let Some(renderer) = self.renderer_for(domain) {
            self.stats.record_request();
            match renderer.render(url).await {
                Ok(html) if !html.is_empty() => {
                    self.stats.record_success();
                    return Ok(html);
                }
                Ok(_) => {
                    tracing::debug!("renderer returned empty content for {}, using HTTP", url)
                }
                Err(e) => tracing::warn!("{}, falling back to HTTP", e),
            }
        }

        self.fetch_http(url, domain).await
    }

    /// The renderer, when this domain needs one and rendering is enabled
    fn renderer_for(&self, domain: &str) -> Option<&Arc<dyn Renderer>> {
        let renderer = self.renderer.as_ref()?;
        self.registry
            .lookup(domain)
            .requires_rendering()
            .then_some(renderer)
    }

    async fn fetch_http(&self, url: &str, domain: &str) -> Result<String, FetchError> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.stats.record_request();

            let response = self
                .client
                .get(url)
                .headers(self.headers.build(domain))
                .send()
                .await;

            let response = match response {
                Ok(response) => response,
                Err(e) => {
                    if self.policy.should_retry(attempt) {
                        let delay = self.policy.backoff_for(attempt);
                        tracing::debug!(
                            "request error for {} ({}), retrying in {:?} (attempt {}/{})",
                            url,
                            e,
                            delay,
                            attempt,
                            self.policy.max_attempts
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    self.stats.record_failure();
                    return Err(classify_request_error(url, e));
                }
            };

            let status = response.status().as_u16();

            if response.status().is_success() {
                let content_encoding = response
                    .headers()
                    .get(CONTENT_ENCODING)
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v.to_string());
                let charset = charset_from_content_type(
                    response
                        .headers()
                        .get(CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok()),
                );

                let raw = match response.bytes().await {
                    Ok(raw) => raw,
                    Err(e) => {
                        // Body read failures are network errors and retry
                        // like any other
                        if self.policy.should_retry(attempt) {
                            tokio::time::sleep(self.policy.backoff_for(attempt)).await;
                            continue;
                        }
                        self.stats.record_failure();
                        return Err(classify_request_error(url, e));
                    }
                };

                return match decode_body(&raw, content_encoding.as_deref(), charset.as_deref()) {
                    Ok(text) => {
                        self.stats.record_success();
                        Ok(text)
                    }
                    Err(source) => {
                        self.stats.record_failure();
                        Err(FetchError::Decode {
                            url: url.to_string(),
                            source,
                        })
                    }
                };
            }

            if self.policy.is_retryable(status) && self.policy.should_retry(attempt) {
                let delay = self.policy.backoff_for(attempt);
                tracing::debug!(
                    "HTTP {} from {}, retrying in {:?} (attempt {}/{})",
                    status,
                    url,
                    delay,
                    attempt,
                    self.policy.max_attempts
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            self.stats.record_failure();
            tracing::warn!("HTTP {} from {}, abandoning fetch", status, url);
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
    }
}

fn classify_request_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
