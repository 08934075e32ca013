use crate::config::types::{Config, CrawlerConfig, OutputConfig, RetryConfig};
use crate::domain::root_url;
use crate::ConfigError;
use reqwest::header::{HeaderName, HeaderValue};

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_domains(&config.domains)?;
    validate_crawler_config(&config.crawler)?;
    validate_retry_config(&config.retry)?;
    validate_output_config(&config.output)?;
    validate_headers(config)?;
    Ok(())
}

/// Validates the domain list
fn validate_domains(domains: &[String]) -> Result<(), ConfigError> {
    if domains.is_empty() {
        return Err(ConfigError::Validation(
            "at least one domain must be configured".to_string(),
        ));
    }

    for domain in domains {
        let url = root_url(domain).map_err(|e| {
            ConfigError::Validation(format!("invalid domain '{}': {}", domain, e))
        })?;

        if url.host_str().is_none() {
            return Err(ConfigError::Validation(format!(
                "domain '{}' has no host",
                domain
            )));
        }
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency_limit < 1 || config.concurrency_limit > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency-limit must be between 1 and 100, got {}",
            config.concurrency_limit
        )));
    }

    let [min, max] = config.delay_range_ms;
    if min > max {
        return Err(ConfigError::Validation(format!(
            "delay-range-ms minimum ({}) exceeds maximum ({})",
            min, max
        )));
    }

    if config.domain_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "domain-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates retry configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(
            "max-attempts must be >= 1".to_string(),
        ));
    }

    if config.backoff_factor < 1.0 {
        return Err(ConfigError::Validation(format!(
            "backoff-factor must be >= 1.0, got {}",
            config.backoff_factor
        )));
    }

    if config.max_delay_ms < config.start_delay_ms {
        return Err(ConfigError::Validation(format!(
            "max-delay-ms ({}) must be >= start-delay-ms ({})",
            config.max_delay_ms, config.start_delay_ms
        )));
    }

    for status in &config.retryable_statuses {
        if !(100..=599).contains(status) {
            return Err(ConfigError::Validation(format!(
                "retryable status {} is not a valid HTTP status code",
                status
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.results_path.is_empty() {
        return Err(ConfigError::Validation(
            "results-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the custom header overlay and user-agent pool
///
/// Header problems surface here rather than mid-crawl inside the request
/// path.
fn validate_headers(config: &Config) -> Result<(), ConfigError> {
    for (name, value) in &config.headers {
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            ConfigError::Validation(format!("invalid header name '{}'", name))
        })?;
        HeaderValue::from_str(value).map_err(|_| {
            ConfigError::Validation(format!("invalid value for header '{}'", name))
        })?;
    }

    for ua in &config.user_agents {
        HeaderValue::from_str(ua).map_err(|_| {
            ConfigError::Validation(format!("invalid user-agent string '{}'", ua))
        })?;
    }

    Ok(())
}
