//! Shopcrawl: a product URL discovery crawler for e-commerce domains
//!
//! This crate crawls a set of retail domains up to a bounded depth, classifies
//! links against retailer-specific URL patterns, and reports the discovered
//! product URLs per domain.

pub mod config;
pub mod crawler;
pub mod domain;
pub mod output;
pub mod patterns;
pub mod render;
pub mod stats;

use thiserror::Error;

/// Main error type for shopcrawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid domain '{domain}': {message}")]
    InvalidDomain { domain: String, message: String },

    #[error("Invalid site pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for shopcrawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Orchestrator, RetryPolicy};
pub use patterns::{PatternRegistry, SitePattern};
pub use stats::{StatsCollector, StatsSnapshot};
