//! Crawler module
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry/backoff and manual body decoding
//! - Per-request header construction
//! - Link extraction and trap filtering
//! - Per-domain depth-bounded traversal
//! - Cross-domain orchestration

mod decode;
mod engine;
mod extractor;
mod fetcher;
mod headers;
mod orchestrator;
mod retry;

pub use decode::{charset_from_content_type, decode_body, decode_text, DecodeError};
pub use engine::CrawlEngine;
pub use extractor::{extract_links, filter_links, FilteredLinks};
pub use fetcher::{build_http_client, FetchError, Fetcher};
pub use headers::{HeaderFactory, DEFAULT_USER_AGENT};
pub use orchestrator::{run_discovery, Orchestrator};
pub use retry::RetryPolicy;
