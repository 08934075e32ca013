//! Headless rendering
//!
//! Some retail sites ship an empty HTML shell and build the page in
//! JavaScript; for those the fetcher goes through a [`Renderer`] instead of a
//! plain GET. The trait keeps the crawler decoupled from any particular
//! browser backend, and tests substitute their own implementation.

use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions};
use thiserror::Error;

/// A rendering attempt that did not produce usable HTML
#[derive(Debug, Error)]
#[error("render failed for {url}: {message}")]
pub struct RenderError {
    pub url: String,
    pub message: String,
}

impl RenderError {
    fn new(url: &str, message: impl std::fmt::Display) -> Self {
        Self {
            url: url.to_string(),
            message: message.to_string(),
        }
    }
}

/// Produces fully rendered HTML for a URL
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<String, RenderError>;
}

/// Renderer backed by a headless Chrome session
///
/// Each render launches its own browser session and tears it down when the
/// call returns, on success and failure alike; nothing is shared between
/// fetches.
#[derive(Debug, Default)]
pub struct ChromeRenderer;

impl ChromeRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn render(&self, url: &str) -> Result<String, RenderError> {
        let target = url.to_string();

        // headless_chrome drives the browser over a blocking protocol;
        // keep it off the async worker threads.
        let rendered = tokio::task::spawn_blocking(move || render_with_chrome(&target)).await;

        match rendered {
            Ok(result) => result,
            Err(e) => Err(RenderError::new(url, format!("render task failed: {}", e))),
        }
    }
}

fn render_with_chrome(url: &str) -> Result<String, RenderError> {
    let browser = Browser::new(LaunchOptions {
        headless: true,
        ..Default::default()
    })
    .map_err(|e| RenderError::new(url, e))?;

    let tab = browser.new_tab().map_err(|e| RenderError::new(url, e))?;
    tab.navigate_to(url).map_err(|e| RenderError::new(url, e))?;
    tab.wait_until_navigated()
        .map_err(|e| RenderError::new(url, e))?;

    tab.get_content().map_err(|e| RenderError::new(url, e))
    // Browser drops here, closing the session on every exit path
}
