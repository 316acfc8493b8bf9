//! Page renderers that turn a URL into HTML.
//!
//! The listing and article pages load part of their content with JavaScript,
//! so the default renderer drives a headless Chromium ([`ChromeRenderer`],
//! feature `browser`). [`HttpRenderer`] performs a plain GET for sites that
//! serve complete markup, and [`MockRenderer`] serves canned pages in tests.
//!
//! Every call to [`Renderer::render`] opens one rendering context, waits for
//! the page to settle, captures the document and closes the context again,
//! on the error path as well.

#[cfg(feature = "browser")]
mod chrome;
mod http;
pub mod mock;

#[cfg(feature = "browser")]
pub use chrome::ChromeRenderer;
pub use http::HttpRenderer;
pub use mock::MockRenderer;

use async_trait::async_trait;
use std::time::Duration;

use crate::config::{RendererKind, ScrapeConfig};

/// Navigation and settle timing for a renderer
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Upper bound for navigation plus network-idle wait
    pub navigation_timeout: Duration,
    /// How long the document must stay unchanged when the browser reports no
    /// network idle event
    pub idle_window: Duration,
    /// Run the browser without a visible window
    pub headless: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(30),
            idle_window: Duration::from_millis(500),
            headless: true,
        }
    }
}

impl RenderOptions {
    /// Build options from the scrape configuration
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self {
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
            idle_window: Duration::from_millis(config.idle_window_ms),
            headless: config.headless,
        }
    }
}

/// Something that can fetch a fully rendered page.
#[async_trait]
pub trait Renderer: Send + Sync + std::fmt::Debug {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Navigate to `url`, wait for the network to go idle and return the
    /// rendered document HTML.
    async fn render(&self, url: &str) -> Result<String, FetchError>;

    /// Release the underlying browser or connection pool.
    async fn close(&mut self) -> Result<(), FetchError> {
        Ok(())
    }
}

/// Create the renderer selected in the configuration
pub async fn from_config(config: &ScrapeConfig) -> Result<Box<dyn Renderer>, FetchError> {
    let options = RenderOptions::from_config(config);
    match config.renderer {
        #[cfg(feature = "browser")]
        RendererKind::Chrome => Ok(Box::new(ChromeRenderer::launch(options).await?)),
        #[cfg(not(feature = "browser"))]
        RendererKind::Chrome => Err(FetchError::Browser(
            "built without the `browser` feature; use renderer = \"http\"".to_string(),
        )),
        RendererKind::Http => Ok(Box::new(HttpRenderer::new(
            &config.user_agent,
            options.navigation_timeout,
        )?)),
    }
}

/// Errors raised while fetching a page
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Navigation failed (DNS, connection, protocol, unknown page)
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// The page did not finish loading in time
    #[error("timed out after {seconds}s waiting for {url} to load")]
    Timeout { url: String, seconds: u64 },

    /// Server answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Browser could not be launched or stopped
    #[error("browser error: {0}")]
    Browser(String),
}

impl FetchError {
    /// URL of the page that failed, if the error is tied to one
    pub fn url(&self) -> Option<&str> {
        match self {
            FetchError::Navigation { url, .. }
            | FetchError::Timeout { url, .. }
            | FetchError::Status { url, .. } => Some(url),
            FetchError::Browser(_) => None,
        }
    }

    pub(crate) fn navigation(url: &str, reason: impl std::fmt::Display) -> Self {
        FetchError::Navigation {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
