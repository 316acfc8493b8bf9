//! Mock renderer for testing purposes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{FetchError, Renderer};

/// A renderer that serves predefined pages.
///
/// Unknown URLs fail with [`FetchError::Navigation`], which makes it easy to
/// exercise the fetch-failure policy.
#[derive(Debug, Default)]
pub struct MockRenderer {
    pages: HashMap<String, String>,
    visited: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl MockRenderer {
    /// Create a new mock renderer with no pages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` for `url`.
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    /// URLs rendered so far, in call order.
    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }

    /// Whether [`Renderer::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Renderer for MockRenderer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn render(&self, url: &str) -> Result<String, FetchError> {
        if self.is_closed() {
            return Err(FetchError::Browser("renderer already closed".to_string()));
        }
        self.visited.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::navigation(url, "no such page"))
    }

    async fn close(&mut self) -> Result<(), FetchError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
