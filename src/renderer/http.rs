//! Plain HTTP renderer for pages that do not need JavaScript.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::{FetchError, Renderer};
use crate::utils::HttpClient;

/// Fetches raw server HTML with a GET request.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: HttpClient,
    timeout: Duration,
}

impl HttpRenderer {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = HttpClient::with_settings(user_agent, timeout)
            .map_err(|e| FetchError::Browser(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    fn name(&self) -> &str {
        "http"
    }

    async fn render(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .client()
            .get(url)
            .header("Accept", "text/html")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout {
                        url: url.to_string(),
                        seconds: self.timeout.as_secs(),
                    }
                } else {
                    FetchError::navigation(url, e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::navigation(url, format!("failed to read body: {}", e)))?;

        debug!(url, bytes = body.len(), "Fetched page");
        Ok(body)
    }
}
