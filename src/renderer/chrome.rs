//! Headless Chromium renderer built on chromiumoxide.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    EventLifecycleEvent, SetLifecycleEventsEnabledParams,
};
use chromiumoxide::listeners::EventStream;
use chromiumoxide::Page;
use futures_util::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{FetchError, RenderOptions, Renderer};

/// Renderer backed by a Chromium process.
///
/// One browser is launched per run; each [`Renderer::render`] call opens and
/// closes its own tab.
pub struct ChromeRenderer {
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
    options: RenderOptions,
}

impl std::fmt::Debug for ChromeRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromeRenderer")
            .field("running", &self.browser.is_some())
            .field("options", &self.options)
            .finish()
    }
}

impl ChromeRenderer {
    /// Launch Chromium and start its event loop
    pub async fn launch(options: RenderOptions) -> Result<Self, FetchError> {
        let mut builder = BrowserConfig::builder().request_timeout(options.navigation_timeout);
        if !options.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(FetchError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::Browser(format!("failed to launch Chromium: {}", e)))?;

        // The handler stream must be polled for the browser to make progress.
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler stopped: {}", e);
                    break;
                }
            }
        });

        debug!(headless = options.headless, "Chromium launched");

        Ok(Self {
            browser: Some(browser),
            handler: Some(handle),
            options,
        })
    }

    async fn load(&self, page: &Page, url: &str) -> Result<String, FetchError> {
        page.execute(SetLifecycleEventsEnabledParams::new(true))
            .await
            .map_err(|e| FetchError::navigation(url, e))?;
        // Subscribe before navigating so no lifecycle event is missed
        let mut lifecycle = page
            .event_listener::<EventLifecycleEvent>()
            .await
            .map_err(|e| FetchError::navigation(url, e))?;

        page.goto(url)
            .await
            .map_err(|e| FetchError::navigation(url, e))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| FetchError::navigation(url, e))?;

        let main_frame = page
            .mainframe()
            .await
            .map_err(|e| FetchError::navigation(url, e))?;

        if wait_for_network_idle(&mut lifecycle, main_frame.as_ref().map(|f| f.inner().as_str()))
            .await
        {
            return page
                .content()
                .await
                .map_err(|e| FetchError::navigation(url, e));
        }

        debug!(url, "Lifecycle events ended before network idle, polling the document");
        wait_for_stable_content(page, url, self.options.idle_window).await
    }
}

/// Lifecycle event Chromium emits once a document has had no network
/// connections for 500ms.
const NETWORK_IDLE: &str = "networkIdle";
/// Lifecycle event that starts a new document and its loader.
const LIFECYCLE_INIT: &str = "init";

/// Tracks lifecycle events until the main frame's current document is idle.
///
/// Events for other frames, and a `networkIdle` left over from an earlier
/// document, are ignored.
#[derive(Debug, Default)]
struct IdleTracker {
    main_frame: Option<String>,
    loader: Option<String>,
}

impl IdleTracker {
    fn new(main_frame: Option<&str>) -> Self {
        Self {
            main_frame: main_frame.map(str::to_string),
            loader: None,
        }
    }

    /// Feed one event; true once network idle is reached
    fn observe(&mut self, frame_id: &str, loader_id: &str, name: &str) -> bool {
        if self.main_frame.as_deref().is_some_and(|main| main != frame_id) {
            return false;
        }
        match name {
            LIFECYCLE_INIT => {
                self.loader = Some(loader_id.to_string());
                false
            }
            NETWORK_IDLE => self.loader.as_deref() == Some(loader_id),
            _ => false,
        }
    }
}

/// Returns false if the event stream ends before network idle.
async fn wait_for_network_idle(
    events: &mut EventStream<EventLifecycleEvent>,
    main_frame: Option<&str>,
) -> bool {
    let mut tracker = IdleTracker::new(main_frame);
    while let Some(event) = events.next().await {
        if tracker.observe(event.frame_id.inner(), event.loader_id.inner(), &event.name) {
            return true;
        }
    }
    false
}

/// Poll the document until it stops changing for `window`.
async fn wait_for_stable_content(
    page: &Page,
    url: &str,
    window: Duration,
) -> Result<String, FetchError> {
    let mut previous = page
        .content()
        .await
        .map_err(|e| FetchError::navigation(url, e))?;

    loop {
        tokio::time::sleep(window).await;
        let current = page
            .content()
            .await
            .map_err(|e| FetchError::navigation(url, e))?;
        if current == previous {
            return Ok(current);
        }
        previous = current;
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    fn name(&self) -> &str {
        "chrome"
    }

    async fn render(&self, url: &str) -> Result<String, FetchError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| FetchError::Browser("browser already closed".to_string()))?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::navigation(url, e))?;

        let timeout = self.options.navigation_timeout;
        let result = tokio::time::timeout(timeout, self.load(&page, url)).await;

        if let Err(e) = page.close().await {
            warn!("Failed to close tab for {}: {}", url, e);
        }

        match result {
            Ok(html) => html,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                seconds: timeout.as_secs(),
            }),
        }
    }

    async fn close(&mut self) -> Result<(), FetchError> {
        if let Some(mut browser) = self.browser.take() {
            browser
                .close()
                .await
                .map_err(|e| FetchError::Browser(format!("failed to close Chromium: {}", e)))?;
            if let Err(e) = browser.wait().await {
                warn!("Chromium did not exit cleanly: {}", e);
            }
        }
        if let Some(handle) = self.handler.take() {
            let _ = handle.await;
        }
        Ok(())
    }
}

impl Drop for ChromeRenderer {
    fn drop(&mut self) {
        if let Some(handle) = self.handler.take() {
            handle.abort();
        }
    }
}
