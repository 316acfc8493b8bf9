//! Scrape pipeline: discovery, fetch and extract, export.
//!
//! ```text
//! listing page --render--> links --render each--> article HTML
//!                                                   |  (staging mode: page_N.html on disk)
//!                                                   v
//!                                  extract_article --> retained records --> CSV
//! ```
//!
//! The run is strictly sequential. The renderer is closed before the CSV is
//! written, on success and on failure alike.

mod staging;

pub use staging::StagingArea;

use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::{FetchErrorPolicy, ScrapeConfig};
use crate::export::{export_csv, ExportError};
use crate::extract::{collect_links, extract_article, resolve_link};
use crate::models::ArticleRecord;
use crate::renderer::{FetchError, Renderer};

/// Errors that end a run
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// The listing page could not be loaded
    #[error("failed to load listing page: {0}")]
    Listing(#[source] FetchError),

    /// An article page could not be loaded and the policy is `abort`
    #[error("failed to load article page: {0}")]
    Fetch(#[source] FetchError),

    /// A staged page could not be written, read or deleted
    #[error("staging file {path}: {source}")]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output table could not be written
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// An article link that was dropped because its page failed to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPage {
    /// 1-based position of the link on the listing page
    pub index: usize,
    pub url: String,
    pub reason: String,
}

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Number of article links found on the listing page
    pub discovered: usize,
    /// Records written to the output, in link order
    pub records: Vec<ArticleRecord>,
    /// Links skipped after a fetch failure
    pub skipped: Vec<SkippedPage>,
    pub output_path: PathBuf,
    pub elapsed: Duration,
}

/// What the fetch phase produced
enum Fetched {
    /// Fused mode: pages already extracted
    Records(Vec<ArticleRecord>),
    /// Staging mode: pages waiting on disk
    Staged(StagingArea),
}

/// The scrape driver
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: ScrapeConfig,
    show_progress: bool,
    started_at: Option<Instant>,
}

impl Pipeline {
    pub fn new(config: ScrapeConfig) -> Self {
        Self {
            config,
            show_progress: false,
            started_at: None,
        }
    }

    /// Draw a progress bar over the article loop
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Measure elapsed time from `start` instead of from the call to `run`,
    /// e.g. to include renderer startup.
    pub fn started_at(mut self, start: Instant) -> Self {
        self.started_at = Some(start);
        self
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Run discovery, fetching, extraction and export.
    pub async fn run(&self, renderer: &mut dyn Renderer) -> Result<RunReport, ScrapeError> {
        let start = self.started_at.unwrap_or_else(Instant::now);
        info!(
            listing = %self.config.listing_url,
            renderer = renderer.name(),
            staging = self.config.staging_mode,
            "Starting scrape"
        );

        let fetched = self.fetch_all(&*renderer).await;

        if let Err(e) = renderer.close().await {
            warn!("Failed to close renderer: {}", e);
        }

        let (discovered, fetched, skipped) = fetched?;

        let records = match fetched {
            Fetched::Records(records) => records,
            Fetched::Staged(area) => extract_staged(area)?,
        };

        let rows = export_csv(&records, &self.config.output_path)?;
        let elapsed = start.elapsed();
        info!(
            rows,
            skipped = skipped.len(),
            output = %self.config.output_path.display(),
            "Scrape finished in {:.2}s",
            elapsed.as_secs_f64()
        );

        Ok(RunReport {
            discovered,
            records,
            skipped,
            output_path: self.config.output_path.clone(),
            elapsed,
        })
    }

    /// Discover article links on the listing page.
    pub async fn discover(&self, renderer: &dyn Renderer) -> Result<Vec<String>, ScrapeError> {
        let html = renderer
            .render(&self.config.listing_url)
            .await
            .map_err(ScrapeError::Listing)?;
        let links = collect_links(&html, &self.config.link_prefix);
        info!("Found {} article links", links.len());
        Ok(links)
    }

    async fn fetch_all(
        &self,
        renderer: &dyn Renderer,
    ) -> Result<(usize, Fetched, Vec<SkippedPage>), ScrapeError> {
        let links = self.discover(renderer).await?;

        let mut staging = if self.config.staging_mode {
            Some(StagingArea::new(&self.config.staging_dir)?)
        } else {
            None
        };
        let mut records = Vec::new();
        let mut skipped = Vec::new();

        let progress = self.progress_bar(links.len());

        for (index, href) in links.iter().enumerate().map(|(i, h)| (i + 1, h)) {
            let url = resolve_link(&self.config.base_url, href);
            progress.set_message(href.clone());
            debug!(index, url = %url, "Fetching article");

            let html = match renderer.render(&url).await {
                Ok(html) => html,
                Err(e) => match self.config.on_fetch_error {
                    FetchErrorPolicy::Abort => {
                        progress.abandon();
                        return Err(ScrapeError::Fetch(e));
                    }
                    FetchErrorPolicy::Skip => {
                        warn!("Skipping {}: {}", url, e);
                        skipped.push(SkippedPage {
                            index,
                            url,
                            reason: e.to_string(),
                        });
                        progress.inc(1);
                        continue;
                    }
                },
            };

            match staging.as_mut() {
                Some(area) => {
                    area.stage(index, &html)?;
                }
                None => {
                    let record = extract_article(&html);
                    if record.is_retained() {
                        records.push(record);
                    } else {
                        debug!(url = %url, "No title, dropping page");
                    }
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        let fetched = match staging {
            Some(area) => Fetched::Staged(area),
            None => Fetched::Records(records),
        };
        Ok((links.len(), fetched, skipped))
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("=> "));
        }
        pb
    }
}

/// Second pass of staging mode: read, extract and delete every staged page.
fn extract_staged(mut area: StagingArea) -> Result<Vec<ArticleRecord>, ScrapeError> {
    let mut records = Vec::with_capacity(area.len());
    while let Some(page) = area.next_page() {
        let record = extract_article(&page?);
        if record.is_retained() {
            records.push(record);
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::MockRenderer;
    use tempfile::tempdir;

    const LISTING: &str = "https://journals.example.com/toc/JMX/current";

    fn article(title: &str) -> String {
        format!(
            r#"<html><head><meta name="dc.Title" content="{}"></head><body></body></html>"#,
            title
        )
    }

    fn config(dir: &std::path::Path) -> ScrapeConfig {
        ScrapeConfig {
            listing_url: LISTING.to_string(),
            base_url: "https://journals.example.com".to_string(),
            output_path: dir.join("out.csv"),
            staging_dir: dir.join("staging"),
            ..ScrapeConfig::default()
        }
    }

    #[tokio::test]
    async fn test_untitled_pages_are_dropped() {
        let dir = tempdir().unwrap();
        let mut renderer = MockRenderer::new()
            .with_page(
                LISTING,
                r#"<a href="/doi/abs/1">1</a><a href="/doi/abs/2">2</a>"#,
            )
            .with_page("https://journals.example.com/doi/abs/1", article("Kept"))
            .with_page(
                "https://journals.example.com/doi/abs/2",
                "<html><body>No metadata</body></html>",
            );

        let report = Pipeline::new(config(dir.path()))
            .run(&mut renderer)
            .await
            .unwrap();

        assert_eq!(report.discovered, 2);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].title.as_deref(), Some("Kept"));
        assert!(renderer.is_closed());
    }

    #[tokio::test]
    async fn test_listing_failure_is_fatal_and_closes_renderer() {
        let dir = tempdir().unwrap();
        let mut renderer = MockRenderer::new();

        let err = Pipeline::new(config(dir.path()))
            .run(&mut renderer)
            .await
            .unwrap_err();

        assert!(matches!(err, ScrapeError::Listing(_)));
        assert!(renderer.is_closed());
        assert!(!dir.path().join("out.csv").exists());
    }

    #[tokio::test]
    async fn test_abort_policy_stops_at_first_failure() {
        let dir = tempdir().unwrap();
        let mut cfg = config(dir.path());
        cfg.on_fetch_error = FetchErrorPolicy::Abort;
        cfg.staging_mode = true;

        let mut renderer = MockRenderer::new()
            .with_page(
                LISTING,
                r#"<a href="/doi/abs/1">1</a><a href="/doi/abs/2">2</a><a href="/doi/abs/3">3</a>"#,
            )
            .with_page("https://journals.example.com/doi/abs/1", article("One"));

        let err = Pipeline::new(cfg).run(&mut renderer).await.unwrap_err();

        match err {
            ScrapeError::Fetch(e) => {
                assert_eq!(e.url(), Some("https://journals.example.com/doi/abs/2"))
            }
            other => panic!("unexpected error: {}", other),
        }
        // Link 3 is never requested and the staged page 1 is cleaned up
        assert_eq!(renderer.visited().len(), 3);
        assert!(!dir.path().join("staging").join("page_1.html").exists());
        assert!(renderer.is_closed());
    }

    #[tokio::test]
    async fn test_elapsed_counts_from_given_start() {
        let dir = tempdir().unwrap();
        let mut renderer = MockRenderer::new().with_page(LISTING, "<html></html>");
        let start = Instant::now()
            .checked_sub(Duration::from_secs(2))
            .unwrap();

        let report = Pipeline::new(config(dir.path()))
            .started_at(start)
            .run(&mut renderer)
            .await
            .unwrap();

        assert!(report.elapsed >= Duration::from_secs(2));
    }
}
