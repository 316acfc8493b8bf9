//! # Journal TOC Scraper
//!
//! Collects article metadata from a journal's table-of-contents page: every
//! linked article is rendered, its title, authors, publication date, DOI and
//! abstract are extracted, and the results are written to a CSV file.
//!
//! ## Architecture
//!
//! - [`extract`]: link collection and per-field markup extraction
//! - [`renderer`]: page fetching (headless Chromium, plain HTTP, mock)
//! - [`pipeline`]: the sequential discovery → fetch → extract → export driver
//! - [`export`]: CSV writer
//! - [`models`]: the [`ArticleRecord`] type
//! - [`config`]: configuration loading
//!
//! ```rust,no_run
//! use journal_toc_scraper::config::ScrapeConfig;
//! use journal_toc_scraper::pipeline::Pipeline;
//! use journal_toc_scraper::renderer;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ScrapeConfig::default();
//! let mut renderer = renderer::from_config(&config).await?;
//! let report = Pipeline::new(config).run(renderer.as_mut()).await?;
//! println!("{} records", report.records.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod export;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod renderer;
pub mod utils;

// Re-export commonly used types
pub use models::ArticleRecord;
pub use pipeline::{Pipeline, RunReport, ScrapeError};
pub use renderer::{FetchError, Renderer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
