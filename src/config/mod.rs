//! Configuration management.
//!
//! Values are layered, lowest first: built-in defaults, a TOML file, then
//! environment variables prefixed `JOURNAL_TOC_` (for example
//! `JOURNAL_TOC_OUTPUT_PATH=issue.csv`). Command-line flags are applied on
//! top by the binary.

mod file_config;

pub use file_config::{default_config_toml, write_default_config};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::extract::ARTICLE_LINK_PREFIX;
use crate::utils::DEFAULT_USER_AGENT;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "JOURNAL_TOC";

/// Config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "journal-toc-scraper.toml";

/// Which renderer fetches pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Headless Chromium, runs page scripts
    #[default]
    Chrome,
    /// Plain HTTP GET, no script execution
    Http,
}

/// What to do when an article page cannot be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchErrorPolicy {
    /// Record the page as skipped and continue with the next link
    #[default]
    Skip,
    /// Stop the run at the first failure
    Abort,
}

/// Settings for one scrape run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Table-of-contents page listing the issue's articles
    pub listing_url: String,

    /// Host that relative article links are resolved against
    pub base_url: String,

    /// Only anchors whose href starts with this prefix are followed
    pub link_prefix: String,

    /// CSV file to write
    pub output_path: PathBuf,

    /// Save each article page to disk before extracting it
    pub staging_mode: bool,

    /// Directory for staged pages
    pub staging_dir: PathBuf,

    /// Behavior when an article page fails to load
    pub on_fetch_error: FetchErrorPolicy,

    /// Page renderer
    pub renderer: RendererKind,

    /// Run Chromium without a window
    pub headless: bool,

    /// Per-page limit for navigation and settling, in seconds
    pub navigation_timeout_secs: u64,

    /// Quiet period that counts as network idle, in milliseconds
    pub idle_window_ms: u64,

    /// User agent for the HTTP renderer
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            listing_url: "https://journals.sagepub.com/toc/JMX/current".to_string(),
            base_url: "https://journals.sagepub.com".to_string(),
            link_prefix: ARTICLE_LINK_PREFIX.to_string(),
            output_path: PathBuf::from("scraped_data.csv"),
            staging_mode: false,
            staging_dir: PathBuf::from("."),
            on_fetch_error: FetchErrorPolicy::default(),
            renderer: RendererKind::default(),
            headless: true,
            navigation_timeout_secs: 30,
            idle_window_ms: 500,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ScrapeConfig {
    /// Check values that would make a run meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listing_url.trim().is_empty() {
            return Err(ConfigError::Invalid("listing_url must not be empty".to_string()));
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".to_string()));
        }
        if self.link_prefix.is_empty() {
            return Err(ConfigError::Invalid("link_prefix must not be empty".to_string()));
        }
        if self.navigation_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "navigation_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.idle_window_ms >= self.navigation_timeout_secs.saturating_mul(1000) {
            return Err(ConfigError::Invalid(
                "idle_window_ms must be shorter than the navigation timeout".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from an optional file plus the environment
pub fn load_config(path: Option<&Path>) -> Result<ScrapeConfig, ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }
    let settings = builder
        .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .build()?;

    let config: ScrapeConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Find a config file in the working directory or the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join(env!("CARGO_PKG_NAME")).join("config.toml"))
        .filter(|path| path.is_file())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}
