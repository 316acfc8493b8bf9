//! Configuration file support.
//!
//! # Configuration File Format
//!
//! ```toml
//! listing_url = "https://journals.sagepub.com/toc/JMX/current"
//! base_url = "https://journals.sagepub.com"
//! link_prefix = "/doi/abs/"
//! output_path = "scraped_data.csv"
//! staging_mode = false
//! staging_dir = "."
//! on_fetch_error = "skip"   # or "abort"
//! renderer = "chrome"       # or "http"
//! headless = true
//! navigation_timeout_secs = 30
//! idle_window_ms = 500
//! ```

use std::path::Path;

use super::{ConfigError, ScrapeConfig};

/// Render the default configuration as TOML
pub fn default_config_toml() -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(&ScrapeConfig::default())?)
}

/// Write the default configuration to `path`, creating parent directories
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, default_config_toml()?)?;
    Ok(())
}
