use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use journal_toc_scraper::config::{
    find_config_file, load_config, write_default_config, FetchErrorPolicy, RendererKind,
    ScrapeConfig, CONFIG_FILE_NAME,
};
use journal_toc_scraper::extract::{collect_links, extract_article};
use journal_toc_scraper::pipeline::Pipeline;
use journal_toc_scraper::renderer;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Journal TOC Scraper - extract article metadata from a journal issue into CSV
#[derive(Parser, Debug)]
#[command(name = "journal-toc-scraper")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract article metadata from a journal table of contents into CSV", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Page renderer
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum RendererArg {
    /// Headless Chromium (runs page scripts)
    Chrome,
    /// Plain HTTP GET
    Http,
}

/// Behavior on article fetch failure
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OnFetchError {
    /// Record the page as skipped and continue
    Skip,
    /// Stop at the first failure
    Abort,
}

#[derive(clap::Args, Debug, Default)]
struct RunArgs {
    /// Table-of-contents page to scrape
    #[arg(long)]
    listing_url: Option<String>,

    /// Host that relative article links are resolved against
    #[arg(long)]
    base_url: Option<String>,

    /// Output CSV file
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Save article pages to disk before extracting them
    #[arg(long)]
    staging: bool,

    /// Directory for staged pages
    #[arg(long)]
    staging_dir: Option<PathBuf>,

    /// What to do when an article page fails to load
    #[arg(long, value_enum)]
    on_fetch_error: Option<OnFetchError>,

    /// Page renderer
    #[arg(long, value_enum)]
    renderer: Option<RendererArg>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Per-page load timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scrape the listing page and write the CSV (default)
    Run(RunArgs),

    /// Extract metadata from saved article HTML files and print it as JSON
    Extract {
        /// HTML files to read
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List article links found in a saved listing page
    Links {
        /// HTML file to read
        file: PathBuf,

        /// Link prefix to match (default: from configuration)
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Write a default configuration file
    InitConfig {
        /// Destination (default: ./journal-toc-scraper.toml)
        path: Option<PathBuf>,
    },
}

impl RunArgs {
    fn apply(self, config: &mut ScrapeConfig) {
        if let Some(url) = self.listing_url {
            config.listing_url = url;
        }
        if let Some(url) = self.base_url {
            config.base_url = url;
        }
        if let Some(output) = self.output {
            config.output_path = output;
        }
        if self.staging {
            config.staging_mode = true;
        }
        if let Some(dir) = self.staging_dir {
            config.staging_dir = dir;
        }
        if let Some(policy) = self.on_fetch_error {
            config.on_fetch_error = match policy {
                OnFetchError::Skip => FetchErrorPolicy::Skip,
                OnFetchError::Abort => FetchErrorPolicy::Abort,
            };
        }
        if let Some(kind) = self.renderer {
            config.renderer = match kind {
                RendererArg::Chrome => RendererKind::Chrome,
                RendererArg::Http => RendererKind::Http,
            };
        }
        if self.headed {
            config.headless = false;
        }
        if let Some(timeout) = self.timeout {
            config.navigation_timeout_secs = timeout;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("journal_toc_scraper={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = cli.config.clone().or_else(find_config_file);
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => {
            let mut config =
                load_config(config_path.as_deref()).context("failed to load configuration")?;
            args.apply(&mut config);
            config.validate()?;
            run(config, cli.quiet).await
        }
        Commands::Extract { files } => {
            let mut records = Vec::with_capacity(files.len());
            for file in &files {
                let html = std::fs::read_to_string(file)
                    .with_context(|| format!("failed to read {}", file.display()))?;
                records.push(extract_article(&html));
            }
            println!("{}", serde_json::to_string_pretty(&records)?);
            Ok(())
        }
        Commands::Links { file, prefix } => {
            let prefix = match prefix {
                Some(prefix) => prefix,
                None => load_config(config_path.as_deref())?.link_prefix,
            };
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            for link in collect_links(&html, &prefix) {
                println!("{}", link);
            }
            Ok(())
        }
        Commands::InitConfig { path } => {
            let path = path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            if path.exists() {
                anyhow::bail!("{} already exists", path.display());
            }
            write_default_config(&path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}

async fn run(config: ScrapeConfig, quiet: bool) -> Result<()> {
    let listing_url = config.listing_url.clone();
    let started = Instant::now();
    let mut renderer = renderer::from_config(&config)
        .await
        .context("failed to start page renderer")?;

    let show_progress = !quiet && std::io::stderr().is_terminal();
    let report = Pipeline::new(config)
        .with_progress(show_progress)
        .started_at(started)
        .run(renderer.as_mut())
        .await
        .with_context(|| format!("scrape of {} failed", listing_url))?;

    if !quiet {
        println!(
            "Data extraction completed in {:.2} seconds.",
            report.elapsed.as_secs_f64()
        );
        println!(
            "Wrote {} of {} articles to {}",
            report.records.len(),
            report.discovered,
            report.output_path.display()
        );
        if !report.skipped.is_empty() {
            println!("Skipped {} pages:", report.skipped.len());
            for page in &report.skipped {
                println!("  #{} {} ({})", page.index, page.url, page.reason);
            }
        }
    }

    Ok(())
}
