//! Montage Creator main entry point
//!
//! This is the command-line interface: extract image URLs from a markdown
//! file, download them (reusing cached copies), and build a montage.

use anyhow::Context;
use clap::Parser;
use montage_creator::config::{load_config_with_hash, validate, Config};
use montage_creator::output::{compose_montage, log_statistics, write_preview, RunStatistics};
use montage_creator::pipeline::collect_images;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Montage Creator: build image montages from markdown files
///
/// Extracts image URLs from a markdown file, downloads the images
/// concurrently with a persistent cache, and creates a montage using
/// ImageMagick.
#[derive(Parser, Debug)]
#[command(name = "montage-creator")]
#[command(version = "1.0.0")]
#[command(about = "Create image montages from markdown files", long_about = None)]
struct Cli {
    /// Optional TOML configuration file; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Input markdown file path [default: paste.md]
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output montage file path [default: montage.jpg]
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Cache file path [default: image_cache.json]
    #[arg(short, long, value_name = "FILE")]
    cache: Option<PathBuf>,

    /// Disable caching (always download fresh images)
    #[arg(long)]
    no_cache: bool,

    /// Directory for downloaded images [default: images]
    #[arg(long, value_name = "DIR")]
    images_dir: Option<PathBuf>,

    /// Tile geometry (columns x rows) [default: 3x4]
    #[arg(long)]
    tile: Option<String>,

    /// Image size [default: 200x200]
    #[arg(long)]
    size: Option<String>,

    /// Background color [default: #f5f5f5]
    #[arg(long)]
    background: Option<String>,

    /// Per-image request timeout in seconds [default: 30]
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Maximum simultaneous downloads (unbounded by default)
    #[arg(long, value_name = "N")]
    max_concurrent: Option<usize>,

    /// Keep images in document order instead of download completion order
    #[arg(long)]
    ordered: bool,

    /// Skip writing the HTML preview
    #[arg(long)]
    no_preview: bool,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress everything except errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Applies command-line overrides on top of a loaded configuration
    fn apply(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.paths.input = input.clone();
        }
        if let Some(images_dir) = &self.images_dir {
            config.paths.images_dir = images_dir.clone();
        }
        if let Some(output) = &self.output {
            config.output.montage_path = output.clone();
        }
        if let Some(cache) = &self.cache {
            config.cache.path = cache.clone();
        }
        if self.no_cache {
            config.cache.enabled = false;
        }
        if let Some(tile) = &self.tile {
            config.layout.tile = tile.clone();
        }
        if let Some(size) = &self.size {
            config.layout.size = size.clone();
        }
        if let Some(background) = &self.background {
            config.layout.background = background.clone();
        }
        if let Some(timeout) = self.timeout {
            config.fetch.timeout_secs = timeout;
        }
        if self.max_concurrent.is_some() {
            config.fetch.max_concurrent = self.max_concurrent;
        }
        if self.ordered {
            config.fetch.preserve_order = true;
        }
        if self.no_preview {
            config.output.preview = false;
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Errors are always shown; `-v` adds progress information.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("montage_creator=warn,error"),
            1 => EnvFilter::new("montage_creator=info,warn"),
            2 => EnvFilter::new("montage_creator=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Resolves configuration, fetches images, and builds the montage
async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };
    cli.apply(&mut config);
    validate(&config)?;

    tracing::debug!(
        "Starting with options: input={}, output={}, cache={}, verbosity={}",
        config.paths.input.display(),
        config.output.montage_path.display(),
        config.cache.enabled,
        cli.verbose
    );

    let started = Instant::now();
    let result = collect_images(&config)
        .await
        .with_context(|| format!("processing {}", config.paths.input.display()))?;

    let stats = RunStatistics::from_result(&result, started.elapsed());
    log_statistics(&stats);

    let paths = result.paths();
    compose_montage(&paths, &config.layout, &config.output.montage_path).await?;

    if config.output.preview {
        let preview_path = config.output.preview_path();
        if let Err(e) =
            write_preview(&result.images, &config.output.montage_path, &preview_path).await
        {
            tracing::error!("Error creating HTML preview: {}", e);
        }
    }

    Ok(())
}
