//! Image retrieval pipeline
//!
//! This module contains the core fetch logic, including:
//! - Discovering image references in the input document
//! - HTTP fetching with a fixed timeout
//! - Concurrent, cache-aware coordination of all downloads

mod coordinator;
mod discovery;
mod fetcher;

pub use coordinator::{
    image_extension, image_file_name, image_path, FetchTask, Pipeline, PipelineOptions,
    PipelineResult, ResolvedImage, DEFAULT_EXTENSION,
};
pub use discovery::extract_image_urls;
pub use fetcher::{build_http_client, HttpFetcher};

use crate::config::Config;
use crate::{MontageError, Result};

/// Resolves every image referenced by the configured input document
///
/// This is the main entry point of the pipeline. It will:
/// 1. Read the input document
/// 2. Discover image URLs
/// 3. Load the cache (unless disabled)
/// 4. Fetch all cache misses concurrently
/// 5. Persist the cache (unless disabled)
///
/// # Returns
///
/// * `Ok(PipelineResult)` - At least one image is available locally
/// * `Err(MontageError)` - The document could not be read, had no images, or every fetch failed
pub async fn collect_images(config: &Config) -> Result<PipelineResult> {
    tracing::info!("Reading markdown from {}", config.paths.input.display());
    let content = tokio::fs::read_to_string(&config.paths.input).await?;

    let urls = extract_image_urls(&content);
    if urls.is_empty() {
        return Err(MontageError::NoUrlsFound);
    }
    tracing::info!("Found {} image URLs in markdown", urls.len());

    let pipeline = Pipeline::from_config(config).await?;
    pipeline.run(urls).await
}
