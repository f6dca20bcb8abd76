//! Montage Creator: cached image fetching for montage composition
//!
//! This crate extracts remote image references from a markdown document,
//! downloads each image concurrently (reusing copies fetched by earlier runs),
//! and hands the resulting local files to ImageMagick to build a montage.

pub mod cache;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod state;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Montage Creator operations
#[derive(Debug, Error)]
pub enum MontageError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No image URLs found in the input document")]
    NoUrlsFound,

    #[error("No images were successfully retrieved ({failed} of {attempted} failed)")]
    NoContent { attempted: usize, failed: usize },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Montage composition failed: {0}")]
    Compose(String),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::FetchState,
        to: state::FetchState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors raised while loading or persisting the image cache
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to read cache file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed cache file {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write cache file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Errors from a single image retrieval
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Bad status for {url}: {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type alias for Montage Creator operations
pub type Result<T> = std::result::Result<T, MontageError>;

/// Result type alias for cache operations
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use cache::{derive_key, CacheEntry, CacheStore};
pub use config::Config;
pub use pipeline::{extract_image_urls, HttpFetcher, Pipeline, PipelineResult};
pub use state::{FetchState, ImageOrigin};
