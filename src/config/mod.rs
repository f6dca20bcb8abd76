//! Configuration module for Montage Creator
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Command-line flags are applied on top of it by the
//! binary.
//!
//! # Example
//!
//! ```no_run
//! use montage_creator::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("montage.toml")).unwrap();
//! println!("Images will be stored in: {}", config.paths.images_dir.display());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CacheConfig, Config, FetchConfig, LayoutConfig, OutputConfig, PathsConfig,
    DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
