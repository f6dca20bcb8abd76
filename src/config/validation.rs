use crate::config::types::{CacheConfig, Config, FetchConfig, LayoutConfig, OutputConfig, PathsConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_paths_config(&config.paths)?;
    validate_cache_config(&config.cache)?;
    validate_fetch_config(&config.fetch)?;
    validate_layout_config(&config.layout)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates input and images directory paths
fn validate_paths_config(config: &PathsConfig) -> Result<(), ConfigError> {
    if config.input.as_os_str().is_empty() {
        return Err(ConfigError::Validation("input cannot be empty".to_string()));
    }

    if config.images_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "images_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates cache configuration
fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    // The path is irrelevant when caching is off
    if config.enabled && config.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "cache path cannot be empty when caching is enabled".to_string(),
        ));
    }

    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.max_concurrent == Some(0) {
        return Err(ConfigError::Validation(
            "max_concurrent must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates montage layout parameters
fn validate_layout_config(config: &LayoutConfig) -> Result<(), ConfigError> {
    validate_tile(&config.tile)?;
    validate_size(&config.size)?;

    if config.background.trim().is_empty() {
        return Err(ConfigError::Validation(
            "background cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.montage_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "montage_path cannot be empty".to_string(),
        ));
    }

    if config.montage_path.extension().is_none() {
        return Err(ConfigError::Validation(format!(
            "montage_path '{}' needs a file extension so ImageMagick can pick an output format",
            config.montage_path.display()
        )));
    }

    Ok(())
}

/// Validates a tile geometry of the form `CxR`
///
/// Either side may be omitted (`3x`, `x4`) as ImageMagick accepts, but not both.
fn validate_tile(tile: &str) -> Result<(), ConfigError> {
    let invalid = || {
        ConfigError::Validation(format!(
            "tile must look like COLUMNSxROWS (e.g. 3x4), got '{}'",
            tile
        ))
    };

    let (columns, rows) = tile.split_once('x').ok_or_else(invalid)?;

    if columns.is_empty() && rows.is_empty() {
        return Err(invalid());
    }

    for side in [columns, rows] {
        if !side.is_empty() && !is_positive_integer(side) {
            return Err(invalid());
        }
    }

    Ok(())
}

/// Validates an image size of the form `WxH`, optionally followed by one
/// ImageMagick resize flag (`!`, `<`, `>` or `^`)
fn validate_size(size: &str) -> Result<(), ConfigError> {
    let invalid = || {
        ConfigError::Validation(format!(
            "size must look like WIDTHxHEIGHT (e.g. 200x200), got '{}'",
            size
        ))
    };

    let dims = size
        .strip_suffix(|c: char| matches!(c, '!' | '<' | '>' | '^'))
        .unwrap_or(size);
    let (width, height) = dims.split_once('x').ok_or_else(invalid)?;

    if !is_positive_integer(width) || !is_positive_integer(height) {
        return Err(invalid());
    }

    Ok(())
}

fn is_positive_integer(s: &str) -> bool {
    s.parse::<u32>().map(|n| n > 0).unwrap_or(false)
}
