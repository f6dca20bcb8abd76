use serde::Deserialize;
use std::path::PathBuf;

/// Browser user agent sent with every image request
///
/// Some image hosts refuse requests that do not look like they come from a
/// desktop browser.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Main configuration structure for Montage Creator
///
/// Every section is optional in the TOML file; missing values fall back to
/// the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub cache: CacheConfig,
    pub fetch: FetchConfig,
    pub layout: LayoutConfig,
    pub output: OutputConfig,
}

/// Input and working directory locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Markdown document to scan for image references
    pub input: PathBuf,

    /// Directory receiving downloaded images
    #[serde(rename = "images-dir")]
    pub images_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("paste.md"),
            images_dir: PathBuf::from("images"),
        }
    }
}

/// Persistent cache settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// When false, the cache file is neither read nor written
    pub enabled: bool,

    /// Location of the JSON cache file
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("image_cache.json"),
        }
    }
}

/// Network retrieval settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Overall timeout for a single image request (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// User-Agent header value
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Upper bound on simultaneous downloads; unbounded when absent
    #[serde(rename = "max-concurrent")]
    pub max_concurrent: Option<usize>,

    /// Return images in document order instead of completion order
    #[serde(rename = "preserve-order")]
    pub preserve_order: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_concurrent: None,
            preserve_order: false,
        }
    }
}

/// Montage layout, passed through to ImageMagick unchanged
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Tile geometry (columns x rows), e.g. "3x4"
    pub tile: String,

    /// Size of each image, e.g. "200x200"
    pub size: String,

    /// Background colour, also used for borders and matte
    pub background: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            tile: "3x4".to_string(),
            size: "200x200".to_string(),
            background: "#f5f5f5".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the composed montage image
    #[serde(rename = "montage-path")]
    pub montage_path: PathBuf,

    /// Whether to write an HTML preview next to the montage
    pub preview: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            montage_path: PathBuf::from("montage.jpg"),
            preview: true,
        }
    }
}

impl OutputConfig {
    /// Path of the HTML preview: the montage path with an `.html` extension
    pub fn preview_path(&self) -> PathBuf {
        self.montage_path.with_extension("html")
    }
}
