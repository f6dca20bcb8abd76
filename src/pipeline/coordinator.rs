//! Pipeline coordinator - concurrent, cache-aware image retrieval
//!
//! Every discovered URL becomes its own tokio task. Each task:
//! 1. Looks the URL up in the cache (when enabled) and checks the file is still on disk
//! 2. Downloads the image on a miss
//! 3. Records fresh downloads in the cache
//! 4. Appends the resolved path to the shared result list
//!
//! All tasks are joined before the cache is persisted. Results are merged in
//! the order tasks finish unless `preserve_order` is set.

use crate::cache::{derive_key, CacheEntry, CacheStore};
use crate::config::Config;
use crate::pipeline::HttpFetcher;
use crate::state::{FetchState, ImageOrigin};
use crate::{MontageError, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// Extension used when the URL path does not carry one
pub const DEFAULT_EXTENSION: &str = ".jpg";

/// One discovered URL waiting to be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTask {
    /// Position of the reference in the source document
    pub index: usize,
    /// The reference exactly as discovered
    pub source_url: String,
}

/// A URL for which a local file is available
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub index: usize,
    pub source_url: String,
    pub local_path: PathBuf,
    pub origin: ImageOrigin,
    /// Bytes written by a fresh download (0 for cache hits)
    pub bytes: u64,
}

/// Outcome of a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineResult {
    /// Resolved images, in completion order unless order preservation was requested
    pub images: Vec<ResolvedImage>,
    pub cache_hits: usize,
    pub downloads: usize,
    pub failures: usize,
}

impl PipelineResult {
    /// Local file paths to hand to the composition step
    pub fn paths(&self) -> Vec<PathBuf> {
        self.images
            .iter()
            .map(|image| image.local_path.clone())
            .collect()
    }

    /// Number of URLs the run attempted
    pub fn attempted(&self) -> usize {
        self.images.len() + self.failures
    }

    /// Total bytes downloaded during the run
    pub fn bytes_downloaded(&self) -> u64 {
        self.images.iter().map(|image| image.bytes).sum()
    }
}

/// Knobs controlling a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Directory receiving downloaded images
    pub images_dir: PathBuf,

    /// Cache file to persist to after the run; `None` disables caching entirely
    pub cache_path: Option<PathBuf>,

    /// Upper bound on simultaneous downloads; `None` means one in flight per URL
    pub max_concurrent: Option<usize>,

    /// Sort the result by discovery index instead of completion order
    pub preserve_order: bool,
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            images_dir: config.paths.images_dir.clone(),
            cache_path: config
                .cache
                .enabled
                .then(|| config.cache.path.clone()),
            max_concurrent: config.fetch.max_concurrent,
            preserve_order: config.fetch.preserve_order,
        }
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_path.is_some()
    }
}

/// Concurrent image retrieval with a persistent cache
pub struct Pipeline {
    fetcher: HttpFetcher,
    cache: Arc<CacheStore>,
    options: PipelineOptions,
}

impl Pipeline {
    /// Creates a pipeline over an existing cache store
    ///
    /// The store is used as-is; call [`Pipeline::load_cache`] to read the
    /// persisted file first.
    pub fn new(fetcher: HttpFetcher, cache: Arc<CacheStore>, options: PipelineOptions) -> Self {
        Self {
            fetcher,
            cache,
            options,
        }
    }

    /// Builds a pipeline from configuration and loads the persisted cache
    pub async fn from_config(config: &Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.fetch)?;
        let pipeline = Self::new(
            fetcher,
            Arc::new(CacheStore::new()),
            PipelineOptions::from_config(config),
        );
        pipeline.load_cache().await;
        Ok(pipeline)
    }

    /// The cache store shared with every fetch task
    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Loads the persisted cache when caching is enabled
    ///
    /// A malformed or unreadable file is logged and the run continues with
    /// an empty cache.
    pub async fn load_cache(&self) {
        let Some(path) = &self.options.cache_path else {
            tracing::info!("Cache disabled, all images will be freshly downloaded");
            return;
        };

        tracing::info!("Loading cache from {}", path.display());
        match self.cache.load(path).await {
            Ok(count) => tracing::debug!("[CACHE] Loaded {} entries", count),
            Err(e) => tracing::error!("Failed to load cache: {}", e),
        }
    }

    /// Persists the cache when caching is enabled
    ///
    /// Failures are logged; the images resolved in this run stay usable.
    pub async fn save_cache(&self) {
        let Some(path) = &self.options.cache_path else {
            return;
        };

        tracing::info!("Saving cache to {}", path.display());
        if let Err(e) = self.cache.save(path).await {
            tracing::error!("Failed to save cache: {}", e);
        }
    }

    /// Resolves every URL to a local file
    ///
    /// # Returns
    ///
    /// * `Ok(PipelineResult)` - At least one URL resolved
    /// * `Err(MontageError::NoUrlsFound)` - `urls` was empty
    /// * `Err(MontageError::NoContent)` - Every URL failed
    pub async fn run(&self, urls: Vec<String>) -> Result<PipelineResult> {
        if urls.is_empty() {
            return Err(MontageError::NoUrlsFound);
        }

        tokio::fs::create_dir_all(&self.options.images_dir).await?;

        let worker = Worker {
            fetcher: self.fetcher.clone(),
            cache: Arc::clone(&self.cache),
            results: Arc::new(Mutex::new(Vec::with_capacity(urls.len()))),
            images_dir: self.options.images_dir.clone(),
            use_cache: self.options.cache_enabled(),
            permits: self
                .options
                .max_concurrent
                .map(|limit| Arc::new(Semaphore::new(limit))),
        };

        let mut join_set = JoinSet::new();
        for (index, source_url) in urls.into_iter().enumerate() {
            let worker = worker.clone();
            join_set.spawn(async move { worker.process(FetchTask { index, source_url }).await });
        }

        let mut failures = 0;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Ok(state)) => {
                    tracing::trace!("Fetch task finished: {}", state);
                    if !state.is_success() {
                        failures += 1;
                    }
                }
                Ok(Err(e)) => {
                    tracing::error!("Fetch task ended in an invalid state: {}", e);
                    failures += 1;
                }
                Err(e) => {
                    tracing::error!("Fetch task panicked: {}", e);
                    failures += 1;
                }
            }
        }

        self.save_cache().await;

        let mut images = std::mem::take(
            &mut *worker
                .results
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );

        if images.is_empty() {
            return Err(MontageError::NoContent {
                attempted: failures,
                failed: failures,
            });
        }

        if self.options.preserve_order {
            images.sort_by_key(|image| image.index);
        }

        let cache_hits = images.iter().filter(|i| i.origin.is_cached()).count();
        let downloads = images.len() - cache_hits;

        Ok(PipelineResult {
            images,
            cache_hits,
            downloads,
            failures,
        })
    }
}

/// Shared handles cloned into every fetch task
#[derive(Clone)]
struct Worker {
    fetcher: HttpFetcher,
    cache: Arc<CacheStore>,
    results: Arc<Mutex<Vec<ResolvedImage>>>,
    images_dir: PathBuf,
    use_cache: bool,
    permits: Option<Arc<Semaphore>>,
}

impl Worker {
    /// Drives one URL from `Pending` to a terminal state
    async fn process(self, task: FetchTask) -> Result<FetchState> {
        let mut state = FetchState::Pending;
        let url = task.source_url.as_str();

        if self.use_cache {
            match self.cache.get(url) {
                Some(entry) if entry.file_exists() => {
                    state.transition(FetchState::CacheHit)?;
                    tracing::info!(
                        "[CACHE] Using cached image for {} ({})",
                        url,
                        entry.local_path.display()
                    );
                    tracing::debug!(
                        "[CACHE] Cache hit details: URL={}, Path={}, FetchedAt={}",
                        entry.source_url,
                        entry.local_path.display(),
                        entry.fetched_at
                    );

                    self.push(ResolvedImage {
                        index: task.index,
                        source_url: task.source_url.clone(),
                        local_path: entry.local_path,
                        origin: ImageOrigin::Cached,
                        bytes: 0,
                    });
                    state.transition(FetchState::Resolved)?;
                    return Ok(state);
                }
                Some(_) => tracing::info!(
                    "[CACHE] Cache entry exists but file missing for {}, will re-download",
                    url
                ),
                None => tracing::debug!("[CACHE] No cache entry for {}", url),
            }
        }

        state.transition(FetchState::Downloading)?;
        let destination = image_path(&self.images_dir, url);
        tracing::info!("[DOWNLOAD] Fetching image {}: {}", task.index, url);

        let fetched = {
            // Held for the duration of the network transfer only
            let _permit = match &self.permits {
                Some(permits) => Arc::clone(permits).acquire_owned().await.ok(),
                None => None,
            };
            self.fetcher.fetch(url, &destination).await
        };

        let bytes = match fetched {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("[DOWNLOAD] Failed to download image {}: {}", url, e);
                state.transition(FetchState::Failed)?;
                return Ok(state);
            }
        };

        if self.use_cache {
            let entry = CacheEntry::downloaded(url, destination.clone());
            tracing::debug!("[CACHE] Added to cache: {} -> {:?}", url, entry);
            self.cache.set(url, entry);
        }

        tracing::info!(
            "[SUCCESS] Downloaded image {}: {} -> {}",
            task.index,
            url,
            destination.display()
        );
        self.push(ResolvedImage {
            index: task.index,
            source_url: task.source_url.clone(),
            local_path: destination,
            origin: ImageOrigin::Downloaded,
            bytes,
        });
        state.transition(FetchState::Resolved)?;
        Ok(state)
    }

    fn push(&self, image: ResolvedImage) {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(image);
    }
}

/// Local path for a freshly downloaded image: `<images_dir>/<key><ext>`
pub fn image_path(images_dir: &Path, url: &str) -> PathBuf {
    images_dir.join(image_file_name(url))
}

/// File name for a downloaded image
///
/// The stem is the cache key of the raw URL (query string included); the
/// extension comes from the URL path with query and fragment removed.
pub fn image_file_name(url: &str) -> String {
    format!("{}{}", derive_key(url), image_extension(url))
}

/// Extension (with leading dot) of the URL path, or [`DEFAULT_EXTENSION`]
pub fn image_extension(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
    };

    Path::new(&path)
        .extension()
        .and_then(OsStr::to_str)
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
