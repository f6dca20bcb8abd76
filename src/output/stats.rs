//! Run statistics
//!
//! Summarizes what a pipeline run did: how many URLs were served from the
//! cache, how many were downloaded, and how many failed.

use crate::pipeline::PipelineResult;
use std::time::Duration;

/// Statistics for one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct RunStatistics {
    /// URLs found in the input document
    pub discovered: usize,

    /// URLs served from a previous run's download
    pub cache_hits: usize,

    /// URLs downloaded during this run
    pub downloads: usize,

    /// URLs that could not be retrieved
    pub failures: usize,

    /// Bytes written by fresh downloads
    pub bytes_downloaded: u64,

    /// Wall-clock time spent resolving images
    pub elapsed: Duration,
}

impl RunStatistics {
    /// Builds statistics from a finished run
    pub fn from_result(result: &PipelineResult, elapsed: Duration) -> Self {
        Self {
            discovered: result.attempted(),
            cache_hits: result.cache_hits,
            downloads: result.downloads,
            failures: result.failures,
            bytes_downloaded: result.bytes_downloaded(),
            elapsed,
        }
    }

    /// Number of URLs with a local file
    pub fn resolved(&self) -> usize {
        self.cache_hits + self.downloads
    }

    /// Share of resolved URLs that were cache hits, in percent
    pub fn hit_rate(&self) -> f64 {
        if self.resolved() == 0 {
            0.0
        } else {
            (self.cache_hits as f64 / self.resolved() as f64) * 100.0
        }
    }

    /// One-line human readable summary
    pub fn summary_line(&self) -> String {
        format!(
            "{} images: {} from cache, {} downloaded ({} bytes), {} failed in {:.2}s",
            self.discovered,
            self.cache_hits,
            self.downloads,
            self.bytes_downloaded,
            self.failures,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Logs statistics at info level
pub fn log_statistics(stats: &RunStatistics) {
    tracing::info!("{}", stats.summary_line());
    tracing::debug!("Cache hit rate: {:.1}%", stats.hit_rate());
    if stats.failures > 0 {
        tracing::warn!(
            "{} of {} images could not be retrieved",
            stats.failures,
            stats.discovered
        );
    }
}
