//! Output module for turning resolved images into artifacts
//!
//! This module handles:
//! - Composing the montage with ImageMagick
//! - Generating the HTML preview
//! - Recording run statistics

mod compose;
mod preview;
mod stats;

pub use compose::{compose_montage, convert_args, montage_args, ComposeTool};
pub use preview::{format_preview, write_preview};
pub use stats::{log_statistics, RunStatistics};
