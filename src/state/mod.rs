//! State module for tracking fetch progress
//!
//! # Components
//!
//! - `FetchState`: Tracks the state of each discovered URL (pending, cache hit, downloading, ...)
//! - `ImageOrigin`: Records whether a resolved file came from the cache or the network

mod fetch_state;

// Re-export main types
pub use fetch_state::{FetchState, ImageOrigin};
