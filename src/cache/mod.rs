//! Image cache module
//!
//! Keeps a record of every image downloaded by previous runs so that each URL
//! is fetched at most once. Entries are keyed by a digest of the URL text and
//! persisted as JSON between runs.

mod key;
mod store;

pub use key::derive_key;
pub use store::{CacheEntry, CacheStore};
