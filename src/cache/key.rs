use sha2::{Digest, Sha256};

/// Derives the cache key for a URL
///
/// The key is the hex-encoded SHA-256 of the raw URL text, query string
/// included. It doubles as the on-disk file stem for downloaded images.
///
/// # Example
///
/// ```
/// use montage_creator::cache::derive_key;
///
/// let key = derive_key("https://example.com/cat.png");
/// assert_eq!(key.len(), 64);
/// assert_eq!(key, derive_key("https://example.com/cat.png"));
/// ```
pub fn derive_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
