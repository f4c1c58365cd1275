//! Cache-Aside Port
//!
//! An optional key/value store the resource layer reads through on
//! fetch-by-id and invalidates by pattern after each mutation. Values are
//! JSON strings; [`get_typed`] and [`set_typed`] do the encoding.
//!
//! Every failure here is a [`CacheError`]. Callers in the resource layer
//! treat any of them as a miss or a no-op and never surface them.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

mod key;
mod memory;
#[cfg(feature = "cache")]
mod redis;

pub use key::CacheKey;
pub use memory::InMemoryCache;
#[cfg(feature = "cache")]
pub use self::redis::RedisCache;

/// Result type for cache operations
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Cache adapter failure
#[derive(Debug, Error)]
pub enum CacheError {
    /// Could not reach the cache or obtain a connection
    #[error("Cache connection error: {0}")]
    Connection(String),

    /// The cache rejected a command
    #[error("Cache command error: {0}")]
    Command(String),

    /// A cached value could not be encoded or decoded
    #[error("Cache codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// A key pattern could not be interpreted
    #[error("Invalid cache pattern '{pattern}': {reason}")]
    Pattern {
        /// The offending pattern
        pattern: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Process-wide cache store shared by every resource service
///
/// Patterns use glob syntax: `*` matches any run of characters, `?` one
/// character, and `\` escapes the next one.
#[async_trait]
pub trait CachePort: Send + Sync {
    /// Read a raw value
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Write a raw value, expiring after `ttl` if given
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()>;

    /// Delete every key matching `pattern`, returning how many went
    async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64>;
}

/// Read and decode a JSON value
pub async fn get_typed<T: DeserializeOwned>(
    cache: &dyn CachePort,
    key: &str,
) -> CacheResult<Option<T>> {
    match cache.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode and write a JSON value
pub async fn set_typed<T: Serialize + ?Sized>(
    cache: &dyn CachePort,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> CacheResult<()> {
    let raw = serde_json::to_string(value)?;
    cache.set(key, raw, ttl).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Entry {
        id: u64,
        name: String,
    }

    #[tokio::test]
    async fn test_typed_round_trip_through_port() {
        let cache = InMemoryCache::new();
        let entry = Entry {
            id: 4,
            name: "four".to_string(),
        };
        set_typed(&cache, "Entry:4", &entry, None).await.unwrap();

        let read: Option<Entry> = get_typed(&cache, "Entry:4").await.unwrap();
        assert_eq!(read, Some(entry));

        let missing: Option<Entry> = get_typed(&cache, "Entry:5").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_get_typed_reports_codec_errors() {
        let cache = InMemoryCache::new();
        cache
            .set("Entry:1", "not json".to_string(), None)
            .await
            .unwrap();

        let result: CacheResult<Option<Entry>> = get_typed(&cache, "Entry:1").await;
        assert!(matches!(result, Err(CacheError::Codec(_))));
    }
}
