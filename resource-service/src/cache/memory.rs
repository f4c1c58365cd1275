//! In-process Cache-Aside Port adapter

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use regex::Regex;

use super::{CacheError, CachePort, CacheResult};

#[derive(Debug, Clone)]
struct CachedValue {
    value: String,
    expires_at: Option<Instant>,
}

impl CachedValue {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// [`CachePort`] backed by a concurrent hash map
///
/// Expired entries are dropped lazily on read and on pattern deletes.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: DashMap<String, CachedValue>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a live entry exists for `key`
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Live keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl CachePort for InMemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        // remove_if takes the shard write lock, so no guard may be held here
        if self
            .entries
            .remove_if(key, |_, entry| entry.is_expired(now))
            .is_some()
        {
            return Ok(None);
        }
        Ok(self.entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries
            .insert(key.to_string(), CachedValue { value, expires_at });
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64> {
        let matcher = glob_to_regex(pattern)?;
        let now = Instant::now();
        let before = self.entries.len();
        let mut live_removed = 0_u64;
        self.entries.retain(|key, entry| {
            if matcher.is_match(key) {
                if !entry.is_expired(now) {
                    live_removed += 1;
                }
                false
            } else {
                true
            }
        });
        tracing::trace!(pattern, removed = before - self.entries.len(), "cache pattern delete");
        Ok(live_removed)
    }
}

/// Compile a Redis-style glob (`*`, `?`, `\` escapes) into an anchored regex
fn glob_to_regex(pattern: &str) -> CacheResult<Regex> {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '\\' => match chars.next() {
                Some(escaped) => out.push_str(&regex::escape(escaped.encode_utf8(&mut [0; 4]))),
                None => {
                    return Err(CacheError::Pattern {
                        pattern: pattern.to_string(),
                        reason: "trailing escape".to_string(),
                    })
                }
            },
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    out.push('$');
    Regex::new(&out).map_err(|e| CacheError::Pattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheKey;

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = InMemoryCache::new();
        cache.set("a", "1".to_string(), None).await.unwrap();
        assert_eq!(cache.get("a").await.unwrap(), Some("1".to_string()));
        assert_eq!(cache.get("b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let cache = InMemoryCache::new();
        cache
            .set("a", "1".to_string(), Some(Duration::from_millis(10)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get("a").await.unwrap(), None);
        assert!(!cache.contains("a"));
    }

    #[tokio::test]
    async fn test_invalidation_spares_sibling_ids() {
        let cache = InMemoryCache::new();
        for key in ["Widget:1", "Widget:1:parts", "Widget:1:owner-parts", "Widget:12", "Gadget:1"] {
            cache.set(key, "{}".to_string(), None).await.unwrap();
        }

        let mut removed = 0;
        for pattern in CacheKey::new("Widget", 1).invalidation_patterns() {
            removed += cache.delete_pattern(&pattern).await.unwrap();
        }

        assert_eq!(removed, 3);
        assert_eq!(cache.keys(), vec!["Gadget:1".to_string(), "Widget:12".to_string()]);
    }

    #[test]
    fn test_glob_to_regex() {
        let re = glob_to_regex("W?dget:\\*").unwrap();
        assert!(re.is_match("Widget:*"));
        assert!(!re.is_match("Widget:1"));
        assert!(glob_to_regex("bad\\").is_err());
    }
}
