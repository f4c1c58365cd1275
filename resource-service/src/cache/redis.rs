//! Redis-backed Cache-Aside Port adapter

use std::time::Duration;

use redis::AsyncCommands;
use async_trait::async_trait;
use deadpool_redis::{Config as DeadpoolConfig, Pool, Runtime};

use super::{CacheError, CachePort, CacheResult};
use crate::config::RedisConfig;

const SCAN_BATCH: usize = 200;

/// [`CachePort`] over a shared Redis pool
///
/// Pattern deletes walk the keyspace with `SCAN MATCH` and remove each batch
/// with `DEL`, so they never block the server the way `KEYS` would.
#[derive(Clone)]
pub struct RedisCache {
    pool: Pool,
    key_prefix: String,
}

impl RedisCache {
    /// Wrap an existing pool
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            key_prefix: String::new(),
        }
    }

    /// Connect using configuration
    ///
    /// A failed attempt is retried up to `max_retries` times, doubling the
    /// wait from `retry_delay_secs` each time. Each attempt must hand out a
    /// live connection within `connection_timeout_secs`.
    pub async fn connect(config: &RedisConfig) -> CacheResult<Self> {
        let mut delay = Duration::from_secs(config.retry_delay_secs);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let err = match open_pool(config).await {
                Ok(pool) => {
                    tracing::info!(
                        attempt,
                        max_connections = config.max_connections,
                        "Redis cache connected"
                    );
                    return Ok(Self::new(pool));
                }
                Err(e) => e,
            };

            if attempt > config.max_retries {
                tracing::error!(attempts = attempt, error = %err, "Redis cache unreachable");
                return Err(err);
            }
            tracing::warn!(attempt, error = %err, retry_in = ?delay, "Redis cache connect failed");
            tokio::time::sleep(delay).await;
            delay = delay.saturating_mul(2);
        }
    }

    /// Namespace every key and pattern under `prefix`
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    async fn connection(&self) -> CacheResult<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::Connection(format!("Failed to get Redis connection: {}", e)))
    }
}

/// Build a pool and prove it can hand out a connection
async fn open_pool(config: &RedisConfig) -> CacheResult<Pool> {
    let pool = DeadpoolConfig::from_url(&config.url)
        .builder()
        .map_err(|e| CacheError::Connection(format!("invalid Redis pool config: {}", e)))?
        .max_size(config.max_connections)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| CacheError::Connection(format!("could not build Redis pool: {}", e)))?;

    let timeout = Duration::from_secs(config.connection_timeout_secs);
    match tokio::time::timeout(timeout, pool.get()).await {
        Ok(Ok(_conn)) => Ok(pool),
        Ok(Err(e)) => Err(CacheError::Connection(format!("Redis unreachable: {}", e))),
        Err(_) => Err(CacheError::Connection(format!("Redis did not answer within {:?}", timeout))),
    }
}

fn command_error(e: redis::RedisError) -> CacheError {
    CacheError::Command(e.to_string())
}

#[async_trait]
impl CachePort for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection().await?;
        conn.get::<_, Option<String>>(self.prefixed(key))
            .await
            .map_err(command_error)
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let key = self.prefixed(key);
        match ttl {
            Some(ttl) => conn
                .set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
                .await
                .map_err(command_error),
            None => conn
                .set::<_, _, ()>(key, value)
                .await
                .map_err(command_error),
        }
    }

    async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64> {
        let mut conn = self.connection().await?;
        let pattern = self.prefixed(pattern);
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(command_error)?;

            if !keys.is_empty() {
                let deleted: u64 = conn.del(&keys).await.map_err(command_error)?;
                removed += deleted;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        tracing::debug!(pattern = %pattern, removed, "redis pattern delete");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> RedisConfig {
        RedisConfig {
            url: url.to_string(),
            max_connections: 4,
            connection_timeout_secs: 1,
            max_retries: 0,
            retry_delay_secs: 0,
        }
    }

    #[tokio::test]
    async fn test_invalid_url_is_a_connection_error() {
        let result = RedisCache::connect(&config("not a url")).await;
        assert!(matches!(result, Err(CacheError::Connection(_))));
    }
}
