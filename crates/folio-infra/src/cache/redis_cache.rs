//! Redis-backed page cache shared across server processes.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use folio_core::ports::{Cache, CacheError};

/// Redis connection settings.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub connect_timeout: Duration,
    /// Namespace prepended to every key, so several deployments can share one
    /// Redis database.
    pub namespace: String,
}

impl RedisConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: Duration::from_secs(5),
            namespace: "folio".to_string(),
        }
    }
}

/// Cache stored in Redis under `<namespace>:<key>`.
pub struct RedisCache {
    conn: ConnectionManager,
    namespace: String,
}

impl RedisCache {
    pub async fn connect(config: RedisConfig) -> Result<Self, CacheError> {
        let client =
            Client::open(config.url.as_str()).map_err(|e| CacheError::Connection(e.to_string()))?;

        let conn = tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Connection("Connection timed out".to_string()))?
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, namespace = %config.namespace, "Connected to Redis cache");

        Ok(Self {
            conn,
            namespace: config.namespace,
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }
}

fn op_error(e: redis::RedisError) -> CacheError {
    CacheError::Operation(e.to_string())
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(self.key(key))
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(key, error = %e, "Redis GET failed");
                None
            })
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let key = self.key(key);

        match ttl {
            // SET EX rejects zero, so round sub-second lifetimes up.
            Some(ttl) => conn
                .set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
                .await
                .map_err(op_error),
            None => conn.set::<_, _, ()>(key, value).await.map_err(op_error),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.key(key)).await.map_err(op_error)
    }

    async fn exists(&self, key: &str) -> bool {
        let mut conn = self.conn.clone();
        conn.exists::<_, bool>(self.key(key))
            .await
            .unwrap_or(false)
    }

    async fn clear_prefix(&self, prefix: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", self.key(prefix));

        let keys: Vec<String> = {
            let mut iter = conn
                .scan_match::<_, String>(&pattern)
                .await
                .map_err(op_error)?;
            let mut keys = Vec::new();
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
            keys
        };

        if !keys.is_empty() {
            conn.del::<_, ()>(&keys).await.map_err(op_error)?;
        }
        tracing::debug!(prefix, removed = keys.len(), "Redis cache prefix cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_cache() -> Option<RedisCache> {
        let mut config = RedisConfig::new(
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6389".to_string()),
        );
        config.connect_timeout = Duration::from_secs(1);
        config.namespace = "folio-test".to_string();

        RedisCache::connect(config).await.ok()
    }

    #[tokio::test]
    async fn test_redis_cache_set_get() {
        let Some(cache) = test_cache().await else {
            return;
        };

        cache.set("index_page:/", "page", None).await.unwrap();
        assert_eq!(cache.get("index_page:/").await, Some("page".to_string()));

        cache.delete("index_page:/").await.unwrap();
        assert_eq!(cache.get("index_page:/").await, None);
    }

    #[tokio::test]
    async fn test_redis_cache_clear_prefix() {
        let Some(cache) = test_cache().await else {
            return;
        };

        cache.set("index_page:/", "a", None).await.unwrap();
        cache.set("keep:/", "b", None).await.unwrap();
        cache.clear_prefix("index_page").await.unwrap();

        assert!(!cache.exists("index_page:/").await);
        assert!(cache.exists("keep:/").await);
        cache.delete("keep:/").await.unwrap();
    }

    #[test]
    fn test_keys_are_namespaced() {
        assert_eq!(RedisConfig::new("redis://localhost").namespace, "folio");
    }
}
