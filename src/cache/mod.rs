pub mod keys;

use std::sync::Arc;

use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};

use crate::error::AppError;

/// Key-value cache with per-key TTLs. Strictly an optimization layer: callers
/// treat failures as misses, never as request failures.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), AppError>;
    async fn delete(&self, key: &str) -> Result<(), AppError>;
    async fn delete_matching(&self, pattern: &str) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct RedisBackend {
    redis: Arc<RedisClient>,
}

impl RedisBackend {
    pub fn new(redis: Arc<RedisClient>) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), AppError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn delete_matching(&self, pattern: &str) -> Result<(), AppError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let matched: Vec<String> = conn.keys(pattern).await?;
        if !matched.is_empty() {
            let _: () = conn.del(matched).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    /// In-memory stand-in for the redis backend; TTLs are accepted but not
    /// enforced, which is enough for cache-consistency tests.
    #[derive(Default)]
    pub struct MemoryBackend {
        entries: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl CacheBackend for MemoryBackend {
        async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
            Ok(self.entries.lock().await.get(key).cloned())
        }

        async fn set_ex(&self, key: &str, value: &str, _ttl_secs: u64) -> Result<(), AppError> {
            self.entries
                .lock()
                .await
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), AppError> {
            self.entries.lock().await.remove(key);
            Ok(())
        }

        async fn delete_matching(&self, pattern: &str) -> Result<(), AppError> {
            let prefix = pattern.trim_end_matches('*');
            self.entries
                .lock()
                .await
                .retain(|key, _| !key.starts_with(prefix));
            Ok(())
        }
    }
}
