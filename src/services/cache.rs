use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use crate::config::CacheSettings;
use crate::models::{CandidateQuery, User};
use super::store::{StoreError, UserDirectory};

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// Multi-tier cache manager
///
/// L1 is an in-process moka cache. L2 is Redis and shared across instances;
/// without it the manager runs L1 only.
pub struct CacheManager {
    redis: Option<Arc<tokio::sync::Mutex<ConnectionManager>>>,
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    ttl_secs: u64,
}

impl CacheManager {
    /// Create a cache manager backed by Redis
    pub async fn new(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;

        Ok(Self {
            redis: Some(Arc::new(tokio::sync::Mutex::new(redis))),
            l1_cache: build_l1(l1_size, ttl_secs),
            ttl_secs,
        })
    }

    /// L1-only cache manager
    pub fn in_memory(l1_size: u64, ttl_secs: u64) -> Self {
        Self {
            redis: None,
            l1_cache: build_l1(l1_size, ttl_secs),
            ttl_secs,
        }
    }

    pub async fn from_settings(settings: &CacheSettings) -> Result<Self, CacheError> {
        match settings.redis_url.as_deref() {
            Some(url) => Self::new(url, settings.l1_cache_size, settings.ttl_secs).await,
            None => Ok(Self::in_memory(settings.l1_cache_size, settings.ttl_secs)),
        }
    }

    pub fn has_shared_tier(&self) -> bool {
        self.redis.is_some()
    }

    /// Get a value from cache (L1 first, then L2)
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        if let Some(bytes) = self.l1_cache.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(serde_json::from_slice(&bytes)?);
        }

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let value: Option<String> = redis::cmd("GET")
                .arg(key)
                .query_async(&mut *conn)
                .await?;
            drop(conn);

            if let Some(json) = value {
                tracing::trace!("L2 cache hit: {}", key);
                self.l1_cache.insert(key.to_string(), json.as_bytes().to_vec()).await;
                return Ok(serde_json::from_str(&json)?);
            }
        }

        tracing::trace!("Cache miss: {}", key);
        Err(CacheError::CacheMiss(key.to_string()))
    }

    /// Set a value in every tier
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value)?;
        self.l1_cache.insert(key.to_string(), json.as_bytes().to_vec()).await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            redis::cmd("SETEX")
                .arg(key)
                .arg(self.ttl_secs)
                .arg(json)
                .query_async::<()>(&mut *conn)
                .await?;
        }

        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    /// Delete a value from every tier
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.l1_cache.invalidate(key).await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            redis::cmd("DEL")
                .arg(key)
                .query_async::<()>(&mut *conn)
                .await?;
        }
        Ok(())
    }
}

fn build_l1(l1_size: u64, ttl_secs: u64) -> moka::future::Cache<String, Vec<u8>> {
    moka::future::CacheBuilder::new(l1_size)
        .time_to_live(Duration::from_secs(ttl_secs))
        .build()
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    pub fn user(user_id: &str) -> String {
        format!("user:{}", user_id)
    }
}

/// Read-through user cache in front of another directory
///
/// Only single-user lookups are cached. Candidate queries always hit the
/// inner directory because their exclusion sets change on every swipe.
/// Cache failures degrade to the inner directory.
pub struct CachedUserDirectory<D> {
    inner: D,
    cache: Arc<CacheManager>,
}

impl<D: UserDirectory> CachedUserDirectory<D> {
    pub fn new(inner: D, cache: Arc<CacheManager>) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    /// Drop a user's cached record after it changes upstream
    pub async fn invalidate(&self, user_id: &str) {
        if let Err(e) = self.cache.delete(&CacheKey::user(user_id)).await {
            tracing::warn!("Failed to invalidate cached user {}: {}", user_id, e);
        }
    }
}

#[async_trait]
impl<D: UserDirectory> UserDirectory for CachedUserDirectory<D> {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let key = CacheKey::user(user_id);

        match self.cache.get::<User>(&key).await {
            Ok(user) => return Ok(Some(user)),
            Err(CacheError::CacheMiss(_)) => {}
            Err(e) => tracing::warn!("User cache read failed for {}: {}", user_id, e),
        }

        let user = self.inner.get_user(user_id).await?;

        if let Some(user) = &user {
            if let Err(e) = self.cache.set(&key, user).await {
                tracing::warn!("User cache write failed for {}: {}", user_id, e);
            }
        }

        Ok(user)
    }

    async fn query_candidates(&self, query: &CandidateQuery) -> Result<Vec<User>, StoreError> {
        self.inner.query_candidates(query).await
    }
}
