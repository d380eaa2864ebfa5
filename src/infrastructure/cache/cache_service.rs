//! Cache Service
//!
//! Cache trait and its Redis implementation.
//!
//! The trait is object safe and moves raw strings; typed access goes through
//! [`CacheExt`], which serializes values as JSON.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::shared::error::AppError;

/// Outcome of one sliding-window hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHit {
    pub allowed: bool,
    /// Requests counted in the window, including this one when allowed
    pub count: u32,
    /// Milliseconds until the oldest entry leaves the window
    pub retry_after_ms: i64,
}

/// Shared cache operations used by the auth middleware, the services and
/// the rate limiter.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Read a raw value.
    async fn get_raw(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Store a raw value with a TTL in seconds.
    async fn set_raw_ex(&self, key: &str, value: String, seconds: u64) -> Result<(), AppError>;

    /// Returns whether the key existed.
    async fn delete(&self, key: &str) -> Result<bool, AppError>;

    async fn delete_many(&self, keys: &[String]) -> Result<u64, AppError>;

    /// Record a request in the window at `key` when fewer than `max_requests`
    /// fall inside the last `window_seconds`.
    async fn sliding_window_hit(
        &self,
        key: &str,
        max_requests: u32,
        window_seconds: u64,
    ) -> Result<WindowHit, AppError>;

    /// Round-trip to the backing store.
    async fn ping(&self) -> Result<(), AppError>;
}

/// JSON helpers on top of [`Cache`].
#[async_trait]
pub trait CacheExt: Cache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, AppError> {
        match self.get_raw(key).await? {
            Some(data) => Ok(Some(deserialize(&data)?)),
            None => Ok(None),
        }
    }

    async fn set_ex<T: Serialize + Sync + Send>(
        &self,
        key: &str,
        value: &T,
        seconds: u64,
    ) -> Result<(), AppError> {
        let data = serialize(value)?;
        self.set_raw_ex(key, data, seconds).await
    }
}

impl<C: Cache + ?Sized> CacheExt for C {}

fn serialize<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value).map_err(|e| {
        warn!("Cache serialization error: {}", e);
        AppError::Internal(format!("Cache serialization failed: {}", e))
    })
}

fn deserialize<T: DeserializeOwned>(data: &str) -> Result<T, AppError> {
    serde_json::from_str(data).map_err(|e| {
        warn!("Cache deserialization error: {}", e);
        AppError::Internal(format!("Cache deserialization failed: {}", e))
    })
}

/// Sorted-set sliding window. Members are `now_ms:random`, scores are
/// timestamps in milliseconds.
const SLIDING_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local now_ms = tonumber(ARGV[1])
local window_start = tonumber(ARGV[2])
local max_requests = tonumber(ARGV[3])
local window_seconds = tonumber(ARGV[4])

redis.call('ZREMRANGEBYSCORE', key, '-inf', window_start)
local current_count = redis.call('ZCARD', key)

if current_count < max_requests then
    local member = now_ms .. ':' .. math.random(1000000)
    redis.call('ZADD', key, now_ms, member)
    redis.call('EXPIRE', key, window_seconds + 1)
    return {1, current_count + 1, 0}
else
    local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
    local retry_after = 0
    if oldest and #oldest >= 2 then
        retry_after = oldest[2] + (window_seconds * 1000) - now_ms
    end
    return {0, current_count, retry_after}
end
"#;

/// Redis-backed cache implementation.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    /// Key prefix for namespacing
    prefix: Arc<str>,
}

impl RedisCache {
    /// All keys are prefixed, e.g. `netrock:` turns `user:1` into
    /// `netrock:user:1`.
    pub fn with_prefix(conn: ConnectionManager, prefix: impl Into<Arc<str>>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
        }
    }

    fn format_key(&self, key: &str) -> String {
        format_key(&self.prefix, key)
    }
}

fn format_key(prefix: &str, key: &str) -> String {
    format!("{}{}", prefix, key)
}

#[async_trait]
impl Cache for RedisCache {
    #[instrument(skip(self), level = "debug")]
    async fn get_raw(&self, key: &str) -> Result<Option<String>, AppError> {
        let full_key = self.format_key(key);
        let mut conn = self.conn.clone();

        let result: Option<String> = conn.get(&full_key).await?;
        debug!(key = %full_key, hit = result.is_some(), "Cache get");

        Ok(result)
    }

    #[instrument(skip(self, value), level = "debug")]
    async fn set_raw_ex(&self, key: &str, value: String, seconds: u64) -> Result<(), AppError> {
        let full_key = self.format_key(key);
        let mut conn = self.conn.clone();

        let _: () = conn.set_ex(&full_key, value, seconds).await?;
        debug!(key = %full_key, ttl = seconds, "Cache set with expiry");

        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self, key: &str) -> Result<bool, AppError> {
        let full_key = self.format_key(key);
        let mut conn = self.conn.clone();

        let deleted: u64 = conn.del(&full_key).await?;
        debug!(key = %full_key, deleted = deleted > 0, "Cache delete");

        Ok(deleted > 0)
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete_many(&self, keys: &[String]) -> Result<u64, AppError> {
        if keys.is_empty() {
            return Ok(0);
        }

        let full_keys: Vec<String> = keys.iter().map(|k| self.format_key(k)).collect();
        let mut conn = self.conn.clone();

        let deleted: u64 = conn.del(full_keys.as_slice()).await?;
        debug!(count = deleted, "Cache delete many");

        Ok(deleted)
    }

    async fn sliding_window_hit(
        &self,
        key: &str,
        max_requests: u32,
        window_seconds: u64,
    ) -> Result<WindowHit, AppError> {
        let full_key = self.format_key(key);
        let now_ms = chrono::Utc::now().timestamp_millis();
        let window_start = now_ms - (window_seconds as i64 * 1000);
        let mut conn = self.conn.clone();

        let result: Vec<i64> = redis::Script::new(SLIDING_WINDOW_SCRIPT)
            .key(&full_key)
            .arg(now_ms)
            .arg(window_start)
            .arg(max_requests as i64)
            .arg(window_seconds as i64)
            .invoke_async(&mut conn)
            .await?;

        Ok(WindowHit {
            allowed: result.first().copied() == Some(1),
            count: result.get(1).copied().unwrap_or_default().max(0) as u32,
            retry_after_ms: result.get(2).copied().unwrap_or_default().max(0),
        })
    }

    async fn ping(&self) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}
