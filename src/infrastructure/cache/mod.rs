//! Cache Module
//!
//! Redis connection management and caching utilities.
//!
//! ```text
//! +-------------------+
//! |   Cache Trait     |  <-- shared by middleware and services
//! +-------------------+
//!      |         |
//!      v         v
//! RedisCache  InMemoryCache
//! ```

mod cache_service;
mod memory_cache;

pub use cache_service::{Cache, CacheExt, RedisCache, WindowHit};
pub use memory_cache::InMemoryCache;

use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{info, instrument};

use crate::config::RedisSettings;

/// Creates a Redis connection manager with automatic reconnection.
#[instrument(skip(settings))]
pub async fn create_redis_client(
    settings: &RedisSettings,
) -> Result<ConnectionManager, redis::RedisError> {
    info!("Connecting to Redis...");
    let client = Client::open(settings.url.as_str())?;
    let manager = ConnectionManager::new(client).await?;
    info!("Redis connection established");
    Ok(manager)
}

/// Creates a `RedisCache` from configuration settings.
pub async fn create_redis_cache(settings: &RedisSettings) -> Result<RedisCache, redis::RedisError> {
    let conn = create_redis_client(settings).await?;
    Ok(RedisCache::with_prefix(conn, keys::NAMESPACE))
}

/// Cache key builders.
pub mod keys {
    /// Prepended to every Redis key
    pub const NAMESPACE: &str = "netrock:";

    pub const SECURITY_STAMP: &str = "security_stamp:";
    pub const USER: &str = "user:";
    pub const RATE_LIMIT: &str = "rl:";

    /// TTL for the security stamp consulted on every authenticated request
    pub const SECURITY_STAMP_TTL_SECS: u64 = 300;

    /// TTL for the cached profile
    pub const USER_TTL_SECS: u64 = 600;

    #[inline]
    pub fn security_stamp(user_id: impl std::fmt::Display) -> String {
        format!("{}{}", SECURITY_STAMP, user_id)
    }

    #[inline]
    pub fn user(user_id: impl std::fmt::Display) -> String {
        format!("{}{}", USER, user_id)
    }

    #[inline]
    pub fn rate_limit(policy: &str, identifier: &str) -> String {
        format!("{}{}:{}", RATE_LIMIT, policy, identifier)
    }

    /// Every entry cached for a user.
    pub fn all_for_user(user_id: impl std::fmt::Display + Copy) -> Vec<String> {
        vec![security_stamp(user_id), user(user_id)]
    }
}
