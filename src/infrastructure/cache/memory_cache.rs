//! In-process cache backed by `DashMap`.
//!
//! Backs the test harness. Values and windows live only as long as the
//! process; expired ones are pruned as the cache is used.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::cache_service::{Cache, WindowHit};
use crate::shared::error::AppError;

#[derive(Debug)]
struct Window {
    length: Duration,
    hits: VecDeque<Instant>,
}

impl Window {
    fn is_expired(&self, now: Instant) -> bool {
        self.hits
            .back()
            .map_or(true, |last| now.duration_since(*last) >= self.length)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: DashMap<String, (String, Instant)>,
    windows: DashMap<String, Window>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn prune_windows(&self, now: Instant) {
        self.windows.retain(|_, window| !window.is_expired(now));
    }

    /// Tracked rate limit windows.
    pub fn window_count(&self) -> usize {
        self.windows.len()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, AppError> {
        let now = Instant::now();
        let value = self
            .entries
            .get(key)
            .filter(|entry| entry.1 > now)
            .map(|entry| entry.0.clone());

        if value.is_none() {
            self.entries.remove_if(key, |_, (_, expires)| *expires <= now);
        }
        Ok(value)
    }

    async fn set_raw_ex(&self, key: &str, value: String, seconds: u64) -> Result<(), AppError> {
        let now = Instant::now();
        self.entries.retain(|_, (_, expires)| *expires > now);
        self.entries
            .insert(key.to_string(), (value, now + Duration::from_secs(seconds)));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, AppError> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<u64, AppError> {
        Ok(keys
            .iter()
            .filter(|k| self.entries.remove(k.as_str()).is_some())
            .count() as u64)
    }

    async fn sliding_window_hit(
        &self,
        key: &str,
        max_requests: u32,
        window_seconds: u64,
    ) -> Result<WindowHit, AppError> {
        let now = Instant::now();
        let window = Duration::from_secs(window_seconds);
        self.prune_windows(now);

        let mut entry = self.windows.entry(key.to_string()).or_insert_with(|| Window {
            length: window,
            hits: VecDeque::new(),
        });
        entry.length = window;
        let hits = &mut entry.hits;

        while hits.front().is_some_and(|t| now.duration_since(*t) >= window) {
            hits.pop_front();
        }

        if (hits.len() as u32) < max_requests {
            hits.push_back(now);
            return Ok(WindowHit {
                allowed: true,
                count: hits.len() as u32,
                retry_after_ms: 0,
            });
        }

        let retry_after_ms = hits
            .front()
            .map(|oldest| window.saturating_sub(now.duration_since(*oldest)).as_millis() as i64)
            .unwrap_or_default();

        Ok(WindowHit {
            allowed: false,
            count: hits.len() as u32,
            retry_after_ms,
        })
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
