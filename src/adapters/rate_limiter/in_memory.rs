//! Process-local limiter for tests and single-instance deployments.
//!
//! Each user gets one fixed window keyed the same way as the Redis adapter.
//! Closed windows are swept at most once per window length, so idle users do
//! not accumulate. Nothing is shared across processes and counters are lost
//! on restart.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::Timestamp;
use crate::ports::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitStatus, RateLimiter,
};

use super::config::RateLimitConfig;

#[derive(Debug, Clone)]
pub struct InMemoryRateLimiter {
    config: RateLimitConfig,
    windows: Arc<RwLock<Windows>>,
}

#[derive(Debug, Default)]
struct Windows {
    by_key: HashMap<String, Window>,
    swept_at: u64,
}

impl Windows {
    /// Drops closed windows once `every` seconds have passed since the last sweep.
    fn sweep(&mut self, now: u64, every: u32) {
        if now < self.swept_at + u64::from(every) {
            return;
        }
        self.by_key.retain(|_, window| window.is_open(now));
        self.swept_at = now;
    }
}

/// Requests seen since `opened_at`, valid for `length` seconds.
#[derive(Debug, Clone, Copy)]
struct Window {
    opened_at: u64,
    length: u32,
    hits: u32,
}

impl Window {
    fn open(now: u64, length: u32) -> Self {
        Self {
            opened_at: now,
            length,
            hits: 0,
        }
    }

    fn closes_at(&self) -> u64 {
        self.opened_at + u64::from(self.length)
    }

    fn is_open(&self, now: u64) -> bool {
        now < self.closes_at()
    }

    fn status(&self, limit: u32) -> RateLimitStatus {
        RateLimitStatus {
            limit,
            remaining: limit.saturating_sub(self.hits),
            reset_at: Timestamp::from_unix_secs(self.closes_at()),
            window_secs: self.length,
        }
    }
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(RwLock::new(Windows::default())),
        }
    }

    /// Per-tier defaults: 20, 100 and 300 requests a minute.
    pub fn with_defaults() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
        let (limit, length) = self.config.limits_for_tier(key.tier);
        let now = Timestamp::now().as_unix_secs();

        let mut windows = self.windows.write().await;
        windows.sweep(now, length);
        let window = windows
            .by_key
            .entry(key.to_redis_key())
            .or_insert_with(|| Window::open(now, length));
        if !window.is_open(now) {
            *window = Window::open(now, length);
        }

        if window.hits >= limit {
            let wait = window.closes_at().saturating_sub(now);
            return Ok(RateLimitResult::Denied(RateLimitDenied::new(
                key.tier,
                limit,
                u32::try_from(wait).unwrap_or(u32::MAX),
            )));
        }

        window.hits += 1;
        Ok(RateLimitResult::Allowed(window.status(limit)))
    }

    async fn status(&self, key: RateLimitKey) -> Result<RateLimitStatus, RateLimitError> {
        let (limit, length) = self.config.limits_for_tier(key.tier);
        let now = Timestamp::now().as_unix_secs();

        let windows = self.windows.read().await;
        let window = windows
            .by_key
            .get(&key.to_redis_key())
            .filter(|w| w.is_open(now))
            .copied()
            .unwrap_or_else(|| Window::open(now, length));

        Ok(window.status(limit))
    }
}
