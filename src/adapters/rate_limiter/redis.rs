//! Redis-backed rate limiter for multi-server deployments.
//!
//! Uses a fixed-window counter with Redis INCR + EXPIRE.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::Timestamp;
use crate::ports::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitStatus, RateLimiter,
};

use super::config::RateLimitConfig;

/// Redis-backed rate limiter.
///
/// 1. INCR the key
/// 2. Read its TTL; a counter without one gets EXPIRE for a full window
/// 3. If the count exceeds the tier's limit, deny
///
/// Step 2 also repairs a counter whose first EXPIRE was lost, which would
/// otherwise never reset. Requests can briefly exceed limits at window
/// boundaries.
#[derive(Clone)]
pub struct RedisRateLimiter {
    conn: MultiplexedConnection,
    config: RateLimitConfig,
}

impl RedisRateLimiter {
    pub fn new(conn: MultiplexedConnection, config: RateLimitConfig) -> Self {
        Self { conn, config }
    }

    /// Open a multiplexed connection to `url` and build a limiter on it.
    pub async fn connect(url: &str, config: RateLimitConfig) -> Result<Self, RateLimitError> {
        let client = redis::Client::open(url).map_err(unavailable)?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(unavailable)?;
        Ok(Self::new(conn, config))
    }

    async fn window_ttl(
        conn: &mut MultiplexedConnection,
        key: &str,
    ) -> Result<WindowTtl, RateLimitError> {
        let ttl: i64 = conn.ttl(key).await.map_err(unavailable)?;
        Ok(WindowTtl::from_redis(ttl))
    }
}

/// A counter key's TTL as reported by Redis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowTtl {
    /// Seconds until the window resets.
    Running(u64),
    /// The key exists without an expiry (TTL -1).
    Unbounded,
    /// The key does not exist (TTL -2).
    Absent,
}

impl WindowTtl {
    fn from_redis(ttl: i64) -> Self {
        match ttl {
            -1 => Self::Unbounded,
            t if t >= 0 => Self::Running(t as u64),
            _ => Self::Absent,
        }
    }
}

fn unavailable(e: redis::RedisError) -> RateLimitError {
    RateLimitError::Unavailable(e.to_string())
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
        let redis_key = key.to_redis_key();
        let (limit, window_secs) = self.config.limits_for_tier(key.tier);

        let mut conn = self.conn.clone();

        let count: i64 = conn.incr(&redis_key, 1_i64).await.map_err(unavailable)?;

        let reset_secs = match Self::window_ttl(&mut conn, &redis_key).await? {
            WindowTtl::Running(secs) => secs,
            WindowTtl::Unbounded | WindowTtl::Absent => {
                conn.expire::<_, ()>(&redis_key, window_secs as i64)
                    .await
                    .map_err(unavailable)?;
                window_secs as u64
            }
        };
        let reset_at = Timestamp::now().plus_secs(reset_secs);

        if count > limit as i64 {
            return Ok(RateLimitResult::Denied(RateLimitDenied::new(
                key.tier,
                limit,
                reset_secs as u32,
            )));
        }

        Ok(RateLimitResult::Allowed(RateLimitStatus {
            limit,
            remaining: limit.saturating_sub(count as u32),
            reset_at,
            window_secs,
        }))
    }

    async fn status(&self, key: RateLimitKey) -> Result<RateLimitStatus, RateLimitError> {
        let redis_key = key.to_redis_key();
        let (limit, window_secs) = self.config.limits_for_tier(key.tier);

        let mut conn = self.conn.clone();

        let count: Option<i64> = conn.get(&redis_key).await.map_err(unavailable)?;
        let count = count.unwrap_or(0).max(0) as u32;

        let reset_secs = match Self::window_ttl(&mut conn, &redis_key).await? {
            WindowTtl::Running(secs) => secs,
            WindowTtl::Unbounded | WindowTtl::Absent => window_secs as u64,
        };

        Ok(RateLimitStatus {
            limit,
            remaining: limit.saturating_sub(count),
            reset_at: Timestamp::now().plus_secs(reset_secs),
            window_secs,
        })
    }
}

impl std::fmt::Debug for RedisRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
