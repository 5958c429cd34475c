//! Rate limiting port for per-user request frequency.
//!
//! Implementations count requests in fixed windows. The tier on the key
//! selects the threshold; it is not part of the counter's identity, so a
//! user who upgrades mid-window keeps their count.

use async_trait::async_trait;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::profile::SubscriptionTier;

/// Port for rate limiting operations.
///
/// Implementations must be safe under concurrent checks of the same key.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count one request against `key` and report whether it may proceed.
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError>;

    /// Current window status without counting a request.
    async fn status(&self, key: RateLimitKey) -> Result<RateLimitStatus, RateLimitError>;
}

/// Key identifying whose requests are counted and at which tier.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct RateLimitKey {
    pub identifier: String,
    pub tier: SubscriptionTier,
}

impl RateLimitKey {
    /// Creates a per-user key.
    pub fn user(user_id: &UserId, tier: SubscriptionTier) -> Self {
        Self {
            identifier: user_id.to_string(),
            tier,
        }
    }

    /// Storage key for the counter.
    pub fn to_redis_key(&self) -> String {
        format!("ratelimit:user:{}", self.identifier)
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    /// Request is allowed; includes current status.
    Allowed(RateLimitStatus),
    /// Request is denied; includes denial details.
    Denied(RateLimitDenied),
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed(_))
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, RateLimitResult::Denied(_))
    }
}

/// Current rate limit status.
#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    /// Maximum requests allowed in the window.
    pub limit: u32,
    /// Remaining requests in the current window.
    pub remaining: u32,
    /// When the current window resets.
    pub reset_at: Timestamp,
    /// Window duration in seconds.
    pub window_secs: u32,
}

/// Details of a rate limit denial.
#[derive(Debug, Clone)]
pub struct RateLimitDenied {
    pub limit: u32,
    /// Seconds until the client should retry.
    pub retry_after_secs: u32,
    pub tier: SubscriptionTier,
    pub message: String,
}

impl RateLimitDenied {
    /// Builds a denial; a retry hint below one second is rounded up.
    pub fn new(tier: SubscriptionTier, limit: u32, retry_after_secs: u32) -> Self {
        let retry_after_secs = retry_after_secs.max(1);
        Self {
            limit,
            retry_after_secs,
            tier,
            message: format!(
                "Too many requests for the {} tier. Retry after {} seconds.",
                tier, retry_after_secs
            ),
        }
    }
}

/// Errors that can occur during rate limiting operations.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// Rate limiter backend is unavailable.
    #[error("rate limiter unavailable: {0}")]
    Unavailable(String),
}
