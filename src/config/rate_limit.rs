//! Rate limit configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Per-tier request thresholds and the optional shared counter store.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    /// Redis URL for shared counters. In-memory counters are used when unset.
    pub redis_url: Option<String>,

    #[serde(default = "default_free")]
    pub free_per_minute: u32,

    #[serde(default = "default_pro")]
    pub pro_per_minute: u32,

    #[serde(default = "default_premium")]
    pub premium_per_minute: u32,
}

impl RateLimitSettings {
    /// Validate rate limit configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = &self.redis_url {
            if !url.starts_with("redis://") && !url.starts_with("rediss://") {
                return Err(ValidationError::InvalidRedisUrl);
            }
        }
        for (tier, limit) in [
            ("free", self.free_per_minute),
            ("pro", self.pro_per_minute),
            ("premium", self.premium_per_minute),
        ] {
            if limit == 0 {
                return Err(ValidationError::InvalidRateLimit(tier));
            }
        }
        Ok(())
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            redis_url: None,
            free_per_minute: default_free(),
            pro_per_minute: default_pro(),
            premium_per_minute: default_premium(),
        }
    }
}

fn default_free() -> u32 {
    20
}

fn default_pro() -> u32 {
    100
}

fn default_premium() -> u32 {
    300
}
