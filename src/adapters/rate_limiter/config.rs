//! Rate limit configuration types.
//!
//! Maps each subscription tier to its request threshold per window.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::RateLimitSettings;
use crate::domain::profile::SubscriptionTier;

/// Threshold used when a tier has no entry in the table.
const FALLBACK_REQUESTS_PER_WINDOW: u32 = 20;

/// Complete rate limit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Window duration in seconds.
    pub window_secs: u32,
    /// Per-tier request thresholds.
    pub per_tier: HashMap<SubscriptionTier, TierRateLimits>,
}

/// Rate limits for a specific subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRateLimits {
    /// Metered requests allowed per window.
    pub requests_per_window: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::from(&RateLimitSettings::default())
    }
}

impl From<&RateLimitSettings> for RateLimitConfig {
    fn from(settings: &RateLimitSettings) -> Self {
        let mut per_tier = HashMap::new();
        per_tier.insert(
            SubscriptionTier::Free,
            TierRateLimits {
                requests_per_window: settings.free_per_minute,
            },
        );
        per_tier.insert(
            SubscriptionTier::Pro,
            TierRateLimits {
                requests_per_window: settings.pro_per_minute,
            },
        );
        per_tier.insert(
            SubscriptionTier::Premium,
            TierRateLimits {
                requests_per_window: settings.premium_per_minute,
            },
        );

        Self {
            window_secs: 60,
            per_tier,
        }
    }
}

impl RateLimitConfig {
    /// Get the (limit, window_secs) for a tier.
    ///
    /// Falls back to the Free tier, then to a fixed conservative threshold.
    pub fn limits_for_tier(&self, tier: SubscriptionTier) -> (u32, u32) {
        let limit = self
            .per_tier
            .get(&tier)
            .or_else(|| self.per_tier.get(&SubscriptionTier::Free))
            .map(|l| l.requests_per_window)
            .unwrap_or(FALLBACK_REQUESTS_PER_WINDOW);
        (limit, self.window_secs)
    }

    /// Override one tier's threshold.
    pub fn with_tier_limit(mut self, tier: SubscriptionTier, requests_per_window: u32) -> Self {
        self.per_tier
            .insert(tier, TierRateLimits { requests_per_window });
        self
    }
}
