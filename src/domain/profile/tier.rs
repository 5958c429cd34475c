//! Subscription tier definitions.

use serde::{Deserialize, Deserializer, Serialize};

/// Subscription tier stored on the profile.
///
/// Controls rate-limit thresholds and the default API usage limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Pro,
    Premium,
}

impl SubscriptionTier {
    /// Parses a stored tier name. Unknown names fall back to `Free`.
    pub fn from_str_lossy(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pro" => SubscriptionTier::Pro,
            "premium" => SubscriptionTier::Premium,
            _ => SubscriptionTier::Free,
        }
    }

    /// Returns the stored name for this tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Pro => "pro",
            SubscriptionTier::Premium => "premium",
        }
    }

    /// API usage limit given to a profile created on this tier.
    pub fn default_usage_limit(&self) -> u32 {
        match self {
            SubscriptionTier::Free => 100,
            SubscriptionTier::Pro => 1_000,
            SubscriptionTier::Premium => 10_000,
        }
    }
}

impl<'de> Deserialize<'de> for SubscriptionTier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .map(SubscriptionTier::from_str_lossy)
            .unwrap_or_default())
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
