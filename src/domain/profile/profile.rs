//! User profile entity and its partial update.

use crate::domain::foundation::{AuthenticatedUser, Timestamp, UserId, ValidationError};

use super::SubscriptionTier;

pub const MAX_FULL_NAME_LEN: usize = 100;
pub const MAX_AVATAR_URL_LEN: usize = 2048;

/// Profile row kept 1:1 with the auth provider's user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub subscription_tier: SubscriptionTier,
    pub api_usage_count: u32,
    pub api_usage_limit: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UserProfile {
    /// Builds the initial profile for a freshly signed-up user.
    pub fn for_new_user(user: &AuthenticatedUser) -> Self {
        let now = Timestamp::now();
        let tier = SubscriptionTier::default();
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            full_name: user.display_name.clone(),
            avatar_url: None,
            subscription_tier: tier,
            api_usage_count: 0,
            api_usage_limit: tier.default_usage_limit(),
            created_at: now,
            updated_at: now,
        }
    }

    /// True iff usage is strictly below the limit.
    pub fn has_quota_remaining(&self) -> bool {
        self.api_usage_count < self.api_usage_limit
    }

    /// Calls left before the quota is exhausted.
    pub fn remaining_quota(&self) -> u32 {
        self.api_usage_limit.saturating_sub(self.api_usage_count)
    }
}

/// Partial profile update. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub updated_at: Timestamp,
}

impl ProfileUpdate {
    /// Validates the supplied fields and stamps the update time.
    pub fn new(
        full_name: Option<String>,
        avatar_url: Option<String>,
    ) -> Result<Self, ValidationError> {
        let full_name = full_name.map(|n| n.trim().to_string());
        if let Some(name) = &full_name {
            if name.chars().count() > MAX_FULL_NAME_LEN {
                return Err(ValidationError::too_long("fullName", MAX_FULL_NAME_LEN));
            }
        }

        let avatar_url = avatar_url.map(|u| u.trim().to_string());
        if let Some(url) = &avatar_url {
            if url.len() > MAX_AVATAR_URL_LEN {
                return Err(ValidationError::too_long("avatarUrl", MAX_AVATAR_URL_LEN));
            }
            if !url.is_empty() && !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ValidationError::invalid_format(
                    "avatarUrl",
                    "must be an http(s) URL",
                ));
            }
        }

        Ok(Self {
            full_name,
            avatar_url,
            updated_at: Timestamp::now(),
        })
    }

    /// Merges this update into `profile`, leaving unspecified fields alone.
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(name) = &self.full_name {
            profile.full_name = Some(name.clone());
        }
        if let Some(url) = &self.avatar_url {
            profile.avatar_url = Some(url.clone());
        }
        profile.updated_at = self.updated_at;
    }
}
