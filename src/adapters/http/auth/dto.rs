//! HTTP DTOs for auth and profile endpoints.

use serde::{Deserialize, Serialize};

use crate::config::BackendPresence;
use crate::domain::foundation::AuthenticatedUser;
use crate::domain::foundation::Timestamp;
use crate::domain::profile::{SubscriptionTier, UserProfile};
use crate::ports::{RateLimitStatus, Session};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Fields are optional so a missing one is answered with the API's own 400.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequestBody {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignInRequestBody {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(alias = "displayName")]
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    #[serde(alias = "password")]
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(alias = "refresh_token")]
    pub refresh_token: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// The user fields returned by sign-up and sign-in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub email_confirmed: bool,
}

impl From<&AuthenticatedUser> for UserSummary {
    fn from(user: &AuthenticatedUser) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            email_confirmed: user.email_confirmed,
        }
    }
}

/// View of a profile row for API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub subscription_tier: SubscriptionTier,
    pub api_usage_count: u32,
    pub api_usage_limit: u32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&UserProfile> for ProfileView {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id.to_string(),
            email: profile.email.clone(),
            full_name: profile.full_name.clone(),
            avatar_url: profile.avatar_url.clone(),
            subscription_tier: profile.subscription_tier,
            api_usage_count: profile.api_usage_count,
            api_usage_limit: profile.api_usage_limit,
            created_at: profile.created_at.to_rfc3339(),
            updated_at: profile.updated_at.to_rfc3339(),
        }
    }
}

/// Response to sign-up and sign-in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSessionResponse {
    pub success: bool,
    pub message: String,
    pub user: UserSummary,
    pub profile: Option<ProfileView>,
    /// `None` after sign-up while email confirmation is pending.
    pub session: Option<Session>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserResponse {
    pub success: bool,
    pub user: AuthenticatedUser,
    pub profile: Option<ProfileView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub success: bool,
    pub message: String,
    pub profile: ProfileView,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub success: bool,
    pub session: Session,
    pub user: UserSummary,
}

/// Plain confirmation: `{"success": true, "message": ...}`.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageView {
    pub tier: SubscriptionTier,
    pub usage_count: u32,
    pub usage_limit: u32,
    pub remaining: u32,
    pub within_quota: bool,
}

impl From<&UserProfile> for UsageView {
    fn from(profile: &UserProfile) -> Self {
        Self {
            tier: profile.subscription_tier,
            usage_count: profile.api_usage_count,
            usage_limit: profile.api_usage_limit,
            remaining: profile.remaining_quota(),
            within_quota: profile.has_quota_remaining(),
        }
    }
}

/// The caller's current request window.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitView {
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: Timestamp,
    pub window_secs: u32,
}

impl From<RateLimitStatus> for RateLimitView {
    fn from(status: RateLimitStatus) -> Self {
        Self {
            limit: status.limit,
            remaining: status.remaining,
            reset_at: status.reset_at,
            window_secs: status.window_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageResponse {
    pub success: bool,
    pub usage: UsageView,
    /// `None` when the limiter backend could not be read.
    pub rate_limit: Option<RateLimitView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthHealthResponse {
    pub success: bool,
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: String,
    pub configuration: BackendPresence,
}
