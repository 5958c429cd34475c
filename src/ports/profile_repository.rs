//! ProfileRepository port for profile persistence and usage accounting.

use async_trait::async_trait;

use crate::domain::foundation::UserId;
use crate::domain::profile::{ApiUsage, ProfileUpdate, UserProfile};

use super::RepositoryError;

/// Profile rows and the usage counters stored on them.
///
/// Lookups distinguish "no row" (`Ok(None)`) from "store failed" (`Err`).
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Find the profile keyed by `user_id`.
    async fn find(&self, user_id: &UserId) -> Result<Option<UserProfile>, RepositoryError>;

    /// Insert `profile` unless a row with its id exists, then return the stored row.
    ///
    /// Must be idempotent: a database trigger may create the same row
    /// concurrently, and that row wins.
    async fn create_if_absent(&self, profile: &UserProfile) -> Result<UserProfile, RepositoryError>;

    /// Apply a partial update. `Ok(None)` when the profile does not exist.
    async fn update(
        &self,
        user_id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<UserProfile>, RepositoryError>;

    /// Append `usage` to the usage log and bump the profile's usage count.
    ///
    /// Returns `false` when no profile exists for the user.
    async fn record_usage(&self, usage: &ApiUsage) -> Result<bool, RepositoryError>;

    /// True iff the user's usage count is below their limit.
    ///
    /// A missing profile has no quota.
    async fn check_quota(&self, user_id: &UserId) -> Result<bool, RepositoryError> {
        Ok(self
            .find(user_id)
            .await?
            .map(|p| p.has_quota_remaining())
            .unwrap_or(false))
    }
}
