//! `profiles` and `api_usage` tables.

use async_trait::async_trait;
use reqwest::Method;

use crate::domain::foundation::UserId;
use crate::domain::profile::{ApiUsage, ProfileUpdate, UserProfile};
use crate::ports::{ProfileRepository, RepositoryError};

use super::client::ClientHandle;
use super::models::{ApiUsageRow, ProfilePatch, ProfileRow, UsageCountPatch};
use super::rest::{convert, eq, execute, fetch_rows, RETURN_REPRESENTATION};

const PROFILES: &str = "profiles";
const API_USAGE: &str = "api_usage";

/// Attempts at the compare-and-set usage bump before giving up.
const USAGE_BUMP_ATTEMPTS: usize = 3;

/// Profile repository over the managed store.
#[derive(Debug, Clone)]
pub struct SupabaseProfileRepository {
    handle: ClientHandle,
}

impl SupabaseProfileRepository {
    pub fn new(handle: ClientHandle) -> Self {
        Self { handle }
    }

    fn first(rows: Vec<ProfileRow>) -> Result<Option<UserProfile>, RepositoryError> {
        Ok(convert(rows, ProfileRow::into_profile)?.into_iter().next())
    }
}

#[async_trait]
impl ProfileRepository for SupabaseProfileRepository {
    async fn find(&self, user_id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let request = self
            .handle
            .rest(Method::GET, PROFILES)
            .query(&[("id", eq(user_id)), ("select", "*".to_string())]);

        Self::first(fetch_rows(request, "profile.find").await?)
    }

    async fn create_if_absent(&self, profile: &UserProfile) -> Result<UserProfile, RepositoryError> {
        let request = self
            .handle
            .rest(Method::POST, PROFILES)
            .query(&[("on_conflict", "id")])
            .header(
                "Prefer",
                format!("resolution=ignore-duplicates,{}", RETURN_REPRESENTATION),
            )
            .json(&[ProfileRow::from(profile)]);

        // An ignored duplicate returns no rows; the existing row wins.
        if let Some(created) = Self::first(fetch_rows(request, "profile.create").await?)? {
            return Ok(created);
        }

        self.find(&profile.id).await?.ok_or_else(|| {
            RepositoryError::decode(format!(
                "profile {} neither inserted nor found",
                profile.id
            ))
        })
    }

    async fn update(
        &self,
        user_id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<UserProfile>, RepositoryError> {
        let request = self
            .handle
            .rest(Method::PATCH, PROFILES)
            .query(&[("id", eq(user_id))])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&ProfilePatch::from(update));

        Self::first(fetch_rows(request, "profile.update").await?)
    }

    async fn record_usage(&self, usage: &ApiUsage) -> Result<bool, RepositoryError> {
        let mut bumped = false;

        for _ in 0..USAGE_BUMP_ATTEMPTS {
            let Some(profile) = self.find(&usage.user_id).await? else {
                return Ok(false);
            };

            // Compare-and-set on the count we read.
            let request = self
                .handle
                .rest(Method::PATCH, PROFILES)
                .query(&[
                    ("id", eq(&usage.user_id)),
                    ("api_usage_count", eq(profile.api_usage_count)),
                ])
                .header("Prefer", RETURN_REPRESENTATION)
                .json(&UsageCountPatch {
                    api_usage_count: profile.api_usage_count as i64 + 1,
                });

            let rows: Vec<ProfileRow> = fetch_rows(request, "profile.bump_usage").await?;
            if !rows.is_empty() {
                bumped = true;
                break;
            }
            tracing::debug!(user_id = %usage.user_id, "Usage count changed concurrently, re-reading");
        }

        if !bumped {
            tracing::warn!(user_id = %usage.user_id, "Usage count not incremented after contention");
        }

        let request = self
            .handle
            .rest(Method::POST, API_USAGE)
            .header("Prefer", "return=minimal")
            .json(&ApiUsageRow::from(usage));
        execute(request, "api_usage.insert").await?;

        Ok(bumped)
    }
}
