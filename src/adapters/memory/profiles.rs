//! In-memory profile repository.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::UserId;
use crate::domain::profile::{ApiUsage, ProfileUpdate, UserProfile};
use crate::ports::{ProfileRepository, RepositoryError};

use super::guard;

#[derive(Debug, Default)]
struct State {
    profiles: HashMap<UserId, UserProfile>,
    usage_log: Vec<ApiUsage>,
    force_error: Option<RepositoryError>,
}

#[derive(Debug, Default)]
pub struct InMemoryProfileRepository {
    state: Mutex<State>,
    calls: AtomicUsize,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(self, profile: UserProfile) -> Self {
        self.insert(profile);
        self
    }

    /// Forces every call to fail with `error`.
    pub fn with_error(self, error: RepositoryError) -> Self {
        guard(&self.state).force_error = Some(error);
        self
    }

    /// Stores `profile`, replacing any existing row, as a database trigger would.
    pub fn insert(&self, profile: UserProfile) {
        guard(&self.state).profiles.insert(profile.id.clone(), profile);
    }

    pub fn get(&self, user_id: &UserId) -> Option<UserProfile> {
        guard(&self.state).profiles.get(user_id).cloned()
    }

    pub fn usage_log(&self) -> Vec<ApiUsage> {
        guard(&self.state).usage_log.clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<std::sync::MutexGuard<'_, State>, RepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let state = guard(&self.state);
        match &state.force_error {
            Some(error) => Err(error.clone()),
            None => Ok(state),
        }
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find(&self, user_id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let state = self.begin()?;
        Ok(state.profiles.get(user_id).cloned())
    }

    async fn create_if_absent(&self, profile: &UserProfile) -> Result<UserProfile, RepositoryError> {
        let mut state = self.begin()?;
        Ok(state
            .profiles
            .entry(profile.id.clone())
            .or_insert_with(|| profile.clone())
            .clone())
    }

    async fn update(
        &self,
        user_id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<UserProfile>, RepositoryError> {
        let mut state = self.begin()?;
        Ok(state.profiles.get_mut(user_id).map(|profile| {
            update.apply_to(profile);
            profile.clone()
        }))
    }

    async fn record_usage(&self, usage: &ApiUsage) -> Result<bool, RepositoryError> {
        let mut state = self.begin()?;
        let Some(profile) = state.profiles.get_mut(&usage.user_id) else {
            return Ok(false);
        };
        profile.api_usage_count = profile.api_usage_count.saturating_add(1);
        state.usage_log.push(usage.clone());
        Ok(true)
    }
}
