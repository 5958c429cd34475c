//! In-memory auth provider and session validator.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::{
    AuthProvider, AuthProviderError, Session, SessionGrant, SessionValidator, SignUpOutcome,
    SignUpRequest,
};

use super::guard;

const MIN_PASSWORD_LEN: usize = 6;
const SESSION_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
struct Account {
    user: AuthenticatedUser,
    password: String,
}

#[derive(Debug, Default)]
struct State {
    /// Keyed by lowercased email.
    accounts: HashMap<String, Account>,
    access_tokens: HashMap<String, UserId>,
    refresh_tokens: HashMap<String, UserId>,
    reset_requests: Vec<(String, String)>,
    force_error: Option<AuthProviderError>,
    force_validation_error: Option<AuthError>,
}

/// Auth provider keeping accounts and sessions in memory.
///
/// Mirrors the managed service's observable behavior: duplicate emails and
/// short passwords are rejected, bad credentials are rejected with the
/// service's wording, and each session gets a fresh access/refresh pair.
#[derive(Debug)]
pub struct InMemoryAuthProvider {
    state: Mutex<State>,
    auto_confirm: bool,
    calls: AtomicUsize,
}

impl Default for InMemoryAuthProvider {
    fn default() -> Self {
        Self {
            state: Mutex::new(State::default()),
            auto_confirm: true,
            calls: AtomicUsize::new(0),
        }
    }
}

impl InMemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sign-ups return no session until the email is confirmed.
    pub fn requiring_email_confirmation() -> Self {
        Self {
            auto_confirm: false,
            ..Self::default()
        }
    }

    /// Registers an account and returns the provider with it.
    pub fn with_account(self, email: &str, password: &str, full_name: Option<&str>) -> Self {
        self.add_account(email, password, full_name);
        self
    }

    /// Forces every provider call to fail with `error`.
    pub fn with_error(self, error: AuthProviderError) -> Self {
        guard(&self.state).force_error = Some(error);
        self
    }

    /// Forces every token validation to fail with `error`.
    pub fn with_validation_error(self, error: AuthError) -> Self {
        guard(&self.state).force_validation_error = Some(error);
        self
    }

    /// Registers an account at runtime.
    pub fn add_account(&self, email: &str, password: &str, full_name: Option<&str>) -> AuthenticatedUser {
        let user = AuthenticatedUser::new(
            UserId::from_uuid(Uuid::new_v4()),
            email,
            full_name.map(str::to_string),
            self.auto_confirm,
        );
        guard(&self.state).accounts.insert(
            email.to_lowercase(),
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        user
    }

    /// Issues a session for a registered account without counting a call.
    pub fn issue_session(&self, email: &str) -> Option<SessionGrant> {
        let mut state = guard(&self.state);
        let user = state.accounts.get(&email.to_lowercase())?.user.clone();
        Some(Self::open_session(&mut state, user))
    }

    /// Number of `AuthProvider` calls received. Token validation is not counted.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Password-reset requests received, as `(email, redirect_to)`.
    pub fn reset_requests(&self) -> Vec<(String, String)> {
        guard(&self.state).reset_requests.clone()
    }

    pub fn password_of(&self, email: &str) -> Option<String> {
        guard(&self.state)
            .accounts
            .get(&email.to_lowercase())
            .map(|a| a.password.clone())
    }

    fn begin(&self) -> Result<(), AuthProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &guard(&self.state).force_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn open_session(state: &mut State, user: AuthenticatedUser) -> SessionGrant {
        let access_token = format!("access-{}", Uuid::new_v4());
        let refresh_token = format!("refresh-{}", Uuid::new_v4());
        state
            .access_tokens
            .insert(access_token.clone(), user.id.clone());
        state
            .refresh_tokens
            .insert(refresh_token.clone(), user.id.clone());

        let expires_at = crate::domain::foundation::Timestamp::now()
            .plus_secs(SESSION_TTL_SECS)
            .as_unix_secs();
        SessionGrant {
            user,
            session: Session {
                access_token,
                refresh_token,
                expires_in: SESSION_TTL_SECS,
                expires_at: Some(expires_at),
                token_type: "bearer".to_string(),
            },
        }
    }

    fn user_by_id(state: &State, user_id: &UserId) -> Option<AuthenticatedUser> {
        state
            .accounts
            .values()
            .find(|a| &a.user.id == user_id)
            .map(|a| a.user.clone())
    }

    fn check_password(password: &str) -> Result<(), AuthProviderError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthProviderError::rejected(format!(
                "Password should be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuthProvider {
    async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpOutcome, AuthProviderError> {
        self.begin()?;
        Self::check_password(&request.password)?;

        let key = request.email.to_lowercase();
        if guard(&self.state).accounts.contains_key(&key) {
            return Err(AuthProviderError::rejected("User already registered"));
        }

        let user = self.add_account(&request.email, &request.password, request.full_name.as_deref());
        if !self.auto_confirm {
            return Ok(SignUpOutcome {
                user,
                session: None,
            });
        }

        let grant = Self::open_session(&mut guard(&self.state), user);
        Ok(SignUpOutcome {
            user: grant.user,
            session: Some(grant.session),
        })
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionGrant, AuthProviderError> {
        self.begin()?;
        let mut state = guard(&self.state);
        let user = match state.accounts.get(&email.to_lowercase()) {
            Some(account) if account.password == password => account.user.clone(),
            _ => return Err(AuthProviderError::rejected("Invalid login credentials")),
        };
        if !user.email_confirmed {
            return Err(AuthProviderError::rejected("Email not confirmed"));
        }
        Ok(Self::open_session(&mut state, user))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthProviderError> {
        self.begin()?;
        let mut state = guard(&self.state);
        let Some(user_id) = state.access_tokens.remove(access_token) else {
            return Err(AuthProviderError::rejected("Invalid session"));
        };
        state.refresh_tokens.retain(|_, owner| owner != &user_id);
        Ok(())
    }

    async fn send_password_reset(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), AuthProviderError> {
        self.begin()?;
        // Unknown addresses succeed too so callers cannot probe for accounts.
        guard(&self.state)
            .reset_requests
            .push((email.to_string(), redirect_to.to_string()));
        Ok(())
    }

    async fn update_password(
        &self,
        access_token: &str,
        new_password: &str,
    ) -> Result<AuthenticatedUser, AuthProviderError> {
        self.begin()?;
        Self::check_password(new_password)?;

        let mut state = guard(&self.state);
        let user_id = state
            .access_tokens
            .get(access_token)
            .cloned()
            .ok_or_else(|| AuthProviderError::rejected("Invalid session"))?;
        let account = state
            .accounts
            .values_mut()
            .find(|a| a.user.id == user_id)
            .ok_or_else(|| AuthProviderError::rejected("User not found"))?;
        if account.password == new_password {
            return Err(AuthProviderError::rejected(
                "New password should be different from the old password.",
            ));
        }
        account.password = new_password.to_string();
        Ok(account.user.clone())
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<SessionGrant, AuthProviderError> {
        self.begin()?;
        let mut state = guard(&self.state);
        // Refresh tokens are single use.
        let user_id = state
            .refresh_tokens
            .remove(refresh_token)
            .ok_or_else(|| AuthProviderError::rejected("Invalid Refresh Token: Refresh Token Not Found"))?;
        let user = Self::user_by_id(&state, &user_id)
            .ok_or_else(|| AuthProviderError::rejected("User not found"))?;
        Ok(Self::open_session(&mut state, user))
    }
}

#[async_trait]
impl SessionValidator for InMemoryAuthProvider {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let state = guard(&self.state);
        if let Some(error) = state.force_validation_error.clone() {
            return Err(error);
        }
        state
            .access_tokens
            .get(token)
            .and_then(|user_id| Self::user_by_id(&state, user_id))
            .ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_up_request(email: &str, password: &str) -> SignUpRequest {
        SignUpRequest {
            email: email.to_string(),
            password: password.to_string(),
            full_name: Some("Ada Lovelace".to_string()),
        }
    }

    #[tokio::test]
    async fn sign_up_issues_session_when_auto_confirming() {
        let provider = InMemoryAuthProvider::new();

        let outcome = provider
            .sign_up(sign_up_request("ada@example.com", "correct-horse"))
            .await
            .unwrap();

        assert_eq!(outcome.user.display_name.as_deref(), Some("Ada Lovelace"));
        let session = outcome.session.unwrap();
        assert_eq!(provider.validate(&session.access_token).await.unwrap(), outcome.user);
    }

    #[tokio::test]
    async fn sign_up_without_confirmation_has_no_session() {
        let provider = InMemoryAuthProvider::requiring_email_confirmation();

        let outcome = provider
            .sign_up(sign_up_request("ada@example.com", "correct-horse"))
            .await
            .unwrap();

        assert!(outcome.session.is_none());
        assert!(!outcome.user.email_confirmed);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let provider = InMemoryAuthProvider::new().with_account("ada@example.com", "secret1", None);

        let err = provider
            .sign_up(sign_up_request("ADA@example.com", "correct-horse"))
            .await
            .unwrap_err();

        assert_eq!(err, AuthProviderError::rejected("User already registered"));
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let provider = InMemoryAuthProvider::new().with_account("ada@example.com", "secret1", None);

        let err = provider
            .sign_in_with_password("ada@example.com", "nope")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[tokio::test]
    async fn sign_out_revokes_access_token() {
        let provider = InMemoryAuthProvider::new().with_account("ada@example.com", "secret1", None);
        let grant = provider
            .sign_in_with_password("ada@example.com", "secret1")
            .await
            .unwrap();

        provider.sign_out(&grant.session.access_token).await.unwrap();

        assert_eq!(
            provider.validate(&grant.session.access_token).await,
            Err(AuthError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn refresh_tokens_are_single_use() {
        let provider = InMemoryAuthProvider::new().with_account("ada@example.com", "secret1", None);
        let grant = provider.issue_session("ada@example.com").unwrap();

        let refreshed = provider
            .refresh_session(&grant.session.refresh_token)
            .await
            .unwrap();
        assert_eq!(refreshed.user.id, grant.user.id);
        assert_ne!(refreshed.session.access_token, grant.session.access_token);

        assert!(provider
            .refresh_session(&grant.session.refresh_token)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn update_password_changes_credentials() {
        let provider = InMemoryAuthProvider::new().with_account("ada@example.com", "secret1", None);
        let grant = provider.issue_session("ada@example.com").unwrap();

        provider
            .update_password(&grant.session.access_token, "secret2")
            .await
            .unwrap();

        assert_eq!(provider.password_of("ada@example.com").as_deref(), Some("secret2"));
    }

    #[tokio::test]
    async fn forced_error_still_counts_call() {
        let provider =
            InMemoryAuthProvider::new().with_error(AuthProviderError::unavailable("down"));

        assert!(provider.send_password_reset("a@b.c", "https://x").await.is_err());
        assert_eq!(provider.calls(), 1);
        assert!(provider.reset_requests().is_empty());
    }
}
