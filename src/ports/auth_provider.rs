//! Auth provider port: account operations delegated to the managed auth service.
//!
//! Token verification lives in [`SessionValidator`](super::SessionValidator);
//! this port covers everything that creates, ends or changes a session.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::domain::foundation::AuthenticatedUser;

/// Token bundle handed back to clients after sign-in, sign-up or refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: u64,
    /// Unix time at which the access token expires.
    pub expires_at: Option<u64>,
    pub token_type: String,
}

/// A user plus the session that was opened for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGrant {
    pub user: AuthenticatedUser,
    pub session: Session,
}

/// Outcome of sign-up. `session` is `None` when the provider requires email
/// confirmation before the first sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutcome {
    pub user: AuthenticatedUser,
    pub session: Option<Session>,
}

/// Sign-up input. Fields are already validated by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// Errors from the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthProviderError {
    /// The provider refused the request; the message is safe to show callers.
    #[error("{0}")]
    Rejected(String),

    /// The provider could not be reached or answered unexpectedly.
    #[error("auth provider unavailable: {0}")]
    Unavailable(String),
}

impl AuthProviderError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// Account and session operations of the managed auth service.
///
/// # Contract
///
/// - Every method performs exactly one provider call.
/// - Errors the provider reports about the request itself (bad credentials,
///   weak password, unknown refresh token) are `Rejected` with the provider's
///   message. Everything else is `Unavailable`.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpOutcome, AuthProviderError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionGrant, AuthProviderError>;

    /// Revokes the session behind `access_token`.
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthProviderError>;

    /// Sends a password-reset email whose link lands on `redirect_to`.
    async fn send_password_reset(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), AuthProviderError>;

    /// Changes the password of the user owning `access_token`.
    async fn update_password(
        &self,
        access_token: &str,
        new_password: &str,
    ) -> Result<AuthenticatedUser, AuthProviderError>;

    async fn refresh_session(&self, refresh_token: &str) -> Result<SessionGrant, AuthProviderError>;
}
