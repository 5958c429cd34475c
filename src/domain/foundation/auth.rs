//! Authentication types for the domain layer.
//!
//! `AuthenticatedUser` is what the `SessionValidator` port resolves a bearer
//! token to. It carries only the user fields the API hands back to clients
//! and nothing provider-specific.

use serde::Serialize;
use thiserror::Error;

use super::UserId;

/// User resolved from a verified access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    /// The unique user identifier from the auth provider.
    pub id: UserId,

    /// User's email address.
    pub email: String,

    /// Display name from the user's metadata, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Whether the provider has recorded an email confirmation.
    pub email_confirmed: bool,
}

impl AuthenticatedUser {
    /// Creates a new authenticated user.
    pub fn new(
        id: UserId,
        email: impl Into<String>,
        display_name: Option<String>,
        email_confirmed: bool,
    ) -> Self {
        Self {
            id,
            email: email.into(),
            display_name,
            email_confirmed,
        }
    }
}

/// Errors that can occur while verifying an access token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The token is malformed, has a bad signature, or was revoked.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token is well-formed but past its expiry.
    #[error("Token expired")]
    TokenExpired,

    /// The auth service could not be reached or answered unexpectedly.
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }
}
