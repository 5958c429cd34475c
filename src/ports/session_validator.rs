//! Session validation port: resolves a bearer token to its user.
//!
//! Two adapters exist. One asks the managed auth service who owns the
//! token. The other verifies the token's HS256 signature locally with the
//! project's JWT secret.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Validates access tokens and extracts user identity.
///
/// The auth middleware calls this once per request.
///
/// # Contract
///
/// Implementations must:
/// - Return `AuthError::InvalidToken` for malformed, revoked or unknown tokens
/// - Return `AuthError::TokenExpired` when expiry can be told apart
/// - Return `AuthError::ServiceUnavailable` when the answer is unknown
///   (network failure, unexpected response), never `InvalidToken`
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validate an access token (without the "Bearer " prefix).
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
