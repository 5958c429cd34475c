//! Authentication middleware and extractor for axum.
//!
//! - `auth_middleware` - validates the Bearer token, loads the caller's
//!   profile and injects an [`AuthContext`] into request extensions
//! - `RequireAuth` - extractor that reads the context back in handlers
//!
//! ```text
//! Request → auth_middleware → injects AuthContext into extensions
//!                                      ↓
//!                              Handler → RequireAuth extractor reads from extensions
//! ```
//!
//! The middleware only talks to ports, so the hosted provider, the local JWT
//! verifier and the in-memory fakes are interchangeable behind it.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::domain::foundation::{AuthError, AuthenticatedUser};
use crate::domain::profile::UserProfile;
use crate::ports::{ProfileRepository, SessionValidator};

use super::super::error::ApiError;

/// Dependencies of [`auth_middleware`].
#[derive(Clone)]
pub struct AuthState {
    pub validator: Arc<dyn SessionValidator>,
    pub profiles: Arc<dyn ProfileRepository>,
}

impl AuthState {
    pub fn new(validator: Arc<dyn SessionValidator>, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self {
            validator,
            profiles,
        }
    }
}

/// The authenticated caller, attached to the request by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: AuthenticatedUser,
    /// `None` when no profile row exists or the lookup failed.
    pub profile: Option<UserProfile>,
    /// The raw bearer token, for calls that act on the caller's own session.
    pub access_token: String,
}

/// Authentication middleware that requires a valid Bearer token.
///
/// 1. Missing or non-Bearer `Authorization` header → 401 "Missing token"
/// 2. Rejected token → 401 "Invalid or expired token"
/// 3. Validator unreachable → 500
/// 4. Otherwise loads the profile (never creates one) and continues
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        return ApiError::unauthorized("Missing token", "Authorization header with Bearer token is required")
            .into_response();
    };
    let token = token.to_string();

    let user = match state.validator.validate(&token).await {
        Ok(user) => user,
        Err(AuthError::ServiceUnavailable(detail)) => {
            return ApiError::internal(format!("session validation unavailable: {}", detail))
                .into_response();
        }
        Err(e) => {
            tracing::debug!(error = %e, "Rejected access token");
            return ApiError::unauthorized("Invalid or expired token", e.to_string()).into_response();
        }
    };

    let profile = match state.profiles.find(&user.id).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(user_id = %user.id, error = %e, "Profile lookup failed, continuing without profile");
            None
        }
    };

    request.extensions_mut().insert(AuthContext {
        user,
        profile,
        access_token: token,
    });
    next.run(request).await
}

/// Extracts the token from `Authorization: Bearer <token>`. The scheme name
/// is matched case-insensitively.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim()).filter(|t| !t.is_empty())
}

/// Extractor that requires an [`AuthContext`].
///
/// Only meaningful behind [`auth_middleware`]; without it every request is
/// rejected with 401.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(RequireAuth)
            .ok_or_else(|| ApiError::unauthorized("Unauthorized", "Authentication required"))
    }
}
