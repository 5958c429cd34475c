//! HTTP handlers for auth and profile endpoints.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::adapters::http::error::{ApiError, ValidatedJson};
use crate::adapters::http::middleware::RequireAuth;
use crate::config::BackendPresence;
use crate::domain::foundation::{AuthenticatedUser, Timestamp};
use crate::domain::profile::{ProfileUpdate, UserProfile};
use crate::ports::{
    AuthProvider, ProfileRepository, RateLimitKey, RateLimiter, RepositoryError, SignUpRequest,
};

use super::dto::{
    AuthHealthResponse, AuthSessionResponse, CurrentUserResponse, MessageResponse,
    ProfileResponse, ProfileView, RateLimitView, RefreshRequest, ResetPasswordRequest,
    SessionResponse,
    SignInRequestBody, SignUpRequestBody, UpdatePasswordRequest, UpdateProfileRequest,
    UsageResponse, UsageView, UserSummary,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct AuthAppState {
    pub auth: Arc<dyn AuthProvider>,
    pub profiles: Arc<dyn ProfileRepository>,
    /// Read-only here; `/usage` reports the caller's current window.
    pub rate_limiter: Arc<dyn RateLimiter>,
    /// Link target of password-reset emails.
    pub password_reset_redirect: String,
    pub presence: BackendPresence,
}

/// Trimmed value, or `None` when missing or blank.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Passwords are not trimmed; whitespace is part of the secret.
fn present_secret(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Fetches the caller's profile, creating it if neither this service nor a
/// database trigger has yet. Failures are logged and yield `None`; the
/// account already exists at this point.
async fn load_or_create_profile(
    profiles: &dyn ProfileRepository,
    user: &AuthenticatedUser,
) -> Option<UserProfile> {
    let result: Result<UserProfile, RepositoryError> = async {
        match profiles.find(&user.id).await? {
            Some(profile) => Ok(profile),
            None => {
                tracing::info!(user_id = %user.id, "Creating missing profile");
                profiles
                    .create_if_absent(&UserProfile::for_new_user(user))
                    .await
            }
        }
    }
    .await;

    match result {
        Ok(profile) => Some(profile),
        Err(e) => {
            tracing::error!(user_id = %user.id, error = %e, "Profile fetch-or-create failed");
            None
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Public endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/auth/signup
pub async fn sign_up(
    State(state): State<AuthAppState>,
    ValidatedJson(req): ValidatedJson<SignUpRequestBody>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(email), Some(password)) = (present(req.email), present_secret(req.password)) else {
        return Err(ApiError::bad_request("Email and password are required"));
    };

    let outcome = state
        .auth
        .sign_up(SignUpRequest {
            email,
            password,
            full_name: present(req.full_name),
        })
        .await
        .map_err(|e| ApiError::from_provider(StatusCode::BAD_REQUEST, "Signup failed", e))?;

    tracing::info!(user_id = %outcome.user.id, "User signed up");
    let profile = load_or_create_profile(state.profiles.as_ref(), &outcome.user).await;

    let message = if outcome.session.is_some() {
        "User created successfully"
    } else {
        "User created. Check your email to confirm your account"
    };
    let response = AuthSessionResponse {
        success: true,
        message: message.to_string(),
        user: UserSummary::from(&outcome.user),
        profile: profile.as_ref().map(ProfileView::from),
        session: outcome.session,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/signin
pub async fn sign_in(
    State(state): State<AuthAppState>,
    ValidatedJson(req): ValidatedJson<SignInRequestBody>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(email), Some(password)) = (present(req.email), present_secret(req.password)) else {
        return Err(ApiError::bad_request("Email and password are required"));
    };

    let grant = state
        .auth
        .sign_in_with_password(&email, &password)
        .await
        .map_err(|e| {
            ApiError::from_provider(StatusCode::UNAUTHORIZED, "Authentication failed", e)
        })?;

    let profile = load_or_create_profile(state.profiles.as_ref(), &grant.user).await;

    Ok(Json(AuthSessionResponse {
        success: true,
        message: "Signed in successfully".to_string(),
        user: UserSummary::from(&grant.user),
        profile: profile.as_ref().map(ProfileView::from),
        session: Some(grant.session),
    }))
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    State(state): State<AuthAppState>,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = present(req.email).ok_or_else(|| ApiError::bad_request("Email is required"))?;

    state
        .auth
        .send_password_reset(&email, &state.password_reset_redirect)
        .await
        .map_err(|e| ApiError::from_provider(StatusCode::BAD_REQUEST, "Password reset failed", e))?;

    Ok(Json(MessageResponse::ok("Password reset email sent")))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AuthAppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let refresh_token = present(req.refresh_token)
        .ok_or_else(|| ApiError::bad_request("Refresh token is required"))?;

    let grant = state
        .auth
        .refresh_session(&refresh_token)
        .await
        .map_err(|e| ApiError::from_provider(StatusCode::UNAUTHORIZED, "Token refresh failed", e))?;

    Ok(Json(SessionResponse {
        success: true,
        user: UserSummary::from(&grant.user),
        session: grant.session,
    }))
}

/// GET /api/auth/health
pub async fn health(State(state): State<AuthAppState>) -> Json<AuthHealthResponse> {
    Json(AuthHealthResponse {
        success: true,
        status: "OK",
        service: "auth",
        timestamp: Timestamp::now().to_rfc3339(),
        configuration: state.presence,
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Authenticated endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/auth/signout
pub async fn sign_out(
    State(state): State<AuthAppState>,
    RequireAuth(ctx): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    state
        .auth
        .sign_out(&ctx.access_token)
        .await
        .map_err(|e| ApiError::from_provider(StatusCode::BAD_REQUEST, "Signout failed", e))?;

    tracing::info!(user_id = %ctx.user.id, "User signed out");
    Ok(Json(MessageResponse::ok("Signed out successfully")))
}

/// GET /api/auth/profile
pub async fn get_profile(RequireAuth(ctx): RequireAuth) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse {
        success: true,
        profile: ctx.profile.as_ref().map(ProfileView::from),
        user: ctx.user,
    })
}

/// PUT /api/auth/profile
///
/// Partial update: omitted fields keep their stored value.
pub async fn update_profile(
    State(state): State<AuthAppState>,
    RequireAuth(ctx): RequireAuth,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let update = ProfileUpdate::new(req.full_name, req.avatar_url)?;

    let updated = match state.profiles.update(&ctx.user.id, &update).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            return Err(ApiError::Upstream {
                status: StatusCode::BAD_REQUEST,
                error: "Profile update failed",
                message: "Profile not found".to_string(),
            })
        }
        Err(RepositoryError::Rejected { message, .. }) => {
            return Err(ApiError::Upstream {
                status: StatusCode::BAD_REQUEST,
                error: "Profile update failed",
                message,
            })
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Json(ProfileResponse {
        success: true,
        message: "Profile updated successfully".to_string(),
        profile: ProfileView::from(&updated),
    }))
}

/// PUT /api/auth/password
pub async fn update_password(
    State(state): State<AuthAppState>,
    RequireAuth(ctx): RequireAuth,
    ValidatedJson(req): ValidatedJson<UpdatePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new_password = present_secret(req.new_password)
        .ok_or_else(|| ApiError::bad_request("New password is required"))?;

    state
        .auth
        .update_password(&ctx.access_token, &new_password)
        .await
        .map_err(|e| ApiError::from_provider(StatusCode::BAD_REQUEST, "Password update failed", e))?;

    tracing::info!(user_id = %ctx.user.id, "Password updated");
    Ok(Json(MessageResponse::ok("Password updated successfully")))
}

/// GET /api/auth/usage
pub async fn get_usage(
    State(state): State<AuthAppState>,
    RequireAuth(ctx): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let profile = ctx.profile.ok_or(ApiError::NotFound("Profile"))?;

    let key = RateLimitKey::user(&ctx.user.id, profile.subscription_tier);
    let rate_limit = match state.rate_limiter.status(key).await {
        Ok(status) => Some(RateLimitView::from(status)),
        Err(e) => {
            tracing::warn!(user_id = %ctx.user.id, error = %e, "Rate limit status unavailable");
            None
        }
    };

    Ok(Json(UsageResponse {
        success: true,
        usage: UsageView::from(&profile),
        rate_limit,
    }))
}
