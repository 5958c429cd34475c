//! Rate limiting middleware for axum.
//!
//! Runs behind `auth_middleware` and applies two checks keyed by the caller's
//! subscription tier:
//!
//! 1. Quota - a profile whose usage count has reached its limit is denied
//! 2. Frequency - a fixed-window request count per user via the `RateLimiter` port
//!
//! Rate limit status is returned in standard HTTP headers:
//! - `X-RateLimit-Limit`: Maximum requests allowed in the window
//! - `X-RateLimit-Remaining`: Requests remaining in the current window
//! - `Retry-After`: Seconds to wait (only on 429 response)
//!
//! # Example
//!
//! ```ignore
//! let limiter: Arc<dyn RateLimiter> = Arc::new(InMemoryRateLimiter::with_defaults());
//!
//! let app = Router::new()
//!     .route("/api/resource", post(handler).route_layer(
//!         middleware::from_fn_with_state(limiter, rate_limit_middleware),
//!     ));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::ports::{RateLimitKey, RateLimitResult, RateLimiter};

use super::super::error::{ApiError, RateLimitRejection};
use super::auth::AuthContext;

/// Rate limiter middleware state.
pub type RateLimiterState = Arc<dyn RateLimiter>;

/// Standard rate limit header names.
pub mod headers {
    use super::HeaderName;

    /// Maximum requests allowed in the window.
    pub static X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
    /// Requests remaining in the current window.
    pub static X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
}

/// Quota and frequency checks for authenticated routes.
///
/// Requests without an [`AuthContext`] pass through untouched; the limiter
/// has no identity to key them on. A limiter backend failure fails open.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiterState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(ctx) = request.extensions().get::<AuthContext>().cloned() else {
        return next.run(request).await;
    };

    let tier = ctx
        .profile
        .as_ref()
        .map(|p| p.subscription_tier)
        .unwrap_or_default();

    if let Some(profile) = &ctx.profile {
        if !profile.has_quota_remaining() {
            tracing::info!(user_id = %ctx.user.id, %tier, "API quota exhausted");
            return ApiError::RateLimited(RateLimitRejection {
                error: "Quota exceeded",
                message: format!(
                    "API usage limit of {} reached for the {} tier",
                    profile.api_usage_limit, tier
                ),
                limit: profile.api_usage_limit,
                remaining: 0,
                retry_after_secs: None,
            })
            .into_response();
        }
    }

    let status = match limiter.check(RateLimitKey::user(&ctx.user.id, tier)).await {
        Ok(RateLimitResult::Allowed(status)) => Some(status),
        Ok(RateLimitResult::Denied(denied)) => {
            tracing::info!(user_id = %ctx.user.id, tier = %denied.tier, "Rate limit exceeded");
            return ApiError::RateLimited(RateLimitRejection {
                error: "Rate limit exceeded",
                message: denied.message,
                limit: denied.limit,
                remaining: 0,
                retry_after_secs: Some(denied.retry_after_secs),
            })
            .into_response();
        }
        Err(e) => {
            // Fail open for availability
            tracing::warn!("Rate limiter unavailable: {}", e);
            None
        }
    };

    let mut response = next.run(request).await;
    if let Some(status) = status {
        add_rate_limit_headers(&mut response, status.limit, status.remaining);
    }
    response
}

fn add_rate_limit_headers(response: &mut Response, limit: u32, remaining: u32) {
    let headers = response.headers_mut();
    headers.insert(headers::X_RATELIMIT_LIMIT.clone(), HeaderValue::from(limit));
    headers.insert(headers::X_RATELIMIT_REMAINING.clone(), HeaderValue::from(remaining));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::middleware::auth::AuthContext;
    use crate::adapters::rate_limiter::{InMemoryRateLimiter, RateLimitConfig};
    use crate::domain::foundation::{AuthenticatedUser, UserId};
    use crate::domain::profile::{SubscriptionTier, UserProfile};
    use crate::ports::{RateLimitError, RateLimitStatus};
    use async_trait::async_trait;
    use axum::{body::Body, http::StatusCode, middleware, routing::post, Router};
    use tower::ServiceExt;

    fn user() -> AuthenticatedUser {
        AuthenticatedUser::new(UserId::new("user-1").unwrap(), "u@example.com", None, true)
    }

    fn context(profile: Option<UserProfile>) -> AuthContext {
        AuthContext {
            user: user(),
            profile,
            access_token: "token".to_string(),
        }
    }

    fn app(limiter: RateLimiterState, ctx: AuthContext) -> Router {
        Router::new()
            .route("/", post(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
            // Stands in for auth_middleware, which runs first in the real stack.
            .layer(middleware::from_fn(move |mut req: Request, next: Next| {
                let ctx = ctx.clone();
                async move {
                    req.extensions_mut().insert(ctx);
                    next.run(req).await
                }
            }))
    }

    async fn hit(app: &Router) -> Response {
        app.clone()
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn allowed_request_carries_headers() {
        let limiter: RateLimiterState = Arc::new(InMemoryRateLimiter::with_defaults());
        let app = app(limiter, context(None));

        let response = hit(&app).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-ratelimit-limit"], "20");
        assert_eq!(response.headers()["x-ratelimit-remaining"], "19");
    }

    #[tokio::test]
    async fn free_tier_is_denied_after_its_limit() {
        let config = RateLimitConfig::default().with_tier_limit(SubscriptionTier::Free, 2);
        let limiter: RateLimiterState = Arc::new(InMemoryRateLimiter::new(config));
        let app = app(limiter, context(None));

        assert_eq!(hit(&app).await.status(), StatusCode::OK);
        assert_eq!(hit(&app).await.status(), StatusCode::OK);
        let denied = hit(&app).await;

        assert_eq!(denied.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(denied.headers().contains_key("retry-after"));
        assert_eq!(denied.headers()["x-ratelimit-remaining"], "0");
    }

    #[tokio::test]
    async fn tier_comes_from_profile() {
        let mut profile = UserProfile::for_new_user(&user());
        profile.subscription_tier = SubscriptionTier::Pro;
        let limiter: RateLimiterState = Arc::new(InMemoryRateLimiter::with_defaults());
        let app = app(limiter, context(Some(profile)));

        let response = hit(&app).await;

        assert_eq!(response.headers()["x-ratelimit-limit"], "100");
    }

    #[tokio::test]
    async fn exhausted_quota_is_429_quota_exceeded() {
        let mut profile = UserProfile::for_new_user(&user());
        profile.api_usage_count = profile.api_usage_limit;
        let limiter: RateLimiterState = Arc::new(InMemoryRateLimiter::with_defaults());
        let app = app(limiter, context(Some(profile)));

        let response = hit(&app).await;

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Quota exceeded");
    }

    struct BrokenLimiter;

    #[async_trait]
    impl RateLimiter for BrokenLimiter {
        async fn check(&self, _key: RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
            Err(RateLimitError::Unavailable("redis down".to_string()))
        }

        async fn status(&self, _key: RateLimitKey) -> Result<RateLimitStatus, RateLimitError> {
            Err(RateLimitError::Unavailable("redis down".to_string()))
        }
    }

    #[tokio::test]
    async fn limiter_failure_fails_open() {
        let app = app(Arc::new(BrokenLimiter), context(None));

        let response = hit(&app).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key("x-ratelimit-limit"));
    }

    #[tokio::test]
    async fn request_without_context_passes_through() {
        let limiter: RateLimiterState = Arc::new(InMemoryRateLimiter::with_defaults());
        let app = Router::new()
            .route("/", post(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));

        assert_eq!(hit(&app).await.status(), StatusCode::OK);
    }

    #[test]
    fn rate_limiter_state_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RateLimiterState>();
    }
}
