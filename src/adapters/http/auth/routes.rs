//! Axum router configuration for auth endpoints.

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::adapters::http::middleware::{auth_middleware, AuthState};

use super::handlers::{
    get_profile, get_usage, health, refresh, reset_password, sign_in, sign_out, sign_up,
    update_password, update_profile, AuthAppState,
};

/// Create the auth API router, mounted at `/api/auth`.
///
/// # Routes
///
/// ## Public
/// - `POST /signup`, `POST /signin`, `POST /reset-password`, `POST /refresh`
/// - `GET /health`
///
/// ## Bearer token required
/// - `POST /signout`
/// - `GET /profile`, `PUT /profile`
/// - `PUT /password`
/// - `GET /usage`
pub fn auth_routes(state: AuthAppState, auth: AuthState) -> Router {
    let protected = Router::new()
        .route("/signout", post(sign_out))
        .route("/profile", get(get_profile).put(update_profile))
        .route("/password", put(update_password))
        .route("/usage", get(get_usage))
        .route_layer(middleware::from_fn_with_state(auth, auth_middleware));

    Router::new()
        .route("/signup", post(sign_up))
        .route("/signin", post(sign_in))
        .route("/reset-password", post(reset_password))
        .route("/refresh", post(refresh))
        .route("/health", get(health))
        .merge(protected)
        .with_state(state)
}
