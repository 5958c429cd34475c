//! HTTP middleware for axum.
//!
//! This module contains middleware layers for cross-cutting concerns:
//!
//! - `auth` - Bearer token validation and the `AuthContext` extractor
//! - `rate_limit` - Tier-keyed quota and frequency checks

pub mod auth;
pub mod rate_limit;

pub use auth::{auth_middleware, AuthContext, AuthState, RequireAuth};
pub use rate_limit::{rate_limit_middleware, RateLimiterState};
