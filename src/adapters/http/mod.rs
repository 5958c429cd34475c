//! HTTP adapters - REST API implementations.
//!
//! Each route module has its own DTOs, handlers and router. `app` mounts
//! them under `/api` and wraps the result in the tower middleware stack.

pub mod app;
pub mod auth;
pub mod conversation;
pub mod error;
pub mod middleware;

// Re-export key types for convenience
pub use app::{api_router, with_middleware, AppServices};
pub use error::{ApiError, ErrorResponse, ValidatedJson};
