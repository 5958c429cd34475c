//! HTTP adapter for account, session and profile endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{AuthHealthResponse, ProfileView, UsageView, UserSummary};
pub use handlers::{health, AuthAppState};
pub use routes::auth_routes;
