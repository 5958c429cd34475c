//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the HTTP layer and the managed backend. Adapters implement these ports.
//!
//! - `SessionValidator` - Resolve a bearer token to its user
//! - `AuthProvider` - Sign-up, sign-in, sign-out, password and session flows
//! - `ProfileRepository` - Profile rows and API usage counters
//! - `ConversationRepository` - Owner-scoped conversations and messages
//! - `RateLimiter` - Per-user request frequency

mod auth_provider;
mod conversation_repository;
mod profile_repository;
mod rate_limiter;
mod repository;
mod session_validator;

pub use auth_provider::{
    AuthProvider, AuthProviderError, Session, SessionGrant, SignUpOutcome, SignUpRequest,
};
pub use conversation_repository::ConversationRepository;
pub use profile_repository::ProfileRepository;
pub use rate_limiter::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitStatus, RateLimiter,
};
pub use repository::RepositoryError;
pub use session_validator::SessionValidator;
