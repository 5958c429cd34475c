//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, the authenticated caller and the
//! validation errors that form the vocabulary of the Scribe domain.

mod auth;
mod errors;
mod ids;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser};
pub use errors::ValidationError;
pub(crate) use errors::require;
pub use ids::{ConversationId, MessageId, UserId};
pub use timestamp::Timestamp;
