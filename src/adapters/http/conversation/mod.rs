//! HTTP adapter for conversation and message endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{ConversationView, MessageView};
pub use handlers::{ConversationAppState, MESSAGE_USAGE_ENDPOINT};
pub use routes::conversation_routes;
