//! Axum router configuration for conversation endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::adapters::http::middleware::{
    auth_middleware, rate_limit_middleware, AuthState, RateLimiterState,
};

use super::handlers::{
    create_conversation, create_message, delete_conversation, get_conversation, health,
    list_conversations, list_messages, update_conversation, ConversationAppState,
};

/// Create the conversation API router, mounted at `/api/conversations`.
///
/// # Routes
///
/// All routes except `/health` require a Bearer token. The two that create
/// rows also pass the tier rate limit.
///
/// - `GET /` - List active conversations
/// - `POST /` - Create a conversation (rate limited)
/// - `GET /:id`, `PUT /:id`, `DELETE /:id`
/// - `GET /:id/messages`
/// - `POST /:id/messages` - Append a message (rate limited)
/// - `GET /health`
pub fn conversation_routes(
    state: ConversationAppState,
    auth: AuthState,
    limiter: RateLimiterState,
) -> Router {
    let rate_limited = middleware::from_fn_with_state(limiter, rate_limit_middleware);

    let protected = Router::new()
        .route("/", get(list_conversations))
        .route("/", post(create_conversation).route_layer(rate_limited.clone()))
        .route(
            "/:id",
            get(get_conversation)
                .put(update_conversation)
                .delete(delete_conversation),
        )
        .route("/:id/messages", get(list_messages))
        .route("/:id/messages", post(create_message).route_layer(rate_limited))
        .route_layer(middleware::from_fn_with_state(auth, auth_middleware));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .with_state(state)
}
