//! HTTP handlers for conversation endpoints.
//!
//! Every lookup passes the caller's id to the repository together with the
//! conversation id. A conversation owned by someone else is indistinguishable
//! from one that does not exist.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::adapters::http::error::{ApiError, OptionalJson, ValidatedJson};
use crate::adapters::http::middleware::{AuthContext, RequireAuth};
use crate::domain::conversation::{Conversation, ConversationUpdate, NewConversation, NewMessage};
use crate::domain::foundation::{ConversationId, Timestamp};
use crate::domain::profile::ApiUsage;
use crate::ports::{ConversationRepository, ProfileRepository};

use super::dto::{
    ConfirmationResponse, ConversationDetailResponse, ConversationHealthResponse,
    ConversationListResponse, ConversationResponse, ConversationView, CreateConversationRequest,
    CreateMessageRequest, MessageListResponse, MessageResponse, MessageView,
    UpdateConversationRequest,
};

/// Endpoint name recorded in the usage log for appended messages.
pub const MESSAGE_USAGE_ENDPOINT: &str = "conversations.messages";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct ConversationAppState {
    pub conversations: Arc<dyn ConversationRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
}

const CONVERSATION: &str = "Conversation";

/// Ids that are not UUIDs cannot name a row.
fn parse_id(raw: &str) -> Result<ConversationId, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound(CONVERSATION))
}

async fn owned_conversation(
    state: &ConversationAppState,
    ctx: &AuthContext,
    raw_id: &str,
) -> Result<Conversation, ApiError> {
    let id = parse_id(raw_id)?;
    state
        .conversations
        .find_owned(&id, &ctx.user.id)
        .await?
        .ok_or(ApiError::NotFound(CONVERSATION))
}

// ════════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/conversations - Active conversations, most recent first
pub async fn list_conversations(
    State(state): State<ConversationAppState>,
    RequireAuth(ctx): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let conversations = state.conversations.list_active(&ctx.user.id).await?;
    let views: Vec<ConversationView> = conversations.iter().map(ConversationView::from).collect();

    Ok(Json(ConversationListResponse {
        success: true,
        count: views.len(),
        conversations: views,
    }))
}

/// POST /api/conversations - Start a conversation
pub async fn create_conversation(
    State(state): State<ConversationAppState>,
    RequireAuth(ctx): RequireAuth,
    OptionalJson(req): OptionalJson<CreateConversationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new = NewConversation::new(ctx.user.id.clone(), req.title, req.thread_id)?;
    let conversation = state.conversations.create(&new).await?;

    tracing::info!(user_id = %ctx.user.id, conversation_id = %conversation.id, "Conversation created");
    Ok((
        StatusCode::CREATED,
        Json(ConversationResponse {
            success: true,
            conversation: ConversationView::from(&conversation),
        }),
    ))
}

/// GET /api/conversations/:id - Conversation with its messages
pub async fn get_conversation(
    State(state): State<ConversationAppState>,
    RequireAuth(ctx): RequireAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation = owned_conversation(&state, &ctx, &id).await?;
    let messages = state
        .conversations
        .list_messages(&conversation.id, &ctx.user.id)
        .await?;
    let views: Vec<MessageView> = messages.iter().map(MessageView::from).collect();

    Ok(Json(ConversationDetailResponse {
        success: true,
        conversation: ConversationView::from(&conversation),
        count: views.len(),
        messages: views,
    }))
}

/// PUT /api/conversations/:id - Rename or (un)archive
pub async fn update_conversation(
    State(state): State<ConversationAppState>,
    RequireAuth(ctx): RequireAuth,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateConversationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let update = ConversationUpdate::new(req.title, req.is_archived)?;

    let conversation = state
        .conversations
        .update_owned(&id, &ctx.user.id, &update)
        .await?
        .ok_or(ApiError::NotFound(CONVERSATION))?;

    Ok(Json(ConversationResponse {
        success: true,
        conversation: ConversationView::from(&conversation),
    }))
}

/// DELETE /api/conversations/:id - Archive; rows are never removed
pub async fn delete_conversation(
    State(state): State<ConversationAppState>,
    RequireAuth(ctx): RequireAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;

    state
        .conversations
        .update_owned(&id, &ctx.user.id, &ConversationUpdate::archive())
        .await?
        .ok_or(ApiError::NotFound(CONVERSATION))?;

    tracing::info!(user_id = %ctx.user.id, conversation_id = %id, "Conversation archived");
    Ok(Json(ConfirmationResponse {
        success: true,
        message: "Conversation deleted successfully".to_string(),
    }))
}

/// POST /api/conversations/:id/messages - Append a message
///
/// Input is validated and ownership verified before anything is written.
/// Client-reported `tokensUsed` metadata is charged to the caller's usage.
pub async fn create_message(
    State(state): State<ConversationAppState>,
    RequireAuth(ctx): RequireAuth,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<CreateMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let new = NewMessage::new(id, ctx.user.id.clone(), req.role, req.content, req.metadata)?;

    state
        .conversations
        .find_owned(&id, &ctx.user.id)
        .await?
        .ok_or(ApiError::NotFound(CONVERSATION))?;

    let message = state.conversations.save_message(&new).await?;

    if let Some(charge) = new.usage_charge() {
        let usage = ApiUsage::new(ctx.user.id.clone(), MESSAGE_USAGE_ENDPOINT, charge);
        match state.profiles.record_usage(&usage).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(user_id = %ctx.user.id, "No profile to charge usage to")
            }
            Err(e) => {
                tracing::warn!(user_id = %ctx.user.id, error = %e, "Failed to record API usage")
            }
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            success: true,
            message: MessageView::from(&message),
        }),
    ))
}

/// GET /api/conversations/:id/messages - Messages, oldest first
pub async fn list_messages(
    State(state): State<ConversationAppState>,
    RequireAuth(ctx): RequireAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation = owned_conversation(&state, &ctx, &id).await?;
    let messages = state
        .conversations
        .list_messages(&conversation.id, &ctx.user.id)
        .await?;
    let views: Vec<MessageView> = messages.iter().map(MessageView::from).collect();

    Ok(Json(MessageListResponse {
        success: true,
        count: views.len(),
        messages: views,
    }))
}

/// GET /api/conversations/health
pub async fn health() -> Json<ConversationHealthResponse> {
    Json(ConversationHealthResponse {
        success: true,
        status: "OK",
        service: "conversations",
        timestamp: Timestamp::now().to_rfc3339(),
    })
}
