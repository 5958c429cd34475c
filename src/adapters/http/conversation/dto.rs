//! HTTP DTOs for conversation endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing independent evolution.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::conversation::{Conversation, Message};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    pub title: Option<String>,
    pub thread_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConversationRequest {
    pub title: Option<String>,
    pub is_archived: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateMessageRequest {
    pub role: Option<String>,
    pub content: Option<String>,
    pub metadata: Option<Map<String, Value>>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// View of a conversation for API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub thread_id: Option<String>,
    pub is_archived: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Conversation> for ConversationView {
    fn from(conversation: &Conversation) -> Self {
        Self {
            id: conversation.id.to_string(),
            user_id: conversation.user_id.to_string(),
            title: conversation.title.clone(),
            thread_id: conversation.thread_id.clone(),
            is_archived: conversation.is_archived,
            created_at: conversation.created_at.to_rfc3339(),
            updated_at: conversation.updated_at.to_rfc3339(),
        }
    }
}

/// View of a message for API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: String,
    pub conversation_id: String,
    pub user_id: String,
    pub role: String,
    pub content: String,
    pub metadata: Map<String, Value>,
    pub created_at: String,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.to_string(),
            conversation_id: message.conversation_id.to_string(),
            user_id: message.user_id.to_string(),
            role: message.role.clone(),
            content: message.content.clone(),
            metadata: message.metadata.clone(),
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationListResponse {
    pub success: bool,
    pub conversations: Vec<ConversationView>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationResponse {
    pub success: bool,
    pub conversation: ConversationView,
}

/// A conversation with its messages, oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationDetailResponse {
    pub success: bool,
    pub conversation: ConversationView,
    pub messages: Vec<MessageView>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: MessageView,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageListResponse {
    pub success: bool,
    pub messages: Vec<MessageView>,
    pub count: usize,
}

/// Plain confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmationResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationHealthResponse {
    pub success: bool,
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_reads_camel_case_flag() {
        let req: UpdateConversationRequest =
            serde_json::from_str(r#"{"isArchived": true}"#).unwrap();
        assert_eq!(req.is_archived, Some(true));
        assert!(req.title.is_none());
    }

    #[test]
    fn message_request_keeps_metadata_object() {
        let req: CreateMessageRequest = serde_json::from_str(
            r#"{"role": "assistant", "content": "hi", "metadata": {"model": "x", "tokensUsed": 5}}"#,
        )
        .unwrap();
        let metadata = req.metadata.unwrap();
        assert_eq!(metadata["tokensUsed"], 5);
    }
}
