//! `conversations` and `messages` tables.
//!
//! Every statement filters on the caller's user id alongside the record id,
//! so a foreign or missing row both come back empty.

use async_trait::async_trait;
use reqwest::Method;

use crate::domain::conversation::{
    Conversation, ConversationUpdate, Message, NewConversation, NewMessage,
};
use crate::domain::foundation::{ConversationId, UserId};
use crate::ports::{ConversationRepository, RepositoryError};

use super::client::ClientHandle;
use super::models::{
    ConversationPatch, ConversationRow, MessageRow, NewConversationRow, NewMessageRow,
};
use super::rest::{convert, eq, fetch_rows, RETURN_REPRESENTATION};

const CONVERSATIONS: &str = "conversations";
const MESSAGES: &str = "messages";

#[derive(Debug, Clone)]
pub struct SupabaseConversationRepository {
    handle: ClientHandle,
}

impl SupabaseConversationRepository {
    pub fn new(handle: ClientHandle) -> Self {
        Self { handle }
    }
}

fn single<T>(mut rows: Vec<T>, operation: &str) -> Result<T, RepositoryError> {
    if rows.is_empty() {
        return Err(RepositoryError::decode(format!(
            "{} returned no row",
            operation
        )));
    }
    Ok(rows.swap_remove(0))
}

#[async_trait]
impl ConversationRepository for SupabaseConversationRepository {
    async fn create(&self, conversation: &NewConversation) -> Result<Conversation, RepositoryError> {
        let request = self
            .handle
            .rest(Method::POST, CONVERSATIONS)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&NewConversationRow::from(conversation));

        let rows: Vec<ConversationRow> = fetch_rows(request, "conversation.create").await?;
        single(
            convert(rows, ConversationRow::into_conversation)?,
            "conversation.create",
        )
    }

    async fn list_active(&self, user_id: &UserId) -> Result<Vec<Conversation>, RepositoryError> {
        let request = self.handle.rest(Method::GET, CONVERSATIONS).query(&[
            ("select", "*".to_string()),
            ("user_id", eq(user_id)),
            ("is_archived", eq(false)),
            ("order", "updated_at.desc".to_string()),
        ]);

        let rows: Vec<ConversationRow> = fetch_rows(request, "conversation.list").await?;
        convert(rows, ConversationRow::into_conversation)
    }

    async fn find_owned(
        &self,
        id: &ConversationId,
        user_id: &UserId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let request = self.handle.rest(Method::GET, CONVERSATIONS).query(&[
            ("select", "*".to_string()),
            ("id", eq(id)),
            ("user_id", eq(user_id)),
        ]);

        let rows: Vec<ConversationRow> = fetch_rows(request, "conversation.find").await?;
        Ok(convert(rows, ConversationRow::into_conversation)?
            .into_iter()
            .next())
    }

    async fn update_owned(
        &self,
        id: &ConversationId,
        user_id: &UserId,
        update: &ConversationUpdate,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let request = self
            .handle
            .rest(Method::PATCH, CONVERSATIONS)
            .query(&[("id", eq(id)), ("user_id", eq(user_id))])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&ConversationPatch::from(update));

        let rows: Vec<ConversationRow> = fetch_rows(request, "conversation.update").await?;
        Ok(convert(rows, ConversationRow::into_conversation)?
            .into_iter()
            .next())
    }

    async fn save_message(&self, message: &NewMessage) -> Result<Message, RepositoryError> {
        let request = self
            .handle
            .rest(Method::POST, MESSAGES)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&NewMessageRow::from(message));

        let rows: Vec<MessageRow> = fetch_rows(request, "message.create").await?;
        single(convert(rows, MessageRow::into_message)?, "message.create")
    }

    async fn list_messages(
        &self,
        conversation_id: &ConversationId,
        user_id: &UserId,
    ) -> Result<Vec<Message>, RepositoryError> {
        let request = self.handle.rest(Method::GET, MESSAGES).query(&[
            ("select", "*".to_string()),
            ("conversation_id", eq(conversation_id)),
            ("user_id", eq(user_id)),
            ("order", "created_at.asc".to_string()),
        ]);

        let rows: Vec<MessageRow> = fetch_rows(request, "message.list").await?;
        convert(rows, MessageRow::into_message)
    }
}
