//! ConversationRepository port for conversations and messages.
//!
//! Every read and write takes the caller's `UserId` and the implementation
//! must put it in the same query as the record id. Ownership is never checked
//! after the fact.

use async_trait::async_trait;

use crate::domain::conversation::{Conversation, ConversationUpdate, Message, NewConversation, NewMessage};
use crate::domain::foundation::{ConversationId, UserId};

use super::RepositoryError;

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn create(&self, conversation: &NewConversation) -> Result<Conversation, RepositoryError>;

    /// Non-archived conversations of `user_id`, most recently updated first.
    async fn list_active(&self, user_id: &UserId) -> Result<Vec<Conversation>, RepositoryError>;

    /// The conversation only if it exists AND belongs to `user_id`.
    async fn find_owned(
        &self,
        id: &ConversationId,
        user_id: &UserId,
    ) -> Result<Option<Conversation>, RepositoryError>;

    /// Conditional update matching both `id` and `user_id` in one statement.
    ///
    /// `Ok(None)` when no row matched.
    async fn update_owned(
        &self,
        id: &ConversationId,
        user_id: &UserId,
        update: &ConversationUpdate,
    ) -> Result<Option<Conversation>, RepositoryError>;

    async fn save_message(&self, message: &NewMessage) -> Result<Message, RepositoryError>;

    /// Messages of the conversation owned by `user_id`, oldest first.
    async fn list_messages(
        &self,
        conversation_id: &ConversationId,
        user_id: &UserId,
    ) -> Result<Vec<Message>, RepositoryError>;
}
