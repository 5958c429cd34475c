//! In-memory conversation repository.
//!
//! Ownership is part of every lookup key, the same way the hosted store
//! filters on both columns.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::conversation::{
    Conversation, ConversationUpdate, Message, NewConversation, NewMessage,
};
use crate::domain::foundation::{ConversationId, MessageId, Timestamp, UserId};
use crate::ports::{ConversationRepository, RepositoryError};

use super::guard;

#[derive(Debug, Default)]
struct State {
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
    force_error: Option<RepositoryError>,
}

#[derive(Debug, Default)]
pub struct InMemoryConversationRepository {
    state: Mutex<State>,
    calls: AtomicUsize,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error(self, error: RepositoryError) -> Self {
        guard(&self.state).force_error = Some(error);
        self
    }

    /// Stores `conversation` as-is.
    pub fn insert(&self, conversation: Conversation) {
        guard(&self.state).conversations.push(conversation);
    }

    /// Total messages stored, across all users.
    pub fn message_count(&self) -> usize {
        guard(&self.state).messages.len()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<MutexGuard<'_, State>, RepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let state = guard(&self.state);
        match &state.force_error {
            Some(error) => Err(error.clone()),
            None => Ok(state),
        }
    }
}

fn owned<'a>(
    conversations: &'a mut [Conversation],
    id: &ConversationId,
    user_id: &UserId,
) -> Option<&'a mut Conversation> {
    conversations
        .iter_mut()
        .find(|c| &c.id == id && c.is_owned_by(user_id))
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn create(&self, conversation: &NewConversation) -> Result<Conversation, RepositoryError> {
        let mut state = self.begin()?;
        let created = conversation
            .clone()
            .into_conversation(ConversationId::new(), Timestamp::now());
        state.conversations.push(created.clone());
        Ok(created)
    }

    async fn list_active(&self, user_id: &UserId) -> Result<Vec<Conversation>, RepositoryError> {
        let state = self.begin()?;
        let mut active: Vec<Conversation> = state
            .conversations
            .iter()
            .filter(|c| c.is_owned_by(user_id) && !c.is_archived)
            .cloned()
            .collect();
        active.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(active)
    }

    async fn find_owned(
        &self,
        id: &ConversationId,
        user_id: &UserId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let mut state = self.begin()?;
        Ok(owned(&mut state.conversations, id, user_id).map(|c| c.clone()))
    }

    async fn update_owned(
        &self,
        id: &ConversationId,
        user_id: &UserId,
        update: &ConversationUpdate,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let mut state = self.begin()?;
        Ok(owned(&mut state.conversations, id, user_id).map(|c| {
            update.apply_to(c);
            c.clone()
        }))
    }

    async fn save_message(&self, message: &NewMessage) -> Result<Message, RepositoryError> {
        let mut state = self.begin()?;
        let saved = message.clone().into_message(MessageId::new(), Timestamp::now());
        state.messages.push(saved.clone());
        Ok(saved)
    }

    async fn list_messages(
        &self,
        conversation_id: &ConversationId,
        user_id: &UserId,
    ) -> Result<Vec<Message>, RepositoryError> {
        let state = self.begin()?;
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| &m.conversation_id == conversation_id && &m.user_id == user_id)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal timestamps.
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }
}
