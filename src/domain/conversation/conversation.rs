//! Conversation entity, creation input and owner-scoped update.

use crate::domain::foundation::{ConversationId, Timestamp, UserId, ValidationError};

/// Title given to conversations created without one.
pub const DEFAULT_TITLE: &str = "New Conversation";

pub const MAX_TITLE_LEN: usize = 200;

/// A conversation owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: ConversationId,
    pub user_id: UserId,
    pub title: String,
    /// Opaque reference to an external thread, if the client linked one.
    pub thread_id: Option<String>,
    pub is_archived: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Conversation {
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }
}

/// Input for creating a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConversation {
    pub user_id: UserId,
    pub title: String,
    pub thread_id: Option<String>,
}

impl NewConversation {
    /// Blank or missing titles become [`DEFAULT_TITLE`]; blank thread ids are dropped.
    pub fn new(
        user_id: UserId,
        title: Option<String>,
        thread_id: Option<String>,
    ) -> Result<Self, ValidationError> {
        let title = match title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => validate_title(t)?,
            _ => DEFAULT_TITLE.to_string(),
        };
        let thread_id = thread_id
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(Self {
            user_id,
            title,
            thread_id,
        })
    }

    /// Materializes the row the store would create.
    pub fn into_conversation(self, id: ConversationId, now: Timestamp) -> Conversation {
        Conversation {
            id,
            user_id: self.user_id,
            title: self.title,
            thread_id: self.thread_id,
            is_archived: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Owner-scoped conversation update. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationUpdate {
    pub title: Option<String>,
    pub is_archived: Option<bool>,
    pub updated_at: Timestamp,
}

impl ConversationUpdate {
    pub fn new(title: Option<String>, is_archived: Option<bool>) -> Result<Self, ValidationError> {
        let title = match title {
            Some(t) => {
                let t = t.trim();
                if t.is_empty() {
                    return Err(ValidationError::empty_field("title"));
                }
                Some(validate_title(t)?)
            }
            None => None,
        };

        Ok(Self {
            title,
            is_archived,
            updated_at: Timestamp::now(),
        })
    }

    /// The update behind `DELETE`: archive, nothing else.
    pub fn archive() -> Self {
        Self {
            title: None,
            is_archived: Some(true),
            updated_at: Timestamp::now(),
        }
    }

    pub fn apply_to(&self, conversation: &mut Conversation) {
        if let Some(title) = &self.title {
            conversation.title = title.clone();
        }
        if let Some(archived) = self.is_archived {
            conversation.is_archived = archived;
        }
        conversation.updated_at = self.updated_at;
    }
}

fn validate_title(title: &str) -> Result<String, ValidationError> {
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::too_long("title", MAX_TITLE_LEN));
    }
    Ok(title.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> UserId {
        UserId::new("owner-1").unwrap()
    }

    #[test]
    fn missing_title_uses_default() {
        let new = NewConversation::new(owner(), None, None).unwrap();
        assert_eq!(new.title, DEFAULT_TITLE);
    }

    #[test]
    fn blank_title_uses_default() {
        let new = NewConversation::new(owner(), Some("   ".to_string()), None).unwrap();
        assert_eq!(new.title, DEFAULT_TITLE);
    }

    #[test]
    fn title_is_trimmed_and_thread_kept() {
        let new = NewConversation::new(
            owner(),
            Some("  Chapter one  ".to_string()),
            Some("thread_abc".to_string()),
        )
        .unwrap();
        assert_eq!(new.title, "Chapter one");
        assert_eq!(new.thread_id.as_deref(), Some("thread_abc"));
    }

    #[test]
    fn overlong_title_is_rejected() {
        let result = NewConversation::new(owner(), Some("a".repeat(MAX_TITLE_LEN + 1)), None);
        assert!(matches!(result, Err(ValidationError::TooLong { .. })));
    }

    #[test]
    fn created_conversation_is_active() {
        let now = Timestamp::now();
        let conversation = NewConversation::new(owner(), None, None)
            .unwrap()
            .into_conversation(ConversationId::new(), now);

        assert!(!conversation.is_archived);
        assert!(conversation.is_owned_by(&owner()));
        assert_eq!(conversation.created_at, conversation.updated_at);
    }

    #[test]
    fn update_rejects_blank_title() {
        let result = ConversationUpdate::new(Some(" ".to_string()), None);
        assert!(matches!(result, Err(ValidationError::EmptyField { .. })));
    }

    #[test]
    fn archive_only_touches_archived_flag() {
        let mut conversation = NewConversation::new(owner(), Some("Draft".to_string()), None)
            .unwrap()
            .into_conversation(ConversationId::new(), Timestamp::from_unix_secs(10));

        ConversationUpdate::archive().apply_to(&mut conversation);

        assert!(conversation.is_archived);
        assert_eq!(conversation.title, "Draft");
        assert!(conversation.created_at < conversation.updated_at);
    }
}
