//! Message entity and creation input.

use serde_json::{Map, Value};

use crate::domain::foundation::{ConversationId, MessageId, Timestamp, UserId, ValidationError};
use crate::domain::profile::UsageCharge;

pub const MAX_ROLE_LEN: usize = 32;

/// A single message in a conversation.
///
/// `user_id` duplicates the conversation's owner so reads can be filtered
/// without a join.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub user_id: UserId,
    /// Free-form, e.g. "user" or "assistant".
    pub role: String,
    pub content: String,
    pub metadata: Map<String, Value>,
    pub created_at: Timestamp,
}

/// Input for appending a message.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub conversation_id: ConversationId,
    pub user_id: UserId,
    pub role: String,
    pub content: String,
    pub metadata: Map<String, Value>,
}

impl NewMessage {
    /// Requires a role and non-blank content. Content is stored verbatim.
    pub fn new(
        conversation_id: ConversationId,
        user_id: UserId,
        role: Option<String>,
        content: Option<String>,
        metadata: Option<Map<String, Value>>,
    ) -> Result<Self, ValidationError> {
        let role = crate::domain::foundation::require("role", role.as_deref())?;
        if role.chars().count() > MAX_ROLE_LEN {
            return Err(ValidationError::too_long("role", MAX_ROLE_LEN));
        }

        let content = match content {
            Some(c) if !c.trim().is_empty() => c,
            _ => return Err(ValidationError::empty_field("content")),
        };

        Ok(Self {
            conversation_id,
            user_id,
            role,
            content,
            metadata: metadata.unwrap_or_default(),
        })
    }

    /// Usage reported by the client in `tokensUsed` / `costCents` metadata.
    ///
    /// Returns `None` unless `tokensUsed` is a non-negative number. Fractional
    /// values round to the nearest whole unit.
    pub fn usage_charge(&self) -> Option<UsageCharge> {
        let tokens_used = self.metadata.get("tokensUsed").and_then(whole_units)?;
        let cost_cents = self
            .metadata
            .get("costCents")
            .and_then(whole_units)
            .unwrap_or(0);

        Some(UsageCharge {
            tokens_used,
            cost_cents,
        })
    }

    pub fn into_message(self, id: MessageId, created_at: Timestamp) -> Message {
        Message {
            id,
            conversation_id: self.conversation_id,
            user_id: self.user_id,
            role: self.role,
            content: self.content,
            metadata: self.metadata,
            created_at,
        }
    }
}

/// A JSON number as a non-negative `u32`, whether sent as `12` or `12.0`.
fn whole_units(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    let n = value.as_f64()?.round();
    (n.is_finite() && (0.0..=f64::from(u32::MAX)).contains(&n)).then(|| n as u32)
}
