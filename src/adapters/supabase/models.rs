//! Wire shapes of the managed backend's auth and table responses.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::conversation::{Conversation, ConversationUpdate, Message, NewConversation, NewMessage};
use crate::domain::foundation::{
    AuthenticatedUser, ConversationId, MessageId, Timestamp, UserId, ValidationError,
};
use crate::domain::profile::{ApiUsage, ProfileUpdate, SubscriptionTier, UserProfile};
use crate::ports::Session;

// ════════════════════════════════════════════════════════════════════════════
// Auth service
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AuthUserBody {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<String>,
    #[serde(default)]
    pub confirmed_at: Option<String>,
    #[serde(default)]
    pub user_metadata: Map<String, Value>,
}

impl AuthUserBody {
    pub fn into_user(self) -> Result<AuthenticatedUser, ValidationError> {
        let display_name = ["full_name", "name", "display_name"]
            .iter()
            .find_map(|k| self.user_metadata.get(*k).and_then(Value::as_str))
            .map(str::to_string);
        let email_confirmed = self.email_confirmed_at.is_some() || self.confirmed_at.is_some();

        Ok(AuthenticatedUser::new(
            UserId::new(self.id)?,
            self.email.unwrap_or_default(),
            display_name,
            email_confirmed,
        ))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SessionBody {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub expires_at: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: AuthUserBody,
}

impl SessionBody {
    pub fn into_parts(self) -> Result<(AuthenticatedUser, Session), ValidationError> {
        let user = self.user.into_user()?;
        let session = Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_in: self.expires_in.unwrap_or(3600),
            expires_at: self.expires_at,
            token_type: self.token_type.unwrap_or_else(|| "bearer".to_string()),
        };
        Ok((user, session))
    }
}

/// Sign-up answers with a session when auto-confirm is on, or with the bare
/// user when email confirmation is pending.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum SignUpBody {
    WithSession(SessionBody),
    UserOnly(AuthUserBody),
}

#[derive(Debug, Serialize)]
pub(crate) struct SignUpPayload<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub data: Map<String, Value>,
}

// ════════════════════════════════════════════════════════════════════════════
// profiles
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ProfileRow {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub subscription_tier: SubscriptionTier,
    #[serde(default)]
    pub api_usage_count: Option<i64>,
    #[serde(default)]
    pub api_usage_limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

fn clamp_u32(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

impl ProfileRow {
    pub fn into_profile(self) -> Result<UserProfile, ValidationError> {
        let tier = self.subscription_tier;
        let updated_at = self.updated_at.or(self.created_at).unwrap_or_default();
        Ok(UserProfile {
            id: UserId::new(self.id)?,
            email: self.email.unwrap_or_default(),
            full_name: self.full_name,
            avatar_url: self.avatar_url,
            subscription_tier: tier,
            api_usage_count: self.api_usage_count.map(clamp_u32).unwrap_or(0),
            api_usage_limit: self
                .api_usage_limit
                .map(clamp_u32)
                .unwrap_or_else(|| tier.default_usage_limit()),
            created_at: self.created_at.unwrap_or(updated_at),
            updated_at,
        })
    }
}

impl From<&UserProfile> for ProfileRow {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id.to_string(),
            email: Some(profile.email.clone()),
            full_name: profile.full_name.clone(),
            avatar_url: profile.avatar_url.clone(),
            subscription_tier: profile.subscription_tier,
            api_usage_count: Some(profile.api_usage_count as i64),
            api_usage_limit: Some(profile.api_usage_limit as i64),
            created_at: Some(profile.created_at),
            updated_at: Some(profile.updated_at),
        }
    }
}

/// PATCH body; absent fields are not sent so the store keeps them.
#[derive(Debug, Serialize)]
pub(crate) struct ProfilePatch<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<&'a str>,
    pub updated_at: Timestamp,
}

impl<'a> From<&'a ProfileUpdate> for ProfilePatch<'a> {
    fn from(update: &'a ProfileUpdate) -> Self {
        Self {
            full_name: update.full_name.as_deref(),
            avatar_url: update.avatar_url.as_deref(),
            updated_at: update.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct UsageCountPatch {
    pub api_usage_count: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ApiUsageRow<'a> {
    pub user_id: &'a str,
    pub endpoint: &'a str,
    pub tokens_used: u32,
    pub cost_cents: u32,
    pub created_at: Timestamp,
}

impl<'a> From<&'a ApiUsage> for ApiUsageRow<'a> {
    fn from(usage: &'a ApiUsage) -> Self {
        Self {
            user_id: usage.user_id.as_str(),
            endpoint: &usage.endpoint,
            tokens_used: usage.tokens_used,
            cost_cents: usage.cost_cents,
            created_at: usage.created_at,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// conversations / messages
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ConversationRow {
    pub id: Uuid,
    pub user_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub is_archived: Option<bool>,
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

impl ConversationRow {
    pub fn into_conversation(self) -> Result<Conversation, ValidationError> {
        Ok(Conversation {
            id: ConversationId::from_uuid(self.id),
            user_id: UserId::new(self.user_id)?,
            title: self
                .title
                .unwrap_or_else(|| crate::domain::conversation::DEFAULT_TITLE.to_string()),
            thread_id: self.thread_id,
            is_archived: self.is_archived.unwrap_or(false),
            updated_at: self.updated_at.unwrap_or(self.created_at),
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct NewConversationRow<'a> {
    pub user_id: &'a str,
    pub title: &'a str,
    pub thread_id: Option<&'a str>,
    pub is_archived: bool,
}

impl<'a> From<&'a NewConversation> for NewConversationRow<'a> {
    fn from(new: &'a NewConversation) -> Self {
        Self {
            user_id: new.user_id.as_str(),
            title: &new.title,
            thread_id: new.thread_id.as_deref(),
            is_archived: false,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ConversationPatch<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
    pub updated_at: Timestamp,
}

impl<'a> From<&'a ConversationUpdate> for ConversationPatch<'a> {
    fn from(update: &'a ConversationUpdate) -> Self {
        Self {
            title: update.title.as_deref(),
            is_archived: update.is_archived,
            updated_at: update.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MessageRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub user_id: String,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Option<Value>,
    pub created_at: Timestamp,
}

impl MessageRow {
    pub fn into_message(self) -> Result<Message, ValidationError> {
        let metadata = match self.metadata {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Ok(Message {
            id: MessageId::from_uuid(self.id),
            conversation_id: ConversationId::from_uuid(self.conversation_id),
            user_id: UserId::new(self.user_id)?,
            role: self.role,
            content: self.content,
            metadata,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct NewMessageRow<'a> {
    pub conversation_id: Uuid,
    pub user_id: &'a str,
    pub role: &'a str,
    pub content: &'a str,
    pub metadata: &'a Map<String, Value>,
}

impl<'a> From<&'a NewMessage> for NewMessageRow<'a> {
    fn from(new: &'a NewMessage) -> Self {
        Self {
            conversation_id: *new.conversation_id.as_uuid(),
            user_id: new.user_id.as_str(),
            role: &new.role,
            content: &new.content,
            metadata: &new.metadata,
        }
    }
}
