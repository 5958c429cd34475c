//! Conversation module - user-owned conversations and their messages.
//!
//! Conversations are never physically removed; deleting one sets the
//! archived flag. Messages carry their owner's id so every read can be
//! scoped to the caller.

mod conversation;
mod message;

pub use conversation::{Conversation, ConversationUpdate, NewConversation, DEFAULT_TITLE, MAX_TITLE_LEN};
pub use message::{Message, NewMessage, MAX_ROLE_LEN};
