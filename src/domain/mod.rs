//! Domain layer containing the Scribe domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, auth, validation errors)
//! - `profile` - User profile, subscription tier and usage accounting
//! - `conversation` - Conversations and their messages

pub mod conversation;
pub mod foundation;
pub mod profile;
