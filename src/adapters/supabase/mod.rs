//! Managed backend adapter.
//!
//! Talks to the hosted auth service (`/auth/v1`) and the table API
//! (`/rest/v1`) over HTTP.
//!
//! - [`SupabaseAuth`] implements [`crate::ports::AuthProvider`] and
//!   [`crate::ports::SessionValidator`] using the public handle.
//! - [`JwtSessionValidator`] verifies tokens locally when the project's JWT
//!   secret is configured.
//! - The repositories use the privileged handle and scope every query to
//!   the caller explicitly.

mod auth;
mod client;
mod conversations;
mod jwt;
mod models;
mod profiles;
mod rest;

pub use auth::SupabaseAuth;
pub use client::{Access, ClientHandle, SupabaseClient};
pub use conversations::SupabaseConversationRepository;
pub use jwt::JwtSessionValidator;
pub use profiles::SupabaseProfileRepository;
