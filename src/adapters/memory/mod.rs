//! In-process adapters for the backend ports.
//!
//! These stand in for the managed backend in tests and local runs. Each one
//! keeps its state behind a mutex and counts the calls it receives, so tests
//! can assert that a rejected request never reached the backend.

mod auth;
mod conversations;
mod profiles;

pub use auth::InMemoryAuthProvider;
pub use conversations::InMemoryConversationRepository;
pub use profiles::InMemoryProfileRepository;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock `state`, recovering the data if a previous holder panicked.
fn guard<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
