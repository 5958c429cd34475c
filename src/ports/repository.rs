//! Error type shared by the persistence ports.

use thiserror::Error;

/// Failure talking to the managed store.
///
/// "Row not found" is not an error: lookups return `Ok(None)` for that, so a
/// `RepositoryError` always means the store could not answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The store could not be reached or timed out.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store answered with an error status.
    #[error("store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The store answered with a body we could not interpret.
    #[error("unexpected store response: {0}")]
    Decode(String),
}

impl RepositoryError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }
}
