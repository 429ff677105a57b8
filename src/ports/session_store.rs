//! Session Store Port - Interface for persisting session state.
//!
//! Sessions are keyed by thread id and retained indefinitely, so a
//! user can resume a conversation at any time. Implementations load
//! through `SessionState::migrate` so legacy blobs are upgraded
//! transparently.

use async_trait::async_trait;

use crate::domain::foundation::ThreadId;
use crate::domain::intake::SessionState;

/// Errors from session persistence.
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session not found for thread: {0}")]
    NotFound(ThreadId),

    #[error("failed to serialize session: {0}")]
    SerializationFailed(String),

    #[error("failed to deserialize session: {0}")]
    DeserializationFailed(String),

    #[error("IO error: {0}")]
    Io(String),
}

/// Port for persisting and loading session state.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the session for a thread.
    ///
    /// # Errors
    /// Returns `SessionStoreError::NotFound` if no session exists.
    async fn load(&self, thread_id: &ThreadId) -> Result<SessionState, SessionStoreError>;

    /// Saves the session, overwriting any previous state.
    async fn save(&self, session: &SessionState) -> Result<(), SessionStoreError>;

    /// Checks whether a session exists for a thread.
    async fn exists(&self, thread_id: &ThreadId) -> Result<bool, SessionStoreError>;
}
