//! In-Memory Session Store Adapter
//!
//! Keeps sessions in a process-local map. Used in tests and for
//! single-instance deployments without durability requirements.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::ThreadId;
use crate::domain::intake::SessionState;
use crate::ports::{SessionStore, SessionStoreError};

/// In-memory session storage.
#[derive(Debug, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<ThreadId, SessionState>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of stored sessions, for tests.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, thread_id: &ThreadId) -> Result<SessionState, SessionStoreError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(thread_id)
            .cloned()
            .ok_or_else(|| SessionStoreError::NotFound(thread_id.clone()))
    }

    async fn save(&self, session: &SessionState) -> Result<(), SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.thread_id.clone(), session.clone());
        Ok(())
    }

    async fn exists(&self, thread_id: &ThreadId) -> Result<bool, SessionStoreError> {
        Ok(self.sessions.read().await.contains_key(thread_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = InMemorySessionStore::new();
        let thread_id = ThreadId::new("t1").unwrap();
        let mut session = SessionState::new(thread_id.clone());
        session.record_user_message("hello");

        store.save(&session).await.unwrap();
        let loaded = store.load(&thread_id).await.unwrap();
        assert_eq!(loaded, session);
    }

    #[tokio::test]
    async fn load_of_unknown_thread_is_not_found() {
        let store = InMemorySessionStore::new();
        let result = store.load(&ThreadId::new("missing").unwrap()).await;
        assert!(matches!(result, Err(SessionStoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn exists_reflects_saves() {
        let store = InMemorySessionStore::new();
        let thread_id = ThreadId::new("t1").unwrap();
        assert!(!store.exists(&thread_id).await.unwrap());

        store
            .save(&SessionState::new(thread_id.clone()))
            .await
            .unwrap();
        assert!(store.exists(&thread_id).await.unwrap());
    }
}
