//! File Session Store Adapter
//!
//! Persists each session as one JSON file under a base directory.
//! Loads go through `SessionState::migrate` so blobs written by older
//! deployments are upgraded on read.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::foundation::ThreadId;
use crate::domain::intake::SessionState;
use crate::ports::{SessionStore, SessionStoreError};

/// File-backed session storage.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    base_dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn session_path(&self, thread_id: &ThreadId) -> PathBuf {
        // Thread ids come from callers; keep only filesystem-safe
        // characters in the file name.
        let safe: String = thread_id
            .as_str()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_dir.join(format!("{safe}.json"))
    }

    async fn ensure_base_dir(&self) -> Result<(), SessionStoreError> {
        fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| SessionStoreError::Io(e.to_string()))
    }
}

async fn read_session(path: &Path) -> Result<Option<SessionState>, SessionStoreError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SessionStoreError::Io(e.to_string())),
    };
    let blob: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| SessionStoreError::DeserializationFailed(e.to_string()))?;
    let session = SessionState::migrate(blob)
        .map_err(|e| SessionStoreError::DeserializationFailed(e.to_string()))?;
    Ok(Some(session))
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self, thread_id: &ThreadId) -> Result<SessionState, SessionStoreError> {
        read_session(&self.session_path(thread_id))
            .await?
            .ok_or_else(|| SessionStoreError::NotFound(thread_id.clone()))
    }

    async fn save(&self, session: &SessionState) -> Result<(), SessionStoreError> {
        self.ensure_base_dir().await?;
        let path = self.session_path(&session.thread_id);
        let json = serde_json::to_vec_pretty(session)
            .map_err(|e| SessionStoreError::SerializationFailed(e.to_string()))?;

        // Write-then-rename so a crash mid-write never truncates the
        // existing session file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .await
            .map_err(|e| SessionStoreError::Io(e.to_string()))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| SessionStoreError::Io(e.to_string()))
    }

    async fn exists(&self, thread_id: &ThreadId) -> Result<bool, SessionStoreError> {
        Ok(fs::try_exists(self.session_path(thread_id))
            .await
            .unwrap_or(false))
    }
}
