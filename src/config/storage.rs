//! Session storage configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Which session store backend to run.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local map; sessions are lost on restart.
    #[default]
    Memory,
    /// One JSON file per thread under `session_dir`.
    File,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Directory for session files; required for the file backend.
    #[serde(default = "default_session_dir")]
    pub session_dir: String,
}

impl StorageConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.backend == StorageBackend::File && self.session_dir.trim().is_empty() {
            return Err(ValidationError::MissingSessionDir);
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            session_dir: default_session_dir(),
        }
    }
}

fn default_session_dir() -> String {
    "./sessions".to_string()
}
