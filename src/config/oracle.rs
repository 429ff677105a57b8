//! Extraction oracle configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Which extraction backend to run.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OracleProvider {
    /// Google Gemini over HTTP; requires an API key.
    #[default]
    Gemini,
    /// Deterministic scripted oracle, for local runs and demos.
    Scripted,
}

/// Oracle configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    #[serde(default)]
    pub provider: OracleProvider,

    /// Gemini API key; required when the provider is `gemini`.
    pub gemini_api_key: Option<String>,

    /// Gemini model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Override for the Gemini endpoint, used in tests.
    pub base_url: Option<String>,

    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl OracleConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.provider == OracleProvider::Gemini
            && self.gemini_api_key.as_deref().unwrap_or("").trim().is_empty()
        {
            return Err(ValidationError::MissingRequired("oracle.gemini_api_key"));
        }
        if self.timeout_secs == 0 || self.timeout_secs > 120 {
            return Err(ValidationError::InvalidOracleTimeout);
        }
        Ok(())
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider: OracleProvider::default(),
            gemini_api_key: None,
            model: default_model(),
            base_url: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_timeout() -> u64 {
    30
}
