//! Fact Extraction Oracle Port - Interface for the NLP extraction backend.
//!
//! The oracle reads the latest user message (with conversation context)
//! and returns structured facts, an intent classification, a safety
//! verdict, the required-key schema for the detected issue, and the
//! message language. The turn flow treats it as untrusted: its output
//! passes through canonicalization and merge rules before touching
//! session state, and an oracle failure degrades a turn to an
//! extraction-free one instead of failing it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::intake::TurnMessage;

/// Port for structured fact extraction from user messages.
#[async_trait]
pub trait FactExtractionOracle: Send + Sync {
    /// Extracts structured facts from the latest message.
    ///
    /// # Errors
    /// Returns `ExtractionError` when the backend is unreachable, times
    /// out, or produces output that cannot be parsed. Callers are
    /// expected to degrade rather than propagate.
    async fn extract(&self, request: ExtractionRequest<'_>)
        -> Result<OracleResponse, ExtractionError>;
}

/// One extraction call's inputs.
#[derive(Debug)]
pub struct ExtractionRequest<'a> {
    /// The message being processed this turn.
    pub message: &'a str,
    /// Prior transcript, oldest first, for disambiguation context.
    pub history: &'a [TurnMessage],
    /// Facts already locked, so the oracle can avoid re-extracting.
    pub known_facts: &'a HashMap<String, String>,
    /// Intent from earlier turns, empty on the first turn.
    pub prior_intent: &'a str,
}

/// Safety verdict on the user's request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyStatus {
    Safe,
    /// The request seeks help with something illegal or harmful; the
    /// turn flow refuses and stops extracting.
    Unsafe,
}

/// Structured output of one extraction call.
///
/// Keys arrive in whatever vocabulary the backend model chose; the
/// canonicalizer rewrites them before merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleResponse {
    /// Issue classification, e.g. "property_dispute".
    pub intent: String,
    pub safety_status: SafetyStatus,
    /// Facts the document cannot be drafted without.
    #[serde(default)]
    pub extracted_critical_facts: Vec<(String, String)>,
    /// Supporting facts that enrich the document.
    #[serde(default)]
    pub extracted_optional_facts: Vec<(String, String)>,
    /// Required keys for the detected issue type, in priority order.
    /// May be empty when the backend cannot produce a schema.
    #[serde(default)]
    pub required_keys_schema: Vec<String>,
    /// BCP-47-ish two-letter language code of the message.
    #[serde(default)]
    pub detected_language: Option<String>,
}

impl OracleResponse {
    /// A safe, empty response; what a failed extraction degrades to.
    pub fn empty() -> Self {
        Self {
            intent: String::new(),
            safety_status: SafetyStatus::Safe,
            extracted_critical_facts: Vec::new(),
            extracted_optional_facts: Vec::new(),
            required_keys_schema: Vec::new(),
            detected_language: None,
        }
    }
}

/// Extraction backend errors.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// The backend replied but its output was not the expected JSON.
    #[error("malformed oracle output: {0}")]
    Malformed(String),

    /// The backend could not be reached or returned a server error.
    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    /// The call exceeded the configured deadline.
    #[error("oracle timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

impl ExtractionError {
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::Malformed(detail.into())
    }

    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self::Unavailable(detail.into())
    }
}
