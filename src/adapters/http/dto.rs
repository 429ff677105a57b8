//! Wire types for the HTTP API.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::intake::TurnOutcome;

/// Body of `POST /threads/:thread_id/messages`.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

/// Reply to a processed turn.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub thread_id: String,
    pub content: String,
    pub facts: HashMap<String, String>,
    pub intent: String,
    pub readiness_score: u8,
    pub is_document: bool,
}

impl MessageResponse {
    pub fn from_outcome(thread_id: String, outcome: TurnOutcome) -> Self {
        Self {
            thread_id,
            content: outcome.content,
            facts: outcome.facts,
            intent: outcome.intent,
            readiness_score: outcome.readiness_score,
            is_document: outcome.is_document,
        }
    }
}

/// Error body for non-2xx replies.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
