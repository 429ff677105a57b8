//! Document Renderer Port - Interface for final document generation.
//!
//! Called exactly once per session, when the user approves the
//! confirmation prompt. The renderer turns the locked fact set into
//! the deliverable: a formal document in the user's language plus an
//! English version for filing, with guidance on where to take it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Port for rendering the final document from collected facts.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Renders the document bundle for the given intent and facts.
    ///
    /// # Errors
    /// Returns `RenderError` if no document can be produced; the turn
    /// flow keeps the session in confirmation so the user can retry.
    async fn render(&self, request: RenderRequest<'_>) -> Result<DocumentBundle, RenderError>;
}

/// Inputs for one render call.
#[derive(Debug)]
pub struct RenderRequest<'a> {
    /// Issue classification driving document-type selection.
    pub intent: &'a str,
    /// The locked fact set, critical and optional merged.
    pub facts: &'a HashMap<String, String>,
    /// Two-letter code of the language the session was conducted in.
    pub user_language: &'a str,
    /// Readiness score at approval time, embedded in the bundle.
    pub readiness_score: u8,
}

/// The rendered deliverable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentBundle {
    /// Document text in the session language.
    pub content_user_language: String,
    /// English rendering, always produced for filing.
    pub content_english: String,
    /// Selected document category, e.g. "legal_notice".
    pub document_type: String,
    pub readiness_score: u8,
}

/// Rendering errors.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no document template for intent '{0}'")]
    NoTemplate(String),

    #[error("rendering failed: {0}")]
    Failed(String),
}
