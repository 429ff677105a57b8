//! Gemini Oracle - Fact extraction backed by Google's Gemini API.
//!
//! Sends the latest message with conversation context and a strict
//! JSON-output instruction, then parses the model's reply into an
//! `OracleResponse`. Model output is treated as hostile input: fenced
//! or otherwise decorated replies are unwrapped, and anything that is
//! not the expected JSON shape becomes `ExtractionError::Malformed`.
//!
//! # Configuration
//!
//! ```ignore
//! let config = GeminiConfig::new(api_key)
//!     .with_model("gemini-2.0-flash")
//!     .with_timeout(Duration::from_secs(30));
//!
//! let oracle = GeminiOracle::new(config);
//! ```

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::domain::intake::MessageRole;
use crate::ports::{
    ExtractionError, ExtractionRequest, FactExtractionOracle, OracleResponse, SafetyStatus,
};

/// Configuration for the Gemini oracle.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    api_key: Secret<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gemini-2.0-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Gemini-backed extraction oracle.
pub struct GeminiOracle {
    config: GeminiConfig,
    client: Client,
}

impl GeminiOracle {
    pub fn new(config: GeminiConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }

    fn build_prompt(&self, request: &ExtractionRequest<'_>) -> String {
        let mut prompt = String::from(EXTRACTION_INSTRUCTIONS);

        if !request.known_facts.is_empty() {
            prompt.push_str("\nFacts already recorded (do not re-extract them):\n");
            let mut known: Vec<_> = request.known_facts.iter().collect();
            known.sort();
            for (key, value) in known {
                prompt.push_str(&format!("- {key}: {value}\n"));
            }
        }
        if !request.prior_intent.is_empty() {
            prompt.push_str(&format!(
                "\nIssue classification so far: {}\n",
                request.prior_intent
            ));
        }

        // Last few turns give the model enough context to resolve
        // pronouns and follow-up answers.
        let tail = request.history.len().saturating_sub(6);
        if !request.history[tail..].is_empty() {
            prompt.push_str("\nRecent conversation:\n");
            for message in &request.history[tail..] {
                let speaker = match message.role {
                    MessageRole::User => "User",
                    MessageRole::Assistant => "Assistant",
                };
                prompt.push_str(&format!("{speaker}: {}\n", message.text));
            }
        }

        prompt.push_str(&format!("\nLatest user message:\n{}\n", request.message));
        prompt
    }
}

const EXTRACTION_INSTRUCTIONS: &str = r#"You are a legal intake analyst.
Read the user's message and respond with ONLY a JSON object, no prose, of this shape:
{
  "intent": "<issue category such as property_dispute, consumer_complaint, family_matter>",
  "safety_status": "safe" or "unsafe",
  "extracted_critical_facts": {"<key>": "<value>"},
  "extracted_optional_facts": {"<key>": "<value>"},
  "required_keys_schema": ["<keys a document for this issue needs>"],
  "detected_language": "<two letter code>"
}
Mark safety_status "unsafe" only when the user is asking for help doing something
illegal or harmful. If the user says a detail does not exist or they do not know it,
extract that key with the value "NOT_AVAILABLE"."#;

#[async_trait]
impl FactExtractionOracle for GeminiOracle {
    async fn extract(
        &self,
        request: ExtractionRequest<'_>,
    ) -> Result<OracleResponse, ExtractionError> {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: self.build_prompt(&request),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                response_mime_type: "application/json".to_string(),
            },
        };

        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", self.config.api_key())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractionError::Timeout {
                        timeout_secs: self.config.timeout.as_secs(),
                    }
                } else {
                    ExtractionError::unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ExtractionError::unavailable(format!(
                "HTTP {status}: {detail}"
            )));
        }

        let reply: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::malformed(e.to_string()))?;

        let text = reply
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| ExtractionError::malformed("no candidates in response"))?;

        parse_oracle_reply(&text)
    }
}

/// Parses the model's reply text into an `OracleResponse`.
fn parse_oracle_reply(text: &str) -> Result<OracleResponse, ExtractionError> {
    let json = strip_markdown_fences(text);
    let wire: WireResponse =
        serde_json::from_str(json).map_err(|e| ExtractionError::malformed(e.to_string()))?;

    let safety_status = match wire.safety_status.to_lowercase().as_str() {
        "unsafe" => SafetyStatus::Unsafe,
        _ => SafetyStatus::Safe,
    };

    Ok(OracleResponse {
        intent: wire.intent,
        safety_status,
        extracted_critical_facts: pairs(wire.extracted_critical_facts),
        extracted_optional_facts: pairs(wire.extracted_optional_facts),
        required_keys_schema: wire.required_keys_schema,
        detected_language: wire.detected_language,
    })
}

fn pairs(map: HashMap<String, String>) -> Vec<(String, String)> {
    let mut pairs: Vec<_> = map.into_iter().collect();
    // Map order is unstable; sort so repeated extractions merge in a
    // deterministic order.
    pairs.sort();
    pairs
}

/// Removes a surrounding ```json fence if the model added one.
fn strip_markdown_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    intent: String,
    #[serde(default = "default_safety")]
    safety_status: String,
    #[serde(default)]
    extracted_critical_facts: HashMap<String, String>,
    #[serde(default)]
    extracted_optional_facts: HashMap<String, String>,
    #[serde(default)]
    required_keys_schema: Vec<String>,
    #[serde(default)]
    detected_language: Option<String>,
}

fn default_safety() -> String {
    "safe".to_string()
}
