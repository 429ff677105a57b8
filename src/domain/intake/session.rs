//! Session state.
//!
//! One `SessionState` exists per thread id. It is created on the first
//! message, mutated exclusively by the session coordinator, and
//! retained indefinitely so any thread can be resumed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::foundation::ThreadId;

use super::facts::FactStore;
use super::stage::Stage;

/// Who sent a turn message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// One entry in the append-only conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnMessage {
    pub role: MessageRole,
    pub text: String,
}

/// Result of processing one turn, returned to the caller and cached
/// for idempotent replay of a duplicate input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// Question, confirmation prompt, refusal, or document text.
    pub content: String,
    /// The externally visible fact set after the turn.
    pub facts: HashMap<String, String>,
    /// Last detected issue classification.
    pub intent: String,
    pub readiness_score: u8,
    /// True when `content` is the generated document.
    pub is_document: bool,
}

/// Complete mutable state of one intake conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub thread_id: ThreadId,
    /// Append-only transcript; never rewritten.
    pub messages: Vec<TurnMessage>,
    /// Language locked from the first turn; immutable once set.
    pub primary_language: Option<String>,
    /// Mirrors `primary_language`, "en" until the lock happens.
    pub user_language: String,
    pub facts: FactStore,
    /// Keys already posed as a question; only grows.
    pub asked_facts: Vec<String>,
    pub intent: String,
    pub readiness_score: u8,
    /// Latest non-empty required-key schema from the oracle.
    #[serde(default)]
    pub required_keys: Vec<String>,
    /// Required keys currently unanswered, in schema order.
    pub missing_fields: Vec<String>,
    pub stage: Stage,
    /// Incremented once per processed (non-duplicate) turn.
    pub turn_count: u32,
    /// Turn of the most recent confirmation rejection, -1 if none.
    pub last_rejection_turn: i64,
    /// Turn at which the fallback question was asked, -1 if never.
    pub fallback_turn: i64,
    /// Fingerprint of the most recently processed raw input.
    pub last_input_hash: Option<String>,
    /// Cached outcome for idempotent replay of a duplicate input.
    pub last_outcome: Option<TurnOutcome>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionState {
    /// Creates the state for a fresh thread.
    pub fn new(thread_id: ThreadId) -> Self {
        let now = Utc::now();
        Self {
            thread_id,
            messages: Vec::new(),
            primary_language: None,
            user_language: "en".to_string(),
            facts: FactStore::new(),
            asked_facts: Vec::new(),
            intent: String::new(),
            readiness_score: 0,
            required_keys: Vec::new(),
            missing_fields: Vec::new(),
            stage: Stage::Investigation,
            turn_count: 0,
            last_rejection_turn: -1,
            fallback_turn: -1,
            last_input_hash: None,
            last_outcome: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends a user message to the transcript.
    pub fn record_user_message(&mut self, text: impl Into<String>) {
        self.messages.push(TurnMessage {
            role: MessageRole::User,
            text: text.into(),
        });
        self.updated_at = Utc::now();
    }

    /// Appends an assistant message to the transcript.
    pub fn record_assistant_message(&mut self, text: impl Into<String>) {
        self.messages.push(TurnMessage {
            role: MessageRole::Assistant,
            text: text.into(),
        });
        self.updated_at = Utc::now();
    }

    /// Locks the primary language on first detection; later calls are
    /// no-ops so the session language never drifts mid-conversation.
    pub fn lock_language(&mut self, code: &str) {
        if self.primary_language.is_none() {
            let code = normalize_language(code);
            self.primary_language = Some(code.clone());
            self.user_language = code;
        }
    }

    /// Records that a key was posed as a question.
    pub fn note_asked(&mut self, key: impl Into<String>) {
        let key = key.into();
        if !self.asked_facts.contains(&key) {
            self.asked_facts.push(key);
        }
    }

    /// The last two assistant messages, most recent last.
    pub fn recent_assistant_questions(&self) -> Vec<String> {
        self.messages
            .iter()
            .rev()
            .filter(|m| m.role == MessageRole::Assistant)
            .take(2)
            .map(|m| m.text.clone())
            .collect()
    }

    /// True if the fallback question was asked on the immediately
    /// preceding turn, meaning this turn is its reply.
    pub fn replying_to_fallback(&self) -> bool {
        self.fallback_turn >= 0 && self.fallback_turn == i64::from(self.turn_count) - 1
    }

    /// Deserializes a persisted blob, upgrading the legacy form where
    /// `facts.answered` was a bare list of keys instead of a map.
    ///
    /// Legacy keys carry no recoverable value, so they are locked as
    /// explicitly unavailable; this matches the old behavior of never
    /// re-asking them.
    pub fn migrate(mut blob: serde_json::Value) -> Result<Self, serde_json::Error> {
        if let Some(answered) = blob.pointer_mut("/facts/answered") {
            if let serde_json::Value::Array(keys) = answered {
                let map: serde_json::Map<String, serde_json::Value> = keys
                    .iter()
                    .filter_map(|k| k.as_str())
                    .map(|k| {
                        (
                            k.to_string(),
                            serde_json::Value::String(super::canonical::NOT_AVAILABLE.to_string()),
                        )
                    })
                    .collect();
                *answered = serde_json::Value::Object(map);
            }
        }
        serde_json::from_value(blob)
    }
}

fn normalize_language(code: &str) -> String {
    let code = code.trim().to_lowercase();
    if code.len() >= 2 && code.chars().take(2).all(|c| c.is_ascii_alphabetic()) {
        code.chars().take(2).collect()
    } else {
        "en".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_session() -> SessionState {
        SessionState::new(ThreadId::new("t1").unwrap())
    }

    mod defaults {
        use super::*;

        #[test]
        fn fresh_session_starts_in_investigation() {
            let session = new_session();
            assert_eq!(session.stage, Stage::Investigation);
            assert_eq!(session.turn_count, 0);
            assert_eq!(session.readiness_score, 0);
            assert_eq!(session.last_rejection_turn, -1);
            assert_eq!(session.fallback_turn, -1);
            assert!(session.messages.is_empty());
        }
    }

    mod transcript {
        use super::*;

        #[test]
        fn messages_append_in_order() {
            let mut session = new_session();
            session.record_user_message("hello");
            session.record_assistant_message("hi, what happened?");

            assert_eq!(session.messages.len(), 2);
            assert_eq!(session.messages[0].role, MessageRole::User);
            assert_eq!(session.messages[1].role, MessageRole::Assistant);
        }

        #[test]
        fn recent_assistant_questions_returns_last_two() {
            let mut session = new_session();
            session.record_assistant_message("q1");
            session.record_user_message("a1");
            session.record_assistant_message("q2");
            session.record_assistant_message("q3");

            let recent = session.recent_assistant_questions();
            assert_eq!(recent, vec!["q3".to_string(), "q2".to_string()]);
        }
    }

    mod language_lock {
        use super::*;

        #[test]
        fn first_detection_locks_the_language() {
            let mut session = new_session();
            session.lock_language("ta");
            assert_eq!(session.primary_language.as_deref(), Some("ta"));
            assert_eq!(session.user_language, "ta");
        }

        #[test]
        fn later_detections_do_not_override() {
            let mut session = new_session();
            session.lock_language("ta");
            session.lock_language("en");
            assert_eq!(session.user_language, "ta");
        }

        #[test]
        fn malformed_codes_fall_back_to_english() {
            let mut session = new_session();
            session.lock_language("1?");
            assert_eq!(session.user_language, "en");
        }

        #[test]
        fn long_codes_are_truncated() {
            let mut session = new_session();
            session.lock_language("english");
            assert_eq!(session.user_language, "en");
        }
    }

    mod asked_facts {
        use super::*;

        #[test]
        fn note_asked_grows_without_duplicates() {
            let mut session = new_session();
            session.note_asked("incident_date");
            session.note_asked("incident_date");
            session.note_asked("incident_location");
            assert_eq!(
                session.asked_facts,
                vec!["incident_date".to_string(), "incident_location".to_string()]
            );
        }
    }

    mod fallback_tracking {
        use super::*;

        #[test]
        fn replying_to_fallback_only_on_the_next_turn() {
            let mut session = new_session();
            assert!(!session.replying_to_fallback());

            session.turn_count = 4;
            session.fallback_turn = 3;
            assert!(session.replying_to_fallback());

            session.turn_count = 5;
            assert!(!session.replying_to_fallback());
        }
    }

    mod persistence {
        use super::*;

        #[test]
        fn round_trips_through_json() {
            let mut session = new_session();
            session.record_user_message("my landlord owes me a deposit");
            session.lock_language("en");
            session.turn_count = 1;

            let blob = serde_json::to_value(&session).unwrap();
            let restored = SessionState::migrate(blob).unwrap();
            assert_eq!(restored, session);
        }

        #[test]
        fn migrates_legacy_answered_list() {
            let session = new_session();
            let mut blob = serde_json::to_value(&session).unwrap();
            *blob.pointer_mut("/facts/answered").unwrap() =
                serde_json::json!(["incident_date", "incident_location"]);

            let restored = SessionState::migrate(blob).unwrap();
            assert!(restored.facts.answered().contains_key("incident_date"));
            assert!(restored.facts.answered().contains_key("incident_location"));
        }
    }
}
