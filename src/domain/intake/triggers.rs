//! Turn trigger classification.
//!
//! Stage transitions hinge on a handful of user signals: "just draft
//! it already", a bare "yes", the CONFIRM/EDIT replies to the
//! confirmation prompt, and the negative reply to the fallback
//! question. Rather than scattering string checks through the flow,
//! detection sits behind a closed classifier interface with a
//! rule-table implementation; an oracle-backed classifier can slot in
//! behind the same trait.

use std::collections::HashSet;

/// A recognized signal in the latest user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    /// Explicit request to stop collecting and move on ("proceed",
    /// "generate", "no more details", ...).
    ExpressCompletion,
    /// Bare affirmative ("yes", "ok") that only means "move on" when
    /// the turn carried no new facts.
    AmbiguousAffirmative,
    /// Explicit approval of the confirmation prompt ("CONFIRM").
    Approval,
    /// Explicit rejection of the confirmation prompt ("EDIT",
    /// "CHANGE", "WRONG").
    Rejection,
    /// Negative reply to the open-ended fallback question ("no",
    /// "nothing").
    NegativeReply,
}

/// Classifies a user message into the trigger kinds it carries.
pub trait TriggerClassifier: Send + Sync {
    fn classify(&self, text: &str) -> HashSet<TriggerKind>;
}

const EXPRESS_COMPLETION_WORDS: &[&str] = &["proceed", "generate", "continue", "draft", "done"];
const EXPRESS_COMPLETION_PHRASES: &[&str] =
    &["no more details", "nothing else", "that's all", "that is all", "go ahead"];
const AMBIGUOUS_AFFIRMATIVE_WORDS: &[&str] =
    &["yes", "ok", "okay", "yeah", "sure", "correct", "right", "agree"];
const APPROVAL_WORDS: &[&str] = &["confirm"];
const REJECTION_WORDS: &[&str] = &["edit", "change", "wrong"];
const NEGATIVE_REPLY_WORDS: &[&str] = &["no", "nothing", "done", "nope"];
const NEGATIVE_REPLY_PHRASES: &[&str] = &["that's it", "that is it", "nothing else"];

/// Rule-table trigger classifier.
///
/// Matches whole lowercased tokens for single keywords and substring
/// containment for multi-word phrases, so "north" never matches "no"
/// and "EDIT" matches case-insensitively.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordTriggerClassifier;

impl KeywordTriggerClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl TriggerClassifier for KeywordTriggerClassifier {
    fn classify(&self, text: &str) -> HashSet<TriggerKind> {
        let lowered = text.to_lowercase();
        let tokens: HashSet<&str> = lowered
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|t| !t.is_empty())
            .collect();

        let has_word = |words: &[&str]| words.iter().any(|w| tokens.contains(w));
        let has_phrase = |phrases: &[&str]| phrases.iter().any(|p| lowered.contains(p));

        let mut kinds = HashSet::new();
        if has_word(EXPRESS_COMPLETION_WORDS) || has_phrase(EXPRESS_COMPLETION_PHRASES) {
            kinds.insert(TriggerKind::ExpressCompletion);
        }
        if has_word(AMBIGUOUS_AFFIRMATIVE_WORDS) {
            kinds.insert(TriggerKind::AmbiguousAffirmative);
        }
        if has_word(APPROVAL_WORDS) {
            kinds.insert(TriggerKind::Approval);
        }
        if has_word(REJECTION_WORDS) {
            kinds.insert(TriggerKind::Rejection);
        }
        if has_word(NEGATIVE_REPLY_WORDS) || has_phrase(NEGATIVE_REPLY_PHRASES) {
            kinds.insert(TriggerKind::NegativeReply);
        }
        kinds
    }
}
