//! Session coordinator.
//!
//! Drives one conversation turn end to end: serialize per thread,
//! replay duplicates, extract facts through the oracle, merge, score,
//! pick the stage transition, and produce exactly one reply. All stage
//! and scoring rules live in the domain; this module sequences them
//! and owns the I/O boundaries.

use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex as TokioMutex;

use crate::domain::foundation::{StateMachine, ThreadId, ValidationError};
use crate::domain::intake::{
    canonical_key, canonicalize, is_placeholder, next_question, readiness, MergeReport,
    QuestionPlan, ReadinessGuards, SessionState, Stage, TargetingContext, TriggerClassifier,
    TriggerKind, TurnOutcome, NOT_AVAILABLE,
};
use crate::ports::{
    DocumentRenderer, ExtractionRequest, FactExtractionOracle, OracleResponse, RenderRequest,
    SafetyStatus, SessionStore, SessionStoreError,
};

/// Score at or above which the session may move to confirmation
/// without an explicit completion request.
pub const READINESS_THRESHOLD: u8 = 80;

/// Minimum processed turns before confirmation is reachable, even on
/// an explicit completion request.
pub const MIN_INVESTIGATION_TURNS: u32 = 2;

const REFUSAL_MESSAGE: &str = "I'm sorry, but I can't help with that request. \
I can only assist with preparing legitimate legal documents and complaints.";

const ALREADY_COMPLETED_MESSAGE: &str = "Your document has already been generated for this \
conversation. Please start a new conversation for a different matter.";

const EDIT_PROMPT: &str =
    "Of course. Which detail would you like to change? Please tell me the corrected information.";

const RENDER_RETRY_MESSAGE: &str = "I wasn't able to prepare your document just now. \
Please reply CONFIRM again in a moment and I will retry.";

/// Turn processing errors surfaced to the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Store(#[from] SessionStoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Owns the turn pipeline and the per-thread serialization locks.
pub struct SessionCoordinator {
    oracle: Arc<dyn FactExtractionOracle>,
    renderer: Arc<dyn DocumentRenderer>,
    store: Arc<dyn SessionStore>,
    triggers: Arc<dyn TriggerClassifier>,
    // Guards the lock map itself; held only to clone out a thread lock.
    locks: StdMutex<HashMap<String, Arc<TokioMutex<()>>>>,
}

impl SessionCoordinator {
    pub fn new(
        oracle: Arc<dyn FactExtractionOracle>,
        renderer: Arc<dyn DocumentRenderer>,
        store: Arc<dyn SessionStore>,
        triggers: Arc<dyn TriggerClassifier>,
    ) -> Self {
        Self {
            oracle,
            renderer,
            store,
            triggers,
            locks: StdMutex::new(HashMap::new()),
        }
    }

    /// Processes one user message for a thread and returns the reply.
    ///
    /// Turns for the same thread are serialized; turns for different
    /// threads run concurrently. A message identical to the previous
    /// one replays the cached outcome without re-processing.
    #[tracing::instrument(skip_all, fields(thread_id = %thread_id))]
    pub async fn process_message(
        &self,
        thread_id: ThreadId,
        text: &str,
    ) -> Result<TurnOutcome, CoordinatorError> {
        let lock = self.thread_lock(thread_id.as_str());
        let _guard = lock.lock().await;

        let mut session = match self.store.load(&thread_id).await {
            Ok(session) => session,
            Err(SessionStoreError::NotFound(_)) => SessionState::new(thread_id),
            Err(err) => return Err(err.into()),
        };

        let fingerprint = input_fingerprint(text);
        if session.last_input_hash.as_deref() == Some(fingerprint.as_str()) {
            if let Some(outcome) = &session.last_outcome {
                tracing::debug!("duplicate input, replaying cached outcome");
                return Ok(outcome.clone());
            }
        }

        if session.stage.is_terminal() {
            let content = match session.stage {
                Stage::Refused => REFUSAL_MESSAGE,
                _ => ALREADY_COMPLETED_MESSAGE,
            };
            return Ok(TurnOutcome {
                content: content.to_string(),
                facts: session.facts.merged(),
                intent: session.intent.clone(),
                readiness_score: session.readiness_score,
                is_document: false,
            });
        }

        session.record_user_message(text);
        session.turn_count += 1;

        let response = match self
            .oracle
            .extract(ExtractionRequest {
                message: text,
                history: &session.messages,
                known_facts: session.facts.answered(),
                prior_intent: &session.intent,
            })
            .await
        {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "extraction failed, continuing without new facts");
                OracleResponse::empty()
            }
        };

        if let Some(lang) = &response.detected_language {
            session.lock_language(lang);
        }
        if !response.intent.is_empty() {
            session.intent = response.intent.clone();
        }

        if response.safety_status == SafetyStatus::Unsafe {
            tracing::info!("unsafe request, refusing");
            session.stage = session.stage.transition_to(Stage::Refused)?;
            return self
                .finish_turn(&mut session, fingerprint, REFUSAL_MESSAGE.to_string(), false)
                .await;
        }

        let merge = session.facts.merge(
            canonicalize(response.extracted_critical_facts),
            canonicalize(response.extracted_optional_facts),
        );

        if !response.required_keys_schema.is_empty() {
            let mut seen = HashSet::new();
            session.required_keys = response
                .required_keys_schema
                .iter()
                .map(|k| canonical_key(k))
                .filter(|k| seen.insert(k.clone()))
                .collect();
        }
        session.missing_fields = session
            .required_keys
            .iter()
            .filter(|k| !session.facts.answered().contains_key(k.as_str()))
            .cloned()
            .collect();

        // Any new information ends a rejection cooldown.
        if !merge.is_empty() {
            session.last_rejection_turn = -1;
        }

        let guards = ReadinessGuards {
            previous_score: session.readiness_score,
            turn_count: session.turn_count,
            merge,
            open_conflicts: session.facts.has_conflicts(),
            has_placeholder: session.facts.critical_values().any(|v| is_placeholder(v)),
        };
        // A confirmation turn that changed nothing keeps its score; an
        // explicit completion forced it to 100 and that value must hold
        // through CONFIRM.
        if session.stage == Stage::Investigation
            || !merge.is_empty()
            || session.facts.has_conflicts()
        {
            session.readiness_score =
                readiness::score(&session.required_keys, session.facts.answered(), &guards);
        }

        let kinds = self.triggers.classify(text);
        let (content, is_document) = match session.stage {
            Stage::Investigation => self.investigation_reply(&mut session, &kinds, merge)?,
            Stage::Confirmation => self.confirmation_reply(&mut session, &kinds).await?,
            // Terminal stages returned above.
            Stage::Completed | Stage::Refused => (ALREADY_COMPLETED_MESSAGE.to_string(), false),
        };

        tracing::info!(
            stage = ?session.stage,
            readiness = session.readiness_score,
            turn = session.turn_count,
            "turn processed"
        );
        self.finish_turn(&mut session, fingerprint, content, is_document)
            .await
    }

    /// Investigation-stage reply: advance to confirmation when earned
    /// or explicitly requested, otherwise ask the next question.
    fn investigation_reply(
        &self,
        session: &mut SessionState,
        kinds: &HashSet<TriggerKind>,
        merge: MergeReport,
    ) -> Result<(String, bool), CoordinatorError> {
        let replying_to_fallback = session.replying_to_fallback();
        let express = kinds.contains(&TriggerKind::ExpressCompletion)
            || (kinds.contains(&TriggerKind::AmbiguousAffirmative)
                && merge.is_empty()
                && !replying_to_fallback)
            || (replying_to_fallback && kinds.contains(&TriggerKind::NegativeReply));

        let ready_by_score =
            session.readiness_score >= READINESS_THRESHOLD && session.last_rejection_turn < 0;
        let can_confirm =
            session.turn_count >= MIN_INVESTIGATION_TURNS && !session.facts.has_conflicts();

        if can_confirm && (express || ready_by_score) {
            if express {
                // An explicit completion overrides the computed score.
                session.readiness_score = 100;
            }
            session.stage = session.stage.transition_to(Stage::Confirmation)?;
            return Ok((confirmation_prompt(session), false));
        }

        // A bare affirmative to the fallback question means more detail
        // is coming, not that the user is done.
        if replying_to_fallback
            && kinds.contains(&TriggerKind::AmbiguousAffirmative)
            && merge.is_empty()
        {
            return Ok(("Please go ahead, I'm listening.".to_string(), false));
        }

        let recent = session.recent_assistant_questions();
        let plan = next_question(&TargetingContext {
            missing_fields: &session.missing_fields,
            answered: session.facts.answered(),
            asked_facts: &session.asked_facts,
            conflicts: session.facts.conflicts(),
            fallback_asked: session.fallback_turn >= 0,
            recent_questions: &recent,
        });

        match plan {
            QuestionPlan::Clarify { question, .. } => Ok((question, false)),
            QuestionPlan::Ask { key, question } => {
                session.note_asked(key);
                Ok((question, false))
            }
            QuestionPlan::Fallback { question } => {
                session.fallback_turn = i64::from(session.turn_count);
                Ok((question, false))
            }
            QuestionPlan::ProceedToConfirmation => {
                if can_confirm && session.last_rejection_turn < 0 {
                    session.readiness_score = 100;
                    session.stage = session.stage.transition_to(Stage::Confirmation)?;
                    Ok((confirmation_prompt(session), false))
                } else {
                    // Too early (or mid rejection cooldown) and nothing
                    // left to target; keep investigating.
                    Ok((
                        "Could you tell me more about what happened?".to_string(),
                        false,
                    ))
                }
            }
        }
    }

    /// Confirmation-stage reply: approval renders the document once,
    /// rejection reopens investigation, new contradictions get
    /// clarified, anything else re-presents the prompt.
    async fn confirmation_reply(
        &self,
        session: &mut SessionState,
        kinds: &HashSet<TriggerKind>,
    ) -> Result<(String, bool), CoordinatorError> {
        if kinds.contains(&TriggerKind::Rejection) {
            session.stage = session.stage.transition_to(Stage::Investigation)?;
            session.last_rejection_turn = i64::from(session.turn_count);
            return Ok((EDIT_PROMPT.to_string(), false));
        }

        if session.facts.has_conflicts() {
            session.stage = session.stage.transition_to(Stage::Investigation)?;
            let recent = session.recent_assistant_questions();
            let plan = next_question(&TargetingContext {
                missing_fields: &session.missing_fields,
                answered: session.facts.answered(),
                asked_facts: &session.asked_facts,
                conflicts: session.facts.conflicts(),
                fallback_asked: session.fallback_turn >= 0,
                recent_questions: &recent,
            });
            if let QuestionPlan::Clarify { question, .. } = plan {
                return Ok((question, false));
            }
            return Ok((confirmation_prompt(session), false));
        }

        let approves = kinds.contains(&TriggerKind::Approval)
            || kinds.contains(&TriggerKind::ExpressCompletion);
        if approves {
            let facts = session.facts.merged();
            match self
                .renderer
                .render(RenderRequest {
                    intent: &session.intent,
                    facts: &facts,
                    user_language: &session.user_language,
                    readiness_score: session.readiness_score,
                })
                .await
            {
                Ok(bundle) => {
                    session.stage = session.stage.transition_to(Stage::Completed)?;
                    tracing::info!(document_type = %bundle.document_type, "document generated");
                    return Ok((bundle.content_user_language, true));
                }
                Err(err) => {
                    tracing::error!(error = %err, "document rendering failed");
                    return Ok((RENDER_RETRY_MESSAGE.to_string(), false));
                }
            }
        }

        // Volunteered corrections and everything else re-present the
        // updated summary.
        Ok((confirmation_prompt(session), false))
    }

    async fn finish_turn(
        &self,
        session: &mut SessionState,
        fingerprint: String,
        content: String,
        is_document: bool,
    ) -> Result<TurnOutcome, CoordinatorError> {
        session.record_assistant_message(content.clone());
        let outcome = TurnOutcome {
            content,
            facts: session.facts.merged(),
            intent: session.intent.clone(),
            readiness_score: session.readiness_score,
            is_document,
        };
        session.last_input_hash = Some(fingerprint);
        session.last_outcome = Some(outcome.clone());
        self.store.save(session).await?;
        Ok(outcome)
    }

    fn thread_lock(&self, thread_id: &str) -> Arc<TokioMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(TokioMutex::new(())))
            .clone()
    }
}

/// SHA-256 fingerprint of the raw message, for duplicate detection.
fn input_fingerprint(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// The confirmation summary shown before document generation.
fn confirmation_prompt(session: &SessionState) -> String {
    let mut lines: Vec<String> = session
        .facts
        .answered()
        .iter()
        .filter(|(_, v)| v.as_str() != NOT_AVAILABLE)
        .map(|(key, value)| format!("- {}: {}", key.replace('_', " "), value))
        .collect();
    lines.sort();

    format!(
        "Here is what I have recorded so far:\n{}\n\nReply CONFIRM to generate your document, \
or EDIT to change any detail.",
        lines.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_and_input_sensitive() {
        assert_eq!(input_fingerprint("hello"), input_fingerprint("hello"));
        assert_ne!(input_fingerprint("hello"), input_fingerprint("hello "));
        assert_eq!(input_fingerprint("hello").len(), 64);
    }

    #[test]
    fn confirmation_prompt_lists_facts_and_hides_unavailable() {
        let mut session = SessionState::new(ThreadId::new("t1").unwrap());
        session.facts.merge(
            vec![
                ("amount_involved".to_string(), "50,000".to_string()),
                ("incident_date".to_string(), NOT_AVAILABLE.to_string()),
            ],
            vec![],
        );

        let prompt = confirmation_prompt(&session);
        assert!(prompt.contains("amount involved: 50,000"));
        assert!(!prompt.contains(NOT_AVAILABLE));
        assert!(prompt.contains("CONFIRM"));
        assert!(prompt.contains("EDIT"));
    }
}
