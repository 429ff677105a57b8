//! Question targeting.
//!
//! Chooses the next fact to elicit from the user. Conflicts always
//! come first, then the highest-priority missing field that has not
//! been asked about, then the single open-ended fallback question.
//! The targeter never re-asks an answered or already-asked key and
//! never repeats either of the two most recent assistant questions
//! verbatim.

use std::collections::HashMap;

use super::facts::FactConflict;

/// The open-ended question used when no specific field remains.
pub const FALLBACK_QUESTION: &str =
    "Is there any other important detail or document you haven't mentioned?";

/// Fixed priority of canonical dimensions: identity of the parties
/// first, then the incident itself, then supporting material.
const PRIORITY_ORDER: &[&str] = &[
    "full_name",
    "contact_details",
    "opposing_party",
    "incident_date",
    "incident_location",
    "incident_description",
    "amount_involved",
    "evidence_available",
    "witness_details",
];

/// What the targeter decided to do this turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionPlan {
    /// Ask the user to settle a fact conflict.
    Clarify { key: String, question: String },
    /// Ask for a specific missing field; the caller records the key in
    /// `asked_facts`.
    Ask { key: String, question: String },
    /// Ask the one-time open-ended fallback; the caller records
    /// `fallback_turn`.
    Fallback { question: String },
    /// Nothing left to ask; the stage machine should move toward
    /// confirmation.
    ProceedToConfirmation,
}

/// Inputs for one targeting decision.
#[derive(Debug)]
pub struct TargetingContext<'a> {
    /// Schema keys still required and unanswered, in schema order.
    pub missing_fields: &'a [String],
    /// Facts already locked with a value.
    pub answered: &'a HashMap<String, String>,
    /// Keys already posed as a question this session.
    pub asked_facts: &'a [String],
    /// Open conflicts, in detection order.
    pub conflicts: &'a [FactConflict],
    /// Whether the fallback question has been asked already.
    pub fallback_asked: bool,
    /// The last two assistant questions, for verbatim-repeat checks.
    pub recent_questions: &'a [String],
}

/// Picks the next question per the targeting rules.
pub fn next_question(ctx: &TargetingContext<'_>) -> QuestionPlan {
    for conflict in ctx.conflicts {
        let question = clarification_question(conflict);
        if ctx.recent_questions.contains(&question) {
            continue;
        }
        return QuestionPlan::Clarify {
            key: conflict.key.clone(),
            question,
        };
    }

    let mut candidates: Vec<&String> = ctx
        .missing_fields
        .iter()
        .filter(|k| !ctx.answered.contains_key(k.as_str()))
        .filter(|k| !ctx.asked_facts.contains(k))
        .collect();
    candidates.sort_by_key(|k| priority_rank(k));

    for key in candidates {
        let question = field_question(key);
        if ctx.recent_questions.contains(&question) {
            continue;
        }
        return QuestionPlan::Ask {
            key: key.clone(),
            question,
        };
    }

    if !ctx.fallback_asked {
        QuestionPlan::Fallback {
            question: FALLBACK_QUESTION.to_string(),
        }
    } else {
        QuestionPlan::ProceedToConfirmation
    }
}

fn priority_rank(key: &str) -> usize {
    PRIORITY_ORDER
        .iter()
        .position(|k| *k == key)
        .unwrap_or(PRIORITY_ORDER.len())
}

/// Question text for a canonical dimension.
fn field_question(key: &str) -> String {
    match key {
        "full_name" => "To formalize the draft, could you please share your full name?".to_string(),
        "contact_details" => {
            "What is the best phone number or email address to reach you?".to_string()
        }
        "opposing_party" => {
            "Who is the other party in this matter? Their full name, if you know it.".to_string()
        }
        "incident_date" => "When did this happen?".to_string(),
        "incident_location" => "Where did this take place?".to_string(),
        "incident_description" => {
            "Could you describe what happened in a little more detail?".to_string()
        }
        "amount_involved" => "What amount of money is involved?".to_string(),
        "evidence_available" => {
            "Do you have any documents or proof related to this, such as an agreement, receipts, or messages?"
                .to_string()
        }
        "witness_details" => "Was anyone present who witnessed what happened?".to_string(),
        other => format!("Could you tell me about the {}?", other.replace('_', " ")),
    }
}

/// Clarification question for a conflicted key. Mentions both values
/// in context rather than listing them mechanically.
fn clarification_question(conflict: &FactConflict) -> String {
    format!(
        "Earlier you mentioned {} for the {}, but just now you said {}. Which one should I record?",
        conflict.previous,
        conflict.key.replace('_', " "),
        conflict.proposed,
    )
}
