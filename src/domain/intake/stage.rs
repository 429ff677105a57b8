//! Conversation stage machine.
//!
//! The stage is the coarse phase of an intake conversation and gates
//! which outputs are permissible: questions during investigation, the
//! confirmation prompt, the final document, or the fixed refusal.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Coarse conversational phase of an intake session.
///
/// - `Investigation`: collecting facts through targeted questions
/// - `Confirmation`: facts gathered, awaiting explicit approval
/// - `Completed`: document emitted, session is read-only
/// - `Refused`: safety short-circuit, no further extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Investigation,
    Confirmation,
    Completed,
    Refused,
}

impl Stage {
    /// Returns true if the session still processes extractions.
    pub fn is_collecting(&self) -> bool {
        matches!(self, Self::Investigation | Self::Confirmation)
    }
}

impl StateMachine for Stage {
    fn can_transition_to(&self, target: &Self) -> bool {
        use Stage::*;
        matches!(
            (self, target),
            // Enough facts gathered, or an explicit completion trigger
            (Investigation, Confirmation) |
            // Explicit rejection of the confirmation prompt
            (Confirmation, Investigation) |
            // Explicit approval, document emitted
            (Confirmation, Completed) |
            // Safety short-circuit is reachable from any live stage
            (Investigation, Refused) |
            (Confirmation, Refused)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use Stage::*;
        match self {
            Investigation => vec![Confirmation, Refused],
            Confirmation => vec![Investigation, Completed, Refused],
            Completed => vec![],
            Refused => vec![],
        }
    }
}
