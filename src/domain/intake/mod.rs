//! Intake conversation domain.
//!
//! Everything that decides what happens on a turn lives here: fact
//! canonicalization and merging, readiness scoring, trigger detection,
//! question targeting, the stage machine, and the session aggregate
//! that ties them together. Nothing in this module performs I/O.

pub mod canonical;
pub mod facts;
pub mod question;
pub mod readiness;
pub mod session;
pub mod stage;
pub mod triggers;

pub use canonical::{canonical_key, canonicalize, normalize_value, NOT_AVAILABLE};
pub use facts::{FactConflict, FactStatus, FactStore, MergeReport};
pub use question::{next_question, QuestionPlan, TargetingContext, FALLBACK_QUESTION};
pub use readiness::{is_placeholder, ReadinessGuards};
pub use session::{MessageRole, SessionState, TurnMessage, TurnOutcome};
pub use stage::Stage;
pub use triggers::{KeywordTriggerClassifier, TriggerClassifier, TriggerKind};
