//! Foundation - shared kernel for the domain layer.
//!
//! Value objects and traits used across domain modules: strongly-typed
//! identifiers, validation errors, and the state machine trait.

mod errors;
mod ids;
mod state_machine;

pub use errors::ValidationError;
pub use ids::ThreadId;
pub use state_machine::StateMachine;
