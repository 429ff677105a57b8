//! Application layer: orchestrates domain logic across the ports.

pub mod coordinator;

pub use coordinator::{
    CoordinatorError, SessionCoordinator, MIN_INVESTIGATION_TURNS, READINESS_THRESHOLD,
};
