//! Legal intake dialogue engine.
//!
//! A conversational state machine that gathers the facts of a legal
//! grievance over multiple turns, detects and resolves contradictions,
//! scores how complete the picture is, and drafts a formal document
//! once the user confirms the collected facts.
//!
//! The crate follows a hexagonal layout:
//!
//! - `domain`: pure turn logic (merging, scoring, staging, targeting)
//! - `ports`: traits for the extraction oracle, renderer, and storage
//! - `adapters`: Gemini, template renderer, memory/file stores, HTTP
//! - `application`: the session coordinator wiring a turn end to end
//! - `config`: environment-driven configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
