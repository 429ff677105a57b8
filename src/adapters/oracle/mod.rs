//! Fact extraction oracle adapters.

pub mod gemini_oracle;
pub mod scripted_oracle;

pub use gemini_oracle::{GeminiConfig, GeminiOracle};
pub use scripted_oracle::ScriptedOracle;
