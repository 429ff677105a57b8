//! Ports: interfaces between the domain and the outside world.
//!
//! Adapters implement these traits; the application layer depends only
//! on the traits.

pub mod document_renderer;
pub mod extraction_oracle;
pub mod session_store;

pub use document_renderer::{DocumentBundle, DocumentRenderer, RenderError, RenderRequest};
pub use extraction_oracle::{
    ExtractionError, ExtractionRequest, FactExtractionOracle, OracleResponse, SafetyStatus,
};
pub use session_store::{SessionStore, SessionStoreError};
