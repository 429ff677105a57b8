//! Session storage adapters.

pub mod file_session_store;
pub mod in_memory_session_store;

pub use file_session_store::FileSessionStore;
pub use in_memory_session_store::InMemorySessionStore;
