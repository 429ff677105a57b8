//! Adapters: concrete implementations of the ports.

pub mod http;
pub mod oracle;
pub mod renderer;
pub mod storage;
