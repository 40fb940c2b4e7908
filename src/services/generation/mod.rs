//! Generation
//!
//! Adapter caching and the request entry points used by the chat UI.

pub mod cache;
pub mod manager;

pub use cache::AdapterCache;
pub use manager::{ChatRequest, GenerationManager};
