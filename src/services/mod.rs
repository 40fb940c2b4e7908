//! Services
//!
//! Business logic for the application: templates, prompt compilation and
//! generation.

pub mod generation;
pub mod prompt;
pub mod templates;

pub use generation::{AdapterCache, ChatRequest, GenerationManager};
pub use prompt::PromptFlags;
pub use templates::{TemplateKind, TemplateStore};
