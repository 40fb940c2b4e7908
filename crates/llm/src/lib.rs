//! Persona Chat LLM
//!
//! Provider adapters that turn a canonical prompt into a vendor request and
//! the vendor response back into a chat reply:
//! - Google Gemini
//! - Anthropic Claude
//! - OpenAI-compatible endpoints (OpenAI, Grok, OpenRouter, custom)
//!
//! Also includes response recovery and the HTTP client factory.

pub mod anthropic;
pub mod factory;
pub mod gemini;
pub mod http_client;
pub mod openai;
pub mod provider;
pub mod recovery;
pub mod types;

// Re-export main types
pub use anthropic::AnthropicProvider;
pub use factory::create_provider;
pub use gemini::GeminiProvider;
pub use http_client::build_http_client;
pub use openai::{OpenAICompatibleProvider, OpenAIFlavor};
pub use provider::{LlmProvider, PreparedRequest};
pub use recovery::{recover_object, recover_reply};
pub use types::*;
