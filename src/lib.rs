//! Persona Chat - Rust Backend Library
//!
//! Prompt compilation and multi-provider generation for character role-play
//! chat. It includes:
//! - Domain models (characters, personas, history, settings)
//! - ChatML template store and canonical prompt builder
//! - Cached provider adapters behind a generation manager
//! - JSON settings persistence

pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use models::settings::{AppSettings, SettingsUpdate};
pub use models::{Character, EntryKind, HistoryEntry, MediaAttachment, Persona, Sticker};
pub use services::{ChatRequest, GenerationManager, PromptFlags, TemplateKind, TemplateStore};
pub use storage::SettingsService;
pub use utils::error::{AppError, AppResult};

pub use persona_chat_llm::{ChatOutcome, ChatReply, ProfileOutcome, ProviderConfig, ProviderType};
