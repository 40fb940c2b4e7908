//! Prompt Compilation
//!
//! Turns a template, a character, a persona and the conversation history
//! into the provider-agnostic prompt consumed by the adapters.

pub mod builder;
pub mod context;

pub use builder::{
    build_character_sheet_prompt, build_chat_prompt, build_profile_prompt, history_turn,
    PromptFlags, GENERATE_NOW_PROMPT,
};
pub use context::{describe_elapsed, time_context, RenderContext, TimeContext};
