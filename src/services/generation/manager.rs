//! Generation Manager
//!
//! Entry point for callers: builds the prompt, picks the cached adapter for
//! the configured provider and returns a chat outcome or a JSON object
//! outcome. Nothing here returns `Err`; every failure becomes the `error`
//! variant of the outcome.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use persona_chat_llm::{
    create_provider, ChatOutcome, LlmProvider, LlmResult, ProfileOutcome, ProviderConfig,
};

use super::cache::AdapterCache;
use crate::models::{Character, HistoryEntry, Persona};
use crate::services::prompt::{
    build_character_sheet_prompt, build_chat_prompt, build_profile_prompt, PromptFlags,
};
use crate::services::templates::{TemplateKind, TemplateStore};

/// Input for an in-character reply
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub persona: &'a Persona,
    pub character: &'a Character,
    pub history: &'a [HistoryEntry],
    pub templates: &'a TemplateStore,
    pub is_proactive: bool,
    pub force_summary: bool,
}

impl ChatRequest<'_> {
    fn flags(&self) -> PromptFlags {
        PromptFlags {
            is_proactive: self.is_proactive,
            force_summary: self.force_summary,
        }
    }
}

/// Builds prompts and dispatches them to provider adapters
#[derive(Default)]
pub struct GenerationManager {
    cache: AdapterCache,
}

impl GenerationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached adapter for `config`, created on first use.
    pub fn adapter(&self, config: &ProviderConfig) -> LlmResult<Arc<dyn LlmProvider>> {
        self.cache
            .get_or_insert_with(config.provider, &config.model, || {
                create_provider(config.clone())
            })
    }

    /// Forget all adapters. Call after credentials or provider settings change.
    pub fn update_credentials(&self) {
        self.cache.invalidate();
    }

    pub fn cached_adapters(&self) -> usize {
        self.cache.len()
    }

    /// Generate the character's next reply.
    pub async fn generate_content(
        &self,
        config: &ProviderConfig,
        request: ChatRequest<'_>,
    ) -> ChatOutcome {
        self.generate_content_at(config, request, Utc::now()).await
    }

    /// [`generate_content`](Self::generate_content) with an explicit clock.
    pub async fn generate_content_at(
        &self,
        config: &ProviderConfig,
        request: ChatRequest<'_>,
        now: DateTime<Utc>,
    ) -> ChatOutcome {
        let adapter = match self.adapter(config) {
            Ok(adapter) => adapter,
            Err(e) => return e.into(),
        };

        let prompt = build_chat_prompt(
            request.character,
            request.persona,
            request.history,
            request.templates.get(TemplateKind::MainChat),
            request.flags(),
            now,
        );

        let mut outcome = adapter.generate_content(prompt, request.is_proactive).await;
        if let ChatOutcome::Reply(reply) = &mut outcome {
            request.character.resolve_stickers(reply);
        }
        outcome
    }

    /// Invent a character for the user described by `persona`.
    ///
    /// `template` replaces the stored profile-creation template when given.
    pub async fn generate_profile(
        &self,
        config: &ProviderConfig,
        persona: &Persona,
        templates: &TemplateStore,
        template: Option<&str>,
    ) -> ProfileOutcome {
        let adapter = match self.adapter(config) {
            Ok(adapter) => adapter,
            Err(e) => return e.into(),
        };

        let template = template
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| templates.get(TemplateKind::ProfileCreation));
        adapter
            .generate_profile(build_profile_prompt(persona, template))
            .await
    }

    /// Write a profile card for an existing character.
    pub async fn generate_character_sheet(
        &self,
        config: &ProviderConfig,
        character: &Character,
        persona: &Persona,
        templates: &TemplateStore,
    ) -> ProfileOutcome {
        let adapter = match self.adapter(config) {
            Ok(adapter) => adapter,
            Err(e) => return e.into(),
        };

        let prompt = build_character_sheet_prompt(
            character,
            persona,
            templates.get(TemplateKind::CharacterSheet),
        );
        adapter.generate_profile(prompt).await
    }
}
