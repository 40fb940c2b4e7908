//! Template Store
//!
//! Built-in templates with user overrides layered on top. Overrides are
//! merged at read time; defaults are never modified.

use std::collections::HashMap;

use persona_chat_core::{is_valid_chatml, parse_chatml_strict};

use super::defaults::{CHARACTER_SHEET_TEMPLATE, MAIN_CHAT_TEMPLATE, PROFILE_CREATION_TEMPLATE};
use super::TemplateKind;
use crate::utils::error::{AppError, AppResult};

/// Named ChatML templates with optional user overrides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateStore {
    overrides: HashMap<TemplateKind, String>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a store from persisted overrides.
    ///
    /// Invalid or blank entries are skipped with a warning so that one bad
    /// template cannot block startup.
    pub fn from_overrides(overrides: &HashMap<TemplateKind, String>) -> Self {
        let mut store = Self::new();
        for (kind, text) in overrides {
            if let Err(e) = store.set_override(*kind, text.clone()) {
                tracing::warn!("Ignoring stored {} template: {}", kind, e);
            }
        }
        store
    }

    /// Built-in text for `kind`.
    pub fn default_template(kind: TemplateKind) -> &'static str {
        match kind {
            TemplateKind::MainChat => MAIN_CHAT_TEMPLATE,
            TemplateKind::ProfileCreation => PROFILE_CREATION_TEMPLATE,
            TemplateKind::CharacterSheet => CHARACTER_SHEET_TEMPLATE,
        }
    }

    /// The override for `kind` if one is set, else the built-in default.
    pub fn get(&self, kind: TemplateKind) -> &str {
        self.overrides
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| Self::default_template(kind))
    }

    /// Check that `text` is usable as a template.
    pub fn validate_override(text: &str) -> AppResult<()> {
        if is_valid_chatml(text) {
            return Ok(());
        }
        // The strict parser explains what is wrong.
        parse_chatml_strict(text)
            .map(|_| ())
            .map_err(|e| AppError::validation(e.to_string()))
    }

    /// Store a custom template. Blank text resets to the default.
    pub fn set_override(&mut self, kind: TemplateKind, text: impl Into<String>) -> AppResult<()> {
        let text = text.into();
        if text.trim().is_empty() {
            self.reset(kind);
            return Ok(());
        }
        Self::validate_override(&text)?;
        self.overrides.insert(kind, text);
        Ok(())
    }

    /// Drop the override for `kind`.
    pub fn reset(&mut self, kind: TemplateKind) {
        self.overrides.remove(&kind);
    }

    pub fn is_customized(&self, kind: TemplateKind) -> bool {
        self.overrides.contains_key(&kind)
    }

    /// Current overrides, for persistence.
    pub fn overrides(&self) -> &HashMap<TemplateKind, String> {
        &self.overrides
    }
}
