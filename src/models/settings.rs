//! Settings Models
//!
//! Provider selection, credentials, generation budgets and template
//! overrides stored in settings.json.

use std::collections::HashMap;

use persona_chat_core::ProxyConfig;
use persona_chat_llm::{ProviderConfig, ProviderType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::services::templates::{TemplateKind, TemplateStore};

/// Per-provider credentials and model choice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    /// Read from legacy files but never written; the key lives in the secret store.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Model name; the provider default is used when blank
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Provider-specific options (e.g. OpenRouter attribution)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub options: HashMap<String, Value>,
}

/// Token and temperature budgets shared by all providers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationBudgets {
    pub max_tokens: u32,
    pub temperature: f32,
    pub profile_max_tokens: u32,
    pub profile_temperature: f32,
}

impl Default for GenerationBudgets {
    fn default() -> Self {
        let defaults = ProviderConfig::default();
        Self {
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
            profile_max_tokens: defaults.profile_max_tokens,
            profile_temperature: defaults.profile_temperature,
        }
    }
}

/// Application settings stored in settings.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub selected_provider: ProviderType,
    #[serde(default)]
    pub providers: HashMap<ProviderType, ProviderSettings>,
    #[serde(default)]
    pub budgets: GenerationBudgets,
    #[serde(default)]
    pub template_overrides: HashMap<TemplateKind, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            selected_provider: ProviderType::Gemini,
            providers: HashMap::new(),
            budgets: GenerationBudgets::default(),
            template_overrides: HashMap::new(),
            proxy: None,
            timeout_secs: None,
        }
    }
}

/// Partial update for one provider's settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettingsUpdate {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub options: Option<HashMap<String, Value>>,
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub selected_provider: Option<ProviderType>,
    #[serde(default)]
    pub providers: HashMap<ProviderType, ProviderSettingsUpdate>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub profile_max_tokens: Option<u32>,
    pub profile_temperature: Option<f32>,
    pub template_overrides: Option<HashMap<TemplateKind, String>>,
    pub proxy: Option<ProxyConfig>,
    /// Remove the proxy; wins over `proxy`
    #[serde(default)]
    pub clear_proxy: bool,
    pub timeout_secs: Option<u64>,
}

/// Empty strings clear optional text fields.
fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl AppSettings {
    /// Adapter configuration for `provider`.
    pub fn provider_config_for(&self, provider: ProviderType) -> ProviderConfig {
        let stored = self.providers.get(&provider).cloned().unwrap_or_default();
        let model = if stored.model.trim().is_empty() {
            provider.default_model().to_string()
        } else {
            stored.model
        };

        ProviderConfig {
            provider,
            api_key: stored.api_key,
            base_url: stored.base_url,
            model,
            max_tokens: self.budgets.max_tokens,
            temperature: self.budgets.temperature,
            profile_max_tokens: self.budgets.profile_max_tokens,
            profile_temperature: self.budgets.profile_temperature,
            proxy: self.proxy.clone(),
            timeout_secs: self.timeout_secs,
            options: stored.options,
        }
    }

    /// Adapter configuration for the selected provider.
    pub fn provider_config(&self) -> ProviderConfig {
        self.provider_config_for(self.selected_provider)
    }

    /// Template store seeded with the stored overrides.
    pub fn template_store(&self) -> TemplateStore {
        TemplateStore::from_overrides(&self.template_overrides)
    }

    /// Apply a partial update to the settings.
    ///
    /// Returns `true` when anything a constructed adapter captures (keys,
    /// endpoints, models, budgets, proxy, timeout) changed, meaning cached
    /// adapters are stale.
    pub fn apply_update(&mut self, update: SettingsUpdate) -> bool {
        let before: Vec<ProviderConfig> = ProviderType::ALL
            .iter()
            .map(|p| self.provider_config_for(*p))
            .collect();

        if let Some(provider) = update.selected_provider {
            self.selected_provider = provider;
        }
        for (provider, changes) in update.providers {
            let entry = self.providers.entry(provider).or_default();
            if let Some(api_key) = changes.api_key {
                entry.api_key = non_blank(api_key);
            }
            if let Some(model) = changes.model {
                entry.model = model.trim().to_string();
            }
            if let Some(base_url) = changes.base_url {
                entry.base_url = non_blank(base_url);
            }
            if let Some(options) = changes.options {
                entry.options = options;
            }
        }
        if let Some(max_tokens) = update.max_tokens {
            self.budgets.max_tokens = max_tokens;
        }
        if let Some(temperature) = update.temperature {
            self.budgets.temperature = temperature;
        }
        if let Some(max_tokens) = update.profile_max_tokens {
            self.budgets.profile_max_tokens = max_tokens;
        }
        if let Some(temperature) = update.profile_temperature {
            self.budgets.profile_temperature = temperature;
        }
        if let Some(overrides) = update.template_overrides {
            self.template_overrides = overrides;
        }
        if update.clear_proxy {
            self.proxy = None;
        } else if let Some(proxy) = update.proxy {
            self.proxy = Some(proxy);
        }
        if let Some(timeout) = update.timeout_secs {
            self.timeout_secs = Some(timeout);
        }

        ProviderType::ALL
            .iter()
            .zip(before)
            .any(|(p, old)| self.provider_config_for(*p) != old)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        for (label, value) in [
            ("temperature", self.budgets.temperature),
            ("profile temperature", self.budgets.profile_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(format!("Invalid {}: {}. Must be between 0 and 2", label, value));
            }
        }

        if self.budgets.max_tokens == 0 || self.budgets.profile_max_tokens == 0 {
            return Err("token budgets must be greater than 0".to_string());
        }

        if self.timeout_secs == Some(0) {
            return Err("timeout_secs must be greater than 0".to_string());
        }

        if self.selected_provider == ProviderType::CustomOpenAI
            && self
                .provider_config_for(ProviderType::CustomOpenAI)
                .base_url
                .is_none()
        {
            return Err("custom OpenAI provider requires a base URL".to_string());
        }

        if let Some(proxy) = &self.proxy {
            proxy.validate().map_err(|e| e.to_string())?;
        }

        for (kind, text) in &self.template_overrides {
            TemplateStore::validate_override(text)
                .map_err(|e| format!("{} template: {}", kind, e))?;
        }

        Ok(())
    }
}
