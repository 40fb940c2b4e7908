//! JSON Settings Management
//!
//! Handles reading and writing the settings file. API keys and the proxy
//! password are routed through [`SecretStore`] and never reach the JSON.

use std::fs;
use std::path::{Path, PathBuf};

use persona_chat_llm::ProviderType;

use super::secrets::{api_key_entry, SecretStore, PROXY_PASSWORD};
use crate::models::settings::{AppSettings, SettingsUpdate};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{ensure_persona_chat_dir, settings_path};

/// Settings service backed by a pretty-printed JSON file
#[derive(Debug)]
pub struct SettingsService {
    settings_path: PathBuf,
    settings: AppSettings,
    secrets: SecretStore,
}

impl SettingsService {
    /// Create a new settings service, loading existing settings or creating defaults
    pub fn new() -> AppResult<Self> {
        ensure_persona_chat_dir()?;
        Self::open(settings_path()?)
    }

    /// Open settings stored at `path`, writing defaults if the file is missing.
    ///
    /// Secrets are kept in the same directory as the settings file.
    pub fn open(settings_path: PathBuf) -> AppResult<Self> {
        let mut secrets = SecretStore::open(&secrets_dir(&settings_path))?;

        let settings = if settings_path.exists() {
            let (settings, has_inline_secrets) =
                Self::load_from_file(&settings_path, &secrets)?;
            if has_inline_secrets {
                Self::save_to_file(&settings_path, &mut secrets, &settings)?;
                tracing::info!("Moved inline secrets out of {}", settings_path.display());
            }
            settings
        } else {
            let defaults = AppSettings::default();
            Self::save_to_file(&settings_path, &mut secrets, &defaults)?;
            tracing::info!("Created default settings at {}", settings_path.display());
            defaults
        };

        Ok(Self {
            settings_path,
            settings,
            secrets,
        })
    }

    /// Load settings from a file and fill in secrets from the store.
    ///
    /// The flag reports whether the file itself still carried secrets.
    fn load_from_file(path: &Path, secrets: &SecretStore) -> AppResult<(AppSettings, bool)> {
        let content = fs::read_to_string(path)?;
        let mut settings: AppSettings = serde_json::from_str(&content)?;
        settings.validate().map_err(AppError::validation)?;

        let has_inline_secrets = settings.providers.values().any(|p| p.api_key.is_some())
            || settings
                .proxy
                .as_ref()
                .is_some_and(|proxy| proxy.password.is_some());

        for provider in ProviderType::ALL {
            if let Some(key) = secrets.get(&api_key_entry(provider)) {
                let entry = settings.providers.entry(provider).or_default();
                if entry.api_key.is_none() {
                    entry.api_key = Some(key.to_string());
                }
            }
        }
        if let Some(proxy) = settings.proxy.as_mut() {
            if proxy.password.is_none() {
                proxy.password = secrets.get(PROXY_PASSWORD).map(str::to_string);
            }
        }

        Ok((settings, has_inline_secrets))
    }

    /// Sync secrets into the store, then save settings with pretty formatting
    fn save_to_file(path: &Path, secrets: &mut SecretStore, settings: &AppSettings) -> AppResult<()> {
        settings.validate().map_err(AppError::validation)?;

        for provider in ProviderType::ALL {
            let key = settings
                .providers
                .get(&provider)
                .and_then(|p| p.api_key.as_deref());
            secrets.set(&api_key_entry(provider), key);
        }
        let password = settings
            .proxy
            .as_ref()
            .and_then(|proxy| proxy.password.as_deref());
        secrets.set(PROXY_PASSWORD, password);
        secrets.persist()?;

        let content = serde_json::to_string_pretty(settings)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the current settings
    pub fn get_settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn path(&self) -> &Path {
        &self.settings_path
    }

    /// Apply a partial update and persist it.
    ///
    /// Returns whether cached adapters must be invalidated. An update that
    /// fails validation leaves both memory and disk untouched.
    pub fn apply_update(&mut self, update: SettingsUpdate) -> AppResult<bool> {
        let mut candidate = self.settings.clone();
        let adapters_stale = candidate.apply_update(update);
        Self::save_to_file(&self.settings_path, &mut self.secrets, &candidate)?;
        self.settings = candidate;
        if adapters_stale {
            tracing::info!("Provider settings changed");
        }
        Ok(adapters_stale)
    }

    /// Save the current settings to disk
    pub fn save(&mut self) -> AppResult<()> {
        Self::save_to_file(&self.settings_path, &mut self.secrets, &self.settings)
    }

    /// Reload settings and secrets from disk
    pub fn reload(&mut self) -> AppResult<()> {
        self.secrets = SecretStore::open(&secrets_dir(&self.settings_path))?;
        let (settings, _) = Self::load_from_file(&self.settings_path, &self.secrets)?;
        self.settings = settings;
        Ok(())
    }

    /// Reset settings to defaults. Stored secrets are cleared too.
    pub fn reset(&mut self) -> AppResult<()> {
        self.settings = AppSettings::default();
        self.save()
    }
}

fn secrets_dir(settings_path: &Path) -> PathBuf {
    settings_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}
