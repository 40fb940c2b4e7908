//! Settings Flow Integration Tests
//!
//! Persisted settings drive adapter configuration and template choice, and
//! credential changes invalidate cached adapters.

use std::collections::HashMap;

use persona_chat::models::settings::ProviderSettingsUpdate;
use persona_chat::models::{Character, HistoryEntry, Persona};
use persona_chat::services::{ChatRequest, GenerationManager, TemplateKind};
use persona_chat::{SettingsService, SettingsUpdate};
use persona_chat_core::{ProxyConfig, ProxyProtocol};
use persona_chat_llm::ProviderType;
use tempfile::TempDir;

use crate::mock_server::serve_once;

const OPENAI_REPLY: &str =
    r#"{"choices": [{"message": {"content": "{\"reactionDelay\": 0, \"messages\": [{\"delay\": 0, \"content\": \"ok\"}]}"}}]}"#;

fn point_openai_at(base: &str, key: &str) -> SettingsUpdate {
    let mut providers = HashMap::new();
    providers.insert(
        ProviderType::OpenAI,
        ProviderSettingsUpdate {
            api_key: Some(key.to_string()),
            model: Some("gpt-test".to_string()),
            base_url: Some(format!("{}/v1", base)),
            options: None,
        },
    );
    SettingsUpdate {
        selected_provider: Some(ProviderType::OpenAI),
        providers,
        timeout_secs: Some(5),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_settings_changes_reach_adapters() {
    let dir = TempDir::new().unwrap();
    let mut service = SettingsService::open(dir.path().join("settings.json")).unwrap();
    let manager = GenerationManager::new();
    let persona = Persona::new("Alex", "");
    let character = Character::new("c1", "Mina");
    let history = vec![HistoryEntry::text(true, "hi", 0)];

    let (first_base, first_rx) = serve_once(200, OPENAI_REPLY).await;
    assert!(service.apply_update(point_openai_at(&first_base, "key-one")).unwrap());
    manager.update_credentials();

    let settings = service.get_settings().clone();
    let templates = settings.template_store();
    let outcome = manager
        .generate_content(
            &settings.provider_config(),
            ChatRequest {
                persona: &persona,
                character: &character,
                history: &history,
                templates: &templates,
                is_proactive: false,
                force_summary: false,
            },
        )
        .await;
    assert_eq!(outcome.reply().unwrap().messages[0].content, "ok");
    assert_eq!(manager.cached_adapters(), 1);
    let first = first_rx.await.unwrap();
    assert_eq!(first.header("authorization"), Some("Bearer key-one"));
    assert_eq!(first.body["model"], "gpt-test");

    // A new key makes the cached adapter stale.
    let (second_base, second_rx) = serve_once(200, OPENAI_REPLY).await;
    assert!(service.apply_update(point_openai_at(&second_base, "key-two")).unwrap());
    manager.update_credentials();
    assert_eq!(manager.cached_adapters(), 0);

    let settings = service.get_settings().clone();
    let outcome = manager
        .generate_content(
            &settings.provider_config(),
            ChatRequest {
                persona: &persona,
                character: &character,
                history: &history,
                templates: &templates,
                is_proactive: false,
                force_summary: false,
            },
        )
        .await;
    assert!(!outcome.is_error());
    let second = second_rx.await.unwrap();
    assert_eq!(second.header("authorization"), Some("Bearer key-two"));
}

#[tokio::test]
async fn test_template_override_persists_and_applies() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    let (base, rx) = serve_once(200, OPENAI_REPLY).await;

    {
        let mut service = SettingsService::open(path.clone()).unwrap();
        let mut update = point_openai_at(&base, "key");
        update.template_overrides = Some(HashMap::from([(
            TemplateKind::MainChat,
            "<|im_start|>system\nYou are {character.name}. Be brief.\n<|im_end|>".to_string(),
        )]));
        service.apply_update(update).unwrap();
    }

    let service = SettingsService::open(path).unwrap();
    let settings = service.get_settings();
    let templates = settings.template_store();
    assert!(templates.is_customized(TemplateKind::MainChat));

    let manager = GenerationManager::new();
    let persona = Persona::default();
    let character = Character::new("c1", "Mina");
    let outcome = manager
        .generate_content(
            &settings.provider_config(),
            ChatRequest {
                persona: &persona,
                character: &character,
                history: &[HistoryEntry::text(true, "yo", 0)],
                templates: &templates,
                is_proactive: false,
                force_summary: false,
            },
        )
        .await;
    assert!(!outcome.is_error());

    let request = rx.await.unwrap();
    assert_eq!(request.body["messages"][0]["content"], "You are Mina. Be brief.");
    assert_eq!(request.body["messages"][1]["content"], "yo");
}

#[test]
fn test_invalid_update_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    let mut service = SettingsService::open(path.clone()).unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    let result = service.apply_update(SettingsUpdate {
        temperature: Some(5.0),
        ..Default::default()
    });

    assert!(result.is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    assert_eq!(service.get_settings().budgets.temperature, 0.8);
}

#[tokio::test]
async fn test_credentials_stay_out_of_settings_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    let (base, rx) = serve_once(200, OPENAI_REPLY).await;

    {
        let mut service = SettingsService::open(path.clone()).unwrap();
        let mut update = point_openai_at(&base, "sk-live-7f3a");
        update.proxy = Some(ProxyConfig {
            protocol: ProxyProtocol::Http,
            host: "proxy.internal".to_string(),
            port: 3128,
            username: Some("alex".to_string()),
            password: Some("pa55word".to_string()),
        });
        service.apply_update(update).unwrap();

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert!(!on_disk.contains("sk-live-7f3a"));
        assert!(!on_disk.contains("pa55word"));
        assert!(!on_disk.contains("apiKey"));
        assert!(!on_disk.contains("password"));
        assert!(on_disk.contains("proxy.internal"));

        // Go direct so the request reaches the local server
        service
            .apply_update(SettingsUpdate {
                clear_proxy: true,
                ..Default::default()
            })
            .unwrap();
    }

    // The key still reaches the provider after a restart
    let service = SettingsService::open(path).unwrap();
    let settings = service.get_settings();
    let templates = settings.template_store();
    let manager = GenerationManager::new();
    let persona = Persona::default();
    let character = Character::new("c1", "Mina");
    let outcome = manager
        .generate_content(
            &settings.provider_config(),
            ChatRequest {
                persona: &persona,
                character: &character,
                history: &[HistoryEntry::text(true, "hey", 0)],
                templates: &templates,
                is_proactive: false,
                force_summary: false,
            },
        )
        .await;
    assert!(!outcome.is_error());
    let request = rx.await.unwrap();
    assert_eq!(request.header("authorization"), Some("Bearer sk-live-7f3a"));
}
