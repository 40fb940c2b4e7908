//! Generation Integration Tests
//!
//! Drives the generation manager end to end against a local mock server:
//! - HTTP failures surface as `{error}` for every provider
//! - Request wire shapes per provider
//! - Reply recovery and sticker resolution
//! - Profile and character-sheet generation

use persona_chat::models::{Character, HistoryEntry, MediaAttachment, Persona, Sticker};
use persona_chat::services::{ChatRequest, GenerationManager, TemplateStore};
use persona_chat_llm::{ChatOutcome, ProviderConfig, ProviderType, PROACTIVE_START_PROMPT};
use serde_json::json;

use crate::mock_server::serve_once;

fn mock_config(provider: ProviderType, base: &str) -> ProviderConfig {
    let base_url = match provider {
        ProviderType::Gemini => base.to_string(),
        ProviderType::Claude => format!("{}/v1/messages", base),
        _ => format!("{}/v1", base),
    };
    ProviderConfig {
        api_key: Some("test-key".to_string()),
        base_url: Some(base_url),
        timeout_secs: Some(5),
        ..ProviderConfig::new(provider, "test-model")
    }
}

fn character() -> Character {
    let mut character = Character::new("c1", "Mina");
    character.prompt = "A cheerful barista who loves cats.".to_string();
    character.media.push(MediaAttachment {
        id: "img-1".to_string(),
        data_url: "data:image/png;base64,iVBORw0KGgo=".to_string(),
        source_url: Some("https://cdn.example/cat.png".to_string()),
    });
    character.stickers.push(Sticker {
        id: "wave".to_string(),
        name: "Waving hand".to_string(),
        data_url: None,
    });
    character
}

// ============================================================================
// Failure handling
// ============================================================================

#[tokio::test]
async fn test_http_500_is_an_error_for_every_provider() {
    let persona = Persona::new("Alex", "");
    let character = character();
    let templates = TemplateStore::new();
    let history = vec![HistoryEntry::text(true, "hi", 0)];

    for provider in ProviderType::ALL {
        let manager = GenerationManager::new();
        let (base, _rx) = serve_once(500, r#"{"error": {"message": "boom"}}"#).await;

        let outcome = manager
            .generate_content(
                &mock_config(provider, &base),
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

        match outcome {
            ChatOutcome::Failure { error } => {
                assert!(!error.is_empty(), "{} gave an empty error", provider);
                assert!(error.contains("500"), "{}: {}", provider, error);
            }
            ChatOutcome::Reply(reply) => panic!("{} returned a reply: {:?}", provider, reply),
        }
    }
}

#[tokio::test]
async fn test_error_outcome_serializes_as_error_object() {
    let (base, _rx) = serve_once(401, r#"{"error": {"message": "bad key"}}"#).await;
    let manager = GenerationManager::new();

    let outcome = manager
        .generate_profile(
            &mock_config(ProviderType::OpenAI, &base),
            &Persona::default(),
            &TemplateStore::new(),
            None,
        )
        .await;

    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value.as_object().unwrap().len(), 1);
    assert!(value["error"].as_str().unwrap().contains("bad key"));
}

#[tokio::test]
async fn test_connection_refused_is_a_network_error() {
    // Bind and drop a listener to get a port nothing listens on.
    let addr = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap()
        .local_addr()
        .unwrap();
    let manager = GenerationManager::new();
    let persona = Persona::default();
    let character = character();
    let templates = TemplateStore::new();

    let outcome = manager
        .generate_content(
            &mock_config(ProviderType::Grok, &format!("http://{}", addr)),
            ChatRequest {
                persona: &persona,
                character: &character,
                history: &[],
                templates: &templates,
                is_proactive: true,
                force_summary: false,
            },
        )
        .await;
    assert!(outcome.error().unwrap().starts_with("Network error"));
}

// ============================================================================
// Wire shapes
// ============================================================================

#[tokio::test]
async fn test_claude_proactive_empty_history_request() {
    let (base, rx) = serve_once(
        200,
        r#"{"content": [{"type": "text", "text": "{\"reactionDelay\": 100, \"messages\": [{\"delay\": 50, \"content\": \"Hi, I'm Mina!\"}]}"}], "stop_reason": "end_turn"}"#,
    )
    .await;
    let manager = GenerationManager::new();
    let persona = Persona::new("Alex", "");
    let character = character();
    let templates = TemplateStore::new();

    let outcome = manager
        .generate_content(
            &mock_config(ProviderType::Claude, &base),
            ChatRequest {
                persona: &persona,
                character: &character,
                history: &[],
                templates: &templates,
                is_proactive: true,
                force_summary: false,
            },
        )
        .await;
    assert_eq!(outcome.reply().unwrap().messages[0].content, "Hi, I'm Mina!");

    let request = rx.await.unwrap();
    assert_eq!(request.request_line(), "POST /v1/messages HTTP/1.1");
    assert_eq!(request.header("x-api-key"), Some("test-key"));
    assert_eq!(request.header("anthropic-version"), Some("2023-06-01"));
    assert_eq!(
        request.body["messages"],
        json!([{"role": "user", "content": PROACTIVE_START_PROMPT}])
    );
    let system = request.body["system"].as_str().unwrap();
    assert!(system.contains("You are Mina"));
    assert!(system.contains("never talked with Alex"));
}

#[tokio::test]
async fn test_gemini_request_with_image() {
    let (base, rx) = serve_once(
        200,
        r#"{"candidates": [{"content": {"parts": [{"text": "{\"reactionDelay\": -5, \"messages\": [{\"delay\": 10, \"content\": \"cute!\", \"sticker\": \"wave\"}]}"}]}, "finishReason": "STOP"}]}"#,
    )
    .await;
    let manager = GenerationManager::new();
    let persona = Persona::new("Alex", "");
    let character = character();
    let templates = TemplateStore::new();
    let history = vec![HistoryEntry::image(true, "img-1", "my cat", 0)];

    let outcome = manager
        .generate_content(
            &mock_config(ProviderType::Gemini, &base),
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
    let reply = outcome.reply().unwrap();
    assert_eq!(reply.reaction_delay, 0);
    assert_eq!(reply.messages[0].sticker.as_deref(), Some("wave"));

    let request = rx.await.unwrap();
    assert_eq!(
        request.request_line(),
        "POST /models/test-model:generateContent?key=test-key HTTP/1.1"
    );
    let parts = &request.body["contents"][0]["parts"];
    assert_eq!(parts[0]["text"], "[Sent a photo] my cat");
    assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
    assert_eq!(
        request.body["generationConfig"]["responseMimeType"],
        "application/json"
    );
    assert!(request.body["systemInstruction"]["parts"][0]["text"]
        .as_str()
        .unwrap()
        .contains("Waving hand"));
}

#[tokio::test]
async fn test_openrouter_request_uses_image_link() {
    let (base, rx) = serve_once(
        200,
        r#"{"choices": [{"message": {"content": "```json\n{\"reactionDelay\": 0, \"messages\": [{\"delay\": 0, \"content\": \"nice\", \"sticker\": \"ghost\"}]}\n```"}}]}"#,
    )
    .await;
    let manager = GenerationManager::new();
    let persona = Persona::default();
    let character = character();
    let templates = TemplateStore::new();
    let history = vec![HistoryEntry::image(true, "img-1", "", 0)];

    let outcome = manager
        .generate_content(
            &mock_config(ProviderType::OpenRouter, &base),
            ChatRequest {
                persona: &persona,
                character: &character,
                history: &history,
                templates: &templates,
                is_proactive: false,
                force_summary: true,
            },
        )
        .await;
    let reply = outcome.reply().unwrap();
    assert_eq!(reply.messages[0].content, "nice");
    // Unknown sticker ids are dropped, content is kept.
    assert!(reply.messages[0].sticker.is_none());

    let request = rx.await.unwrap();
    assert_eq!(request.request_line(), "POST /v1/chat/completions HTTP/1.1");
    assert_eq!(request.header("authorization"), Some("Bearer test-key"));
    let messages = request.body["messages"].as_array().unwrap();
    assert_eq!(messages[0]["role"], "system");
    assert!(messages[0]["content"]
        .as_str()
        .unwrap()
        .ends_with("in this conversation."));
    assert_eq!(
        messages[1]["content"][1]["image_url"]["url"],
        "https://cdn.example/cat.png"
    );
}

// ============================================================================
// Recovery and object generation
// ============================================================================

#[tokio::test]
async fn test_free_text_reply_is_wrapped() {
    let (base, _rx) = serve_once(
        200,
        r#"{"choices": [{"message": {"content": "Sorry, I zoned out."}, "finish_reason": "stop"}]}"#,
    )
    .await;
    let manager = GenerationManager::new();
    let persona = Persona::default();
    let character = character();
    let templates = TemplateStore::new();
    let history = vec![HistoryEntry::text(true, "hello?", 0)];

    let outcome = manager
        .generate_content(
            &mock_config(ProviderType::OpenAI, &base),
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

    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        json!({"reactionDelay": 1000, "messages": [{"delay": 1000, "content": "Sorry, I zoned out."}]})
    );
}

#[tokio::test]
async fn test_generate_profile_returns_object() {
    let (base, rx) = serve_once(
        200,
        r#"{"choices": [{"message": {"content": "{\"name\": \"Rin\", \"prompt\": \"A quiet painter.\"}"}}]}"#,
    )
    .await;
    let manager = GenerationManager::new();
    let persona = Persona::new("Alex", "a hiker from Oslo");

    let outcome = manager
        .generate_profile(
            &mock_config(ProviderType::CustomOpenAI, &base),
            &persona,
            &TemplateStore::new(),
            None,
        )
        .await;
    assert_eq!(outcome.profile().unwrap()["name"], "Rin");

    let request = rx.await.unwrap();
    assert_eq!(request.body["max_tokens"], 1024);
    let messages = request.body["messages"].as_array().unwrap();
    assert!(messages[0]["content"].as_str().unwrap().contains("for Alex"));
    assert!(messages[1]["content"]
        .as_str()
        .unwrap()
        .contains("a hiker from Oslo"));
}

#[tokio::test]
async fn test_generate_profile_parse_failure_is_an_error() {
    let (base, _rx) = serve_once(
        200,
        r#"{"content": [{"type": "text", "text": "I'd rather not."}]}"#,
    )
    .await;
    let manager = GenerationManager::new();

    let outcome = manager
        .generate_profile(
            &mock_config(ProviderType::Claude, &base),
            &Persona::default(),
            &TemplateStore::new(),
            Some("<|im_start|>system\nMake a character.\n<|im_end|>"),
        )
        .await;
    assert!(outcome.error().unwrap().starts_with("Parse error"));
}

#[tokio::test]
async fn test_generate_character_sheet() {
    let (base, rx) = serve_once(
        200,
        r#"{"candidates": [{"content": {"parts": [{"text": "{\"name\": \"Mina\", \"occupation\": \"barista\"}"}]}}]}"#,
    )
    .await;
    let manager = GenerationManager::new();
    let mut character = character();
    character.remember("Alex takes oat milk");

    let outcome = manager
        .generate_character_sheet(
            &mock_config(ProviderType::Gemini, &base),
            &character,
            &Persona::new("Alex", ""),
            &TemplateStore::new(),
        )
        .await;
    assert_eq!(outcome.profile().unwrap()["occupation"], "barista");

    let request = rx.await.unwrap();
    assert!(request.body["generationConfig"].get("responseSchema").is_none());
    let system = request.body["systemInstruction"]["parts"][0]["text"]
        .as_str()
        .unwrap();
    assert!(system.contains("A cheerful barista who loves cats."));
    assert!(system.contains("1. Alex takes oat milk"));
}

#[tokio::test]
async fn test_gemini_block_reason_is_reported() {
    let (base, _rx) = serve_once(200, r#"{"promptFeedback": {"blockReason": "OTHER"}}"#).await;
    let manager = GenerationManager::new();

    let outcome = manager
        .generate_profile(
            &mock_config(ProviderType::Gemini, &base),
            &Persona::default(),
            &TemplateStore::new(),
            None,
        )
        .await;
    assert_eq!(outcome.error(), Some("Response blocked by provider: OTHER"));
}
