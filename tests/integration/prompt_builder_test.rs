//! Prompt Builder Integration Tests
//!
//! Exercises prompt compilation through the public API with the built-in
//! templates and user overrides.

use chrono::{TimeZone, Utc};
use persona_chat::models::{Character, HistoryEntry, Persona, Sticker};
use persona_chat::services::prompt::{build_chat_prompt, build_profile_prompt, PromptFlags};
use persona_chat::services::{TemplateKind, TemplateStore};
use persona_chat_llm::{TurnRole, PROACTIVE_START_PROMPT};

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 4, 18, 30, 0).unwrap()
}

fn minutes_ago(minutes: i64) -> i64 {
    now().timestamp_millis() - minutes * 60_000
}

fn character() -> Character {
    let mut character = Character::new("c1", "Mina");
    character.prompt = "A cheerful barista.".to_string();
    character.stickers.push(Sticker {
        id: "wave".to_string(),
        name: "Waving hand".to_string(),
        data_url: None,
    });
    character
}

#[test]
fn test_last_turn_follows_last_entry_author() {
    let templates = TemplateStore::new();
    let persona = Persona::new("Alex", "");
    let character = character();

    for user_spoke_last in [true, false] {
        let history = vec![
            HistoryEntry::text(!user_spoke_last, "first", minutes_ago(3)),
            HistoryEntry::text(user_spoke_last, "second", minutes_ago(2)),
        ];
        let prompt = build_chat_prompt(
            &character,
            &persona,
            &history,
            templates.get(TemplateKind::MainChat),
            PromptFlags::default(),
            now(),
        );

        let expected = if user_spoke_last {
            TurnRole::User
        } else {
            TurnRole::Model
        };
        let last = prompt.contents.last().unwrap();
        assert_eq!(last.role, expected);
        assert_eq!(last.joined_text(), "second");
    }
}

#[test]
fn test_default_template_fills_known_placeholders() {
    let templates = TemplateStore::new();
    let persona = Persona::new("Alex", "Likes hiking");
    let character = character();
    let history = vec![HistoryEntry::text(true, "hey", minutes_ago(90))];

    let prompt = build_chat_prompt(
        &character,
        &persona,
        &history,
        templates.get(TemplateKind::MainChat),
        PromptFlags::default(),
        now(),
    );

    let system = &prompt.system_prompt;
    for placeholder in [
        "{character.name}",
        "{character.prompt}",
        "{persona.name}",
        "{persona.description}",
        "{character.memories}",
        "{character.stickers}",
        "{time.now}",
        "{time.narrative}",
    ] {
        assert!(!system.contains(placeholder), "unfilled {}", placeholder);
    }
    assert!(system.contains("You are Mina, chatting with Alex"));
    assert!(system.contains("Likes hiking"));
    assert!(system.contains("- wave: Waving hand"));
    assert!(system.contains("(no memories yet)"));
    assert!(system.contains("2024-05-04 18:30 (Saturday)"));
    assert!(system.contains("1 hour"));
    assert!(!system.contains("<|im_start|>"));
}

#[test]
fn test_missing_image_becomes_text() {
    let templates = TemplateStore::new();
    let history = vec![HistoryEntry::image(true, "deleted", "look!", minutes_ago(1))];

    let prompt = build_chat_prompt(
        &character(),
        &Persona::default(),
        &history,
        templates.get(TemplateKind::MainChat),
        PromptFlags::default(),
        now(),
    );

    let turn = &prompt.contents[0];
    assert!(!turn.has_media());
    assert_eq!(
        turn.joined_text(),
        "[Sent a photo that is no longer available] look!"
    );
}

#[test]
fn test_proactive_with_empty_history_starts_conversation() {
    let templates = TemplateStore::new();

    let prompt = build_chat_prompt(
        &character(),
        &Persona::new("Alex", ""),
        &[],
        templates.get(TemplateKind::MainChat),
        PromptFlags {
            is_proactive: true,
            force_summary: false,
        },
        now(),
    );

    assert_eq!(prompt.contents.len(), 1);
    assert_eq!(prompt.contents[0].role, TurnRole::User);
    assert_eq!(prompt.contents[0].joined_text(), PROACTIVE_START_PROMPT);
    assert!(prompt.system_prompt.contains("never talked with Alex"));
}

#[test]
fn test_proactive_drops_trailing_character_turn() {
    let templates = TemplateStore::new();
    let history = vec![
        HistoryEntry::text(true, "talk later", minutes_ago(200)),
        HistoryEntry::text(false, "bye!", minutes_ago(199)),
    ];

    let prompt = build_chat_prompt(
        &character(),
        &Persona::new("Alex", ""),
        &history,
        templates.get(TemplateKind::MainChat),
        PromptFlags {
            is_proactive: true,
            force_summary: false,
        },
        now(),
    );

    assert_eq!(prompt.contents.len(), 1);
    assert_eq!(prompt.contents[0].joined_text(), "talk later");
    assert!(prompt.system_prompt.contains("new topic"));
}

#[test]
fn test_overridden_template_is_used() {
    let mut templates = TemplateStore::new();
    templates
        .set_override(
            TemplateKind::ProfileCreation,
            "<|im_start|>system\nInvent a friend for {userName}.\n<|im_end|>",
        )
        .unwrap();

    let prompt = build_profile_prompt(
        &Persona::new("Alex", ""),
        templates.get(TemplateKind::ProfileCreation),
    );

    assert_eq!(prompt.system_prompt, "Invent a friend for Alex.");
    assert_eq!(prompt.contents.len(), 1);
    assert_eq!(prompt.contents[0].role, TurnRole::User);
}

#[test]
fn test_invalid_override_is_rejected() {
    let mut templates = TemplateStore::new();
    let result = templates.set_override(
        TemplateKind::MainChat,
        "<|im_start|>system\nunterminated",
    );

    assert!(result.is_err());
    assert!(!templates.is_customized(TemplateKind::MainChat));
}
