//! Render Context
//!
//! The value tree templates are rendered against, plus the time narrative
//! that tells the character how long it has been since the last message.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Character, HistoryEntry, Persona};

/// Character fields exposed to templates as `{character.*}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterContext<'a> {
    pub name: &'a str,
    pub prompt: &'a str,
    pub response_time: u8,
    pub thinking_time: u8,
    pub reactivity: u8,
    pub tone: u8,
    pub memories: String,
    pub stickers: String,
}

impl<'a> CharacterContext<'a> {
    pub fn new(character: &'a Character) -> Self {
        Self {
            name: &character.name,
            prompt: &character.prompt,
            response_time: character.response_time,
            thinking_time: character.thinking_time,
            reactivity: character.reactivity,
            tone: character.tone,
            memories: character.memory_inventory(),
            stickers: character.sticker_inventory(),
        }
    }
}

/// Persona fields exposed as `{persona.*}`.
#[derive(Debug, Clone, Serialize)]
pub struct PersonaContext<'a> {
    pub name: &'a str,
    pub description: &'a str,
}

/// Time fields exposed as `{time.*}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeContext {
    /// Current UTC time as text
    pub now: String,
    pub narrative: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_minutes: Option<i64>,
}

/// Everything a template can reference. Assembled fresh for each render.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderContext<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character: Option<CharacterContext<'a>>,
    pub persona: PersonaContext<'a>,
    pub user_name: &'a str,
    pub user_description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeContext>,
}

impl<'a> RenderContext<'a> {
    /// Context for profile creation: persona fields only.
    pub fn for_persona(persona: &'a Persona) -> Self {
        let name = persona.display_name();
        Self {
            character: None,
            persona: PersonaContext {
                name,
                description: &persona.description,
            },
            user_name: name,
            user_description: &persona.description,
            time: None,
        }
    }

    pub fn with_character(mut self, character: &'a Character) -> Self {
        self.character = Some(CharacterContext::new(character));
        self
    }

    pub fn with_time(mut self, time: TimeContext) -> Self {
        self.time = Some(time);
        self
    }
}

/// `5 minutes`, `1 hour`, `3 days`, ...
pub fn describe_elapsed(minutes: i64) -> String {
    fn plural(n: i64, unit: &str) -> String {
        if n == 1 {
            format!("1 {}", unit)
        } else {
            format!("{} {}s", n, unit)
        }
    }

    match minutes {
        m if m < 1 => "less than a minute".to_string(),
        m if m < 60 => plural(m, "minute"),
        m if m < 60 * 24 => plural(m / 60, "hour"),
        m => plural(m / (60 * 24), "day"),
    }
}

/// Build the `{time.*}` values for a chat request.
///
/// Proactive messages either open a first conversation or, when the pair
/// has talked before, deliberately start a new topic instead of picking up
/// the old thread.
pub fn time_context(
    persona: &Persona,
    history: &[HistoryEntry],
    is_proactive: bool,
    now: DateTime<Utc>,
) -> TimeContext {
    let name = persona.display_name();
    let elapsed_minutes = history
        .last()
        .and_then(HistoryEntry::sent_at)
        .map(|sent| (now - sent).num_minutes().max(0));
    let character_has_spoken = history.iter().any(|entry| !entry.is_me);

    let narrative = match (is_proactive, elapsed_minutes) {
        (true, _) if !character_has_spoken => format!(
            "You have never talked with {name} before. You are reaching out first: \
             introduce yourself in character and greet them."
        ),
        (true, Some(minutes)) => format!(
            "{} have passed since your last conversation with {name}. You are reaching out on \
             your own. Bring up a new topic unrelated to what you talked about last time, and do \
             not repeat or continue the previous conversation.",
            describe_elapsed(minutes)
        ),
        (true, None) => format!(
            "You are reaching out to {name} on your own. Bring up a new topic of your choice."
        ),
        (false, Some(minutes)) => format!(
            "The last message in this conversation was sent {} ago.",
            describe_elapsed(minutes)
        ),
        (false, None) if history.is_empty() => {
            format!("This is the start of your conversation with {name}.")
        }
        (false, None) => format!("You are in the middle of a conversation with {name}."),
    };

    TimeContext {
        now: now.format("%Y-%m-%d %H:%M (%A)").to_string(),
        narrative,
        elapsed_minutes,
    }
}
