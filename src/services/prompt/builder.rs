//! Canonical Prompt Builder
//!
//! Renders a ChatML template, splits it into system text and leading turns,
//! then appends the live conversation history. The builder never fails:
//! missing attachments, stickers and fields all degrade to text.

use chrono::{DateTime, Utc};
use persona_chat_core::{parse_chatml, render_serializable};
use persona_chat_llm::{
    CanonicalPrompt, ContentTurn, Part, TurnRole, PROACTIVE_START_PROMPT,
};

use super::context::{time_context, RenderContext};
use crate::models::{Character, EntryKind, HistoryEntry, Persona};

/// Turn appended to profile and character-sheet prompts whose template has
/// no user message of its own.
pub const GENERATE_NOW_PROMPT: &str = "Generate the JSON object now.";

/// Flags that change how a chat prompt is assembled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PromptFlags {
    /// The character speaks first, without a new user message
    pub is_proactive: bool,
    /// Ask the character to summarize the conversation into a memory
    pub force_summary: bool,
}

fn summary_directive(persona: &Persona) -> String {
    format!(
        "# Memory summary\nIn this reply you must fill \"newMemory\" with a one-sentence summary of \
         the most important thing you have learned about {} in this conversation.",
        persona.display_name()
    )
}

/// Render a template, keeping it as-is if the context cannot be serialized.
fn render(template: &str, context: &RenderContext<'_>) -> String {
    render_serializable(template, context).unwrap_or_else(|e| {
        tracing::warn!("Template context could not be serialized: {}", e);
        template.to_string()
    })
}

fn template_role(role: &str) -> TurnRole {
    if role.eq_ignore_ascii_case("assistant") || role.eq_ignore_ascii_case("model") {
        TurnRole::Model
    } else {
        TurnRole::User
    }
}

/// Split rendered ChatML into `(system_prompt, leading_turns)`.
///
/// Text without any ChatML markup is used whole as the system prompt.
fn split_template(rendered: &str) -> (String, Vec<ContentTurn>) {
    let messages = parse_chatml(rendered);
    if messages.is_empty() {
        return (rendered.trim().to_string(), Vec::new());
    }

    let mut system_parts = Vec::new();
    let mut turns = Vec::new();
    for message in messages {
        if message.content.is_empty() {
            continue;
        }
        if message.is_system() {
            system_parts.push(message.content);
        } else {
            turns.push(ContentTurn::text(template_role(&message.role), message.content));
        }
    }

    (system_parts.join("\n\n"), turns)
}

fn with_caption(label: String, caption: &str) -> String {
    let caption = caption.trim();
    if caption.is_empty() {
        label
    } else {
        format!("{} {}", label, caption)
    }
}

/// Map one history entry to a turn. Entries with nothing to say are skipped.
pub fn history_turn(character: &Character, entry: &HistoryEntry) -> Option<ContentTurn> {
    let role = if entry.is_me {
        TurnRole::User
    } else {
        TurnRole::Model
    };

    match entry.kind {
        EntryKind::Text => {
            if entry.content.trim().is_empty() {
                None
            } else {
                Some(ContentTurn::text(role, entry.content.clone()))
            }
        }
        EntryKind::Image => {
            let media = entry
                .image_id
                .as_deref()
                .and_then(|id| character.find_media(id))
                .and_then(|attachment| attachment.inline_media());
            let parts = match media {
                Some(media) => vec![
                    Part::text(with_caption("[Sent a photo]".to_string(), &entry.content)),
                    Part::media(media),
                ],
                None => {
                    tracing::debug!(
                        "Image {:?} not found for character {}",
                        entry.image_id,
                        character.id
                    );
                    vec![Part::text(with_caption(
                        "[Sent a photo that is no longer available]".to_string(),
                        &entry.content,
                    ))]
                }
            };
            ContentTurn::new(role, parts)
        }
        EntryKind::Sticker => {
            let name = entry
                .sticker_id
                .as_deref()
                .and_then(|id| character.find_sticker(id))
                .map(|sticker| sticker.name.as_str())
                .unwrap_or("a sticker");
            Some(ContentTurn::text(
                role,
                with_caption(format!("[Sent sticker: {}]", name), &entry.content),
            ))
        }
    }
}

/// Build the prompt for an in-character chat reply.
pub fn build_chat_prompt(
    character: &Character,
    persona: &Persona,
    history: &[HistoryEntry],
    template: &str,
    flags: PromptFlags,
    now: DateTime<Utc>,
) -> CanonicalPrompt {
    let time = time_context(persona, history, flags.is_proactive, now);
    let context = RenderContext::for_persona(persona)
        .with_character(character)
        .with_time(time);

    let (mut system_prompt, mut contents) = split_template(&render(template, &context));

    if flags.force_summary {
        if !system_prompt.is_empty() {
            system_prompt.push_str("\n\n");
        }
        system_prompt.push_str(&summary_directive(persona));
    }

    let mut history_turns: Vec<ContentTurn> = history
        .iter()
        .filter_map(|entry| history_turn(character, entry))
        .collect();

    // Only live history is trimmed; template example turns stay intact.
    if flags.is_proactive {
        if history_turns.last().map(|turn| turn.role) == Some(TurnRole::Model) {
            history_turns.pop();
        }
        if history_turns.is_empty() {
            history_turns.push(ContentTurn::user(PROACTIVE_START_PROMPT));
        }
    }
    contents.extend(history_turns);

    tracing::debug!(
        "Built chat prompt for {}: {} turns, {} system chars",
        character.id,
        contents.len(),
        system_prompt.len()
    );

    CanonicalPrompt {
        system_prompt,
        contents,
    }
}

fn object_prompt(rendered: &str) -> CanonicalPrompt {
    let (system_prompt, mut contents) = split_template(rendered);
    if contents.is_empty() {
        contents.push(ContentTurn::user(GENERATE_NOW_PROMPT));
    }
    CanonicalPrompt {
        system_prompt,
        contents,
    }
}

/// Build the prompt that invents a character for the user.
pub fn build_profile_prompt(persona: &Persona, template: &str) -> CanonicalPrompt {
    object_prompt(&render(template, &RenderContext::for_persona(persona)))
}

/// Build the prompt that writes a profile card for an existing character.
pub fn build_character_sheet_prompt(
    character: &Character,
    persona: &Persona,
    template: &str,
) -> CanonicalPrompt {
    let context = RenderContext::for_persona(persona).with_character(character);
    object_prompt(&render(template, &context))
}
