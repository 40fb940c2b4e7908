//! Character Models
//!
//! A role-played character with its memories, photo attachments and
//! sticker inventory.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use persona_chat_llm::{ChatReply, InlineMedia};
use serde::{Deserialize, Serialize};

/// Default value for the 1-10 personality sliders.
const DEFAULT_TRAIT_LEVEL: u8 = 5;

fn default_trait_level() -> u8 {
    DEFAULT_TRAIT_LEVEL
}

/// An image previously exchanged in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAttachment {
    pub id: String,
    /// `data:<mime>;base64,<payload>`
    pub data_url: String,
    /// Where the image was originally fetched from, if anywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl MediaAttachment {
    /// Decode the data URL into inline media.
    ///
    /// Returns `None` for anything that is not a base64 data URL with a
    /// decodable payload.
    pub fn inline_media(&self) -> Option<InlineMedia> {
        let rest = self.data_url.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let mime_type = header.strip_suffix(";base64")?;
        if mime_type.is_empty() || STANDARD.decode(payload).is_err() {
            return None;
        }
        Some(InlineMedia {
            mime_type: mime_type.to_string(),
            data: payload.to_string(),
            source_url: self.source_url.clone(),
        })
    }
}

/// A sticker the character can send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sticker {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_url: Option<String>,
}

/// A role-played character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: String,
    pub name: String,
    /// Free-text personality and background description
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub memories: Vec<String>,
    #[serde(default)]
    pub media: Vec<MediaAttachment>,
    #[serde(default)]
    pub stickers: Vec<Sticker>,
    /// How fast the character replies (1-10)
    #[serde(default = "default_trait_level")]
    pub response_time: u8,
    /// How long the character deliberates (1-10)
    #[serde(default = "default_trait_level")]
    pub thinking_time: u8,
    /// How eagerly the character reacts (1-10)
    #[serde(default = "default_trait_level")]
    pub reactivity: u8,
    /// Formal (1) to casual (10)
    #[serde(default = "default_trait_level")]
    pub tone: u8,
}

impl Character {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            prompt: String::new(),
            memories: Vec::new(),
            media: Vec::new(),
            stickers: Vec::new(),
            response_time: DEFAULT_TRAIT_LEVEL,
            thinking_time: DEFAULT_TRAIT_LEVEL,
            reactivity: DEFAULT_TRAIT_LEVEL,
            tone: DEFAULT_TRAIT_LEVEL,
        }
    }

    pub fn find_media(&self, id: &str) -> Option<&MediaAttachment> {
        self.media.iter().find(|m| m.id == id)
    }

    pub fn find_sticker(&self, id: &str) -> Option<&Sticker> {
        self.stickers.iter().find(|s| s.id == id)
    }

    /// Append a memory. Blank and duplicate memories are ignored.
    ///
    /// Returns whether the memory was stored.
    pub fn remember(&mut self, memory: &str) -> bool {
        let memory = memory.trim();
        if memory.is_empty() || self.memories.iter().any(|m| m.trim() == memory) {
            return false;
        }
        self.memories.push(memory.to_string());
        true
    }

    /// Drop sticker ids in `reply` that this character does not own.
    pub fn resolve_stickers(&self, reply: &mut ChatReply) -> usize {
        let dropped = reply.drop_unknown_stickers(|id| self.find_sticker(id).is_some());
        if dropped > 0 {
            tracing::debug!(
                "Dropped {} unknown sticker reference(s) for character {}",
                dropped,
                self.id
            );
        }
        dropped
    }

    /// Numbered memory list, or a placeholder line when there are none.
    pub fn memory_inventory(&self) -> String {
        if self.memories.is_empty() {
            return "(no memories yet)".to_string();
        }
        self.memories
            .iter()
            .enumerate()
            .map(|(i, m)| format!("{}. {}", i + 1, m))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// One `- id: name` line per sticker, or a placeholder line.
    pub fn sticker_inventory(&self) -> String {
        if self.stickers.is_empty() {
            return "(no stickers available)".to_string();
        }
        self.stickers
            .iter()
            .map(|s| format!("- {}: {}", s.id, s.name))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
