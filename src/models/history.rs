//! Conversation History Models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a history entry carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    Text,
    Image,
    Sticker,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Sent by the user (`true`) or by the character (`false`)
    pub is_me: bool,
    #[serde(default, rename = "type")]
    pub kind: EntryKind,
    /// Message text, or the caption for image and sticker entries
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sticker_id: Option<String>,
    /// Unix epoch milliseconds; `0` (or missing) means unknown
    #[serde(default)]
    pub timestamp: i64,
}

impl HistoryEntry {
    pub fn text(is_me: bool, content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            is_me,
            kind: EntryKind::Text,
            content: content.into(),
            image_id: None,
            sticker_id: None,
            timestamp,
        }
    }

    pub fn image(is_me: bool, image_id: impl Into<String>, caption: impl Into<String>, timestamp: i64) -> Self {
        Self {
            kind: EntryKind::Image,
            image_id: Some(image_id.into()),
            ..Self::text(is_me, caption, timestamp)
        }
    }

    pub fn sticker(is_me: bool, sticker_id: impl Into<String>, caption: impl Into<String>, timestamp: i64) -> Self {
        Self {
            kind: EntryKind::Sticker,
            sticker_id: Some(sticker_id.into()),
            ..Self::text(is_me, caption, timestamp)
        }
    }

    /// Send time, if known. Non-positive timestamps count as unknown.
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        if self.timestamp <= 0 {
            return None;
        }
        DateTime::from_timestamp_millis(self.timestamp)
    }
}
