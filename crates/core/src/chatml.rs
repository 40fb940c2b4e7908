//! ChatML Documents
//!
//! Prompt templates are authored as ChatML: each message opens with a line
//! `<|im_start|>ROLE` and closes with a line `<|im_end|>`. Everything between
//! the two lines is the message body, kept verbatim apart from trimming the
//! whole body once at the end.
//!
//! Parsing is lenient: a start tag implicitly closes a still-open message,
//! a missing final end tag is tolerated, and stray end tags are ignored.
//! [`is_valid_chatml`] is the strict counterpart used when a user saves a
//! custom template.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Message start marker, followed by the role on the same line.
pub const IM_START: &str = "<|im_start|>";

/// Message end marker.
pub const IM_END: &str = "<|im_end|>";

/// A single message parsed from a ChatML document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMlMessage {
    /// Free-form role; conventionally `system`, `user` or `assistant`.
    pub role: String,
    pub content: String,
}

impl ChatMlMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn is_system(&self) -> bool {
        self.role.eq_ignore_ascii_case("system")
    }
}

/// Accumulates the body of the message currently being read.
struct OpenMessage {
    role: String,
    lines: Vec<String>,
}

impl OpenMessage {
    fn has_content(&self) -> bool {
        self.lines.iter().any(|l| !l.trim().is_empty())
    }

    fn finish(self) -> ChatMlMessage {
        ChatMlMessage {
            role: self.role,
            content: self.lines.join("\n").trim().to_string(),
        }
    }
}

/// Parse a ChatML document into its messages, in source order.
pub fn parse_chatml(text: &str) -> Vec<ChatMlMessage> {
    let mut messages = Vec::new();
    let mut current: Option<OpenMessage> = None;

    for line in text.lines() {
        let trimmed = line.trim();

        if let Some(rest) = trimmed.strip_prefix(IM_START) {
            if let Some(open) = current.take() {
                if open.has_content() {
                    messages.push(open.finish());
                }
            }
            current = Some(OpenMessage {
                role: rest.trim().to_string(),
                lines: Vec::new(),
            });
            continue;
        }

        if trimmed == IM_END {
            if let Some(open) = current.take() {
                messages.push(open.finish());
            }
            continue;
        }

        // Body text sharing a line with the closing tag: `Hello<|im_end|>`.
        if let Some(body) = line.trim_end().strip_suffix(IM_END) {
            if let Some(mut open) = current.take() {
                open.lines.push(body.to_string());
                messages.push(open.finish());
            }
            continue;
        }

        if let Some(open) = current.as_mut() {
            open.lines.push(line.to_string());
        }
    }

    if let Some(open) = current {
        if open.has_content() {
            messages.push(open.finish());
        }
    }

    messages
}

/// Advisory check: equal, non-zero counts of start and end tags.
pub fn is_valid_chatml(text: &str) -> bool {
    let starts = text.matches(IM_START).count();
    let ends = text.matches(IM_END).count();
    starts > 0 && starts == ends
}

/// Parse a document that must pass [`is_valid_chatml`].
pub fn parse_chatml_strict(text: &str) -> CoreResult<Vec<ChatMlMessage>> {
    let starts = text.matches(IM_START).count();
    let ends = text.matches(IM_END).count();
    if starts == 0 {
        return Err(CoreError::invalid_chatml(format!(
            "no {} tags found",
            IM_START
        )));
    }
    if starts != ends {
        return Err(CoreError::invalid_chatml(format!(
            "{} start tags but {} end tags",
            starts, ends
        )));
    }
    Ok(parse_chatml(text))
}

/// Serialize messages back into a ChatML document.
pub fn to_chatml(messages: &[ChatMlMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}{}\n{}\n{}", IM_START, m.role, m.content, IM_END))
        .collect::<Vec<_>>()
        .join("\n")
}
