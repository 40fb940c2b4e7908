//! Response Recovery
//!
//! Models asked for JSON in free text often wrap it in a markdown fence or
//! emit near-JSON with raw newlines and unescaped quotes inside strings.
//! This module turns such text into a [`ChatReply`] when it can, and wraps
//! the raw text as a single message when it cannot.
//!
//! Recovery is deliberately conservative: escape repair is only attempted
//! after a strict parse fails, and the repaired text must itself parse
//! strictly. Anything else falls back to the single-message wrapping.

use serde_json::{Map, Value};

use super::types::{ChatReply, LlmError, LlmResult};

/// Strip a leading ```` ```json ```` / ```` ``` ```` fence and a trailing ```` ``` ````.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string (`json`, `JSON`, ...) up to the end of the line.
    let body = match after_open.find('\n') {
        Some(newline) => &after_open[newline + 1..],
        None => after_open.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };

    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

fn is_valid_escape(chars: &[char], index: usize) -> usize {
    // Returns the length of a valid escape sequence starting at `index`
    // (which points at the backslash), or 0.
    match chars.get(index + 1) {
        Some('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't') => 2,
        Some('u') => {
            let hex = chars.get(index + 2..index + 6);
            match hex {
                Some(digits) if digits.iter().all(|c| c.is_ascii_hexdigit()) => 6,
                _ => 0,
            }
        }
        _ => 0,
    }
}

fn closes_string(chars: &[char], quote_index: usize) -> bool {
    chars[quote_index + 1..]
        .iter()
        .find(|c| !c.is_whitespace())
        .map_or(true, |c| matches!(c, ',' | ':' | '}' | ']'))
}

/// Re-escape characters that commonly break strict JSON inside strings:
/// raw control characters, invalid backslash escapes, and quotes that are
/// not followed by a structural character.
///
/// Returns `None` when nothing needed repairing.
pub fn repair_json_escapes(text: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut in_string = false;
    let mut changed = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if !in_string {
            out.push(c);
            if c == '"' {
                in_string = true;
            }
            i += 1;
            continue;
        }

        match c {
            '\\' => {
                let len = is_valid_escape(&chars, i);
                if len == 0 {
                    out.push_str("\\\\");
                    changed = true;
                    i += 1;
                } else {
                    out.extend(&chars[i..i + len]);
                    i += len;
                }
                continue;
            }
            '"' => {
                if closes_string(&chars, i) {
                    out.push('"');
                    in_string = false;
                } else {
                    out.push_str("\\\"");
                    changed = true;
                }
            }
            '\n' => {
                out.push_str("\\n");
                changed = true;
            }
            '\r' => {
                out.push_str("\\r");
                changed = true;
            }
            '\t' => {
                out.push_str("\\t");
                changed = true;
            }
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
                changed = true;
            }
            c => out.push(c),
        }
        i += 1;
    }

    changed.then_some(out)
}

/// Strict parse, then one repair attempt.
fn parse_lenient(text: &str) -> Result<Value, serde_json::Error> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => Ok(value),
        Err(strict_err) => match repair_json_escapes(text) {
            Some(repaired) => {
                let value = serde_json::from_str::<Value>(&repaired)?;
                tracing::debug!("Recovered JSON after escape repair");
                Ok(value)
            }
            None => Err(strict_err),
        },
    }
}

/// Interpret a parsed value as a chat reply, if it has a `messages` array.
///
/// Items are taken as they come: odd delay or content types are coerced
/// field by field, and a bare string item becomes a message with that text.
pub fn reply_from_value(mut value: Value) -> Option<ChatReply> {
    let messages = value.get_mut("messages")?.as_array_mut()?;
    for item in messages.iter_mut() {
        if !item.is_object() {
            let content = item.take();
            *item = serde_json::json!({ "content": content });
        }
    }

    match serde_json::from_value(value) {
        Ok(reply) => Some(reply),
        Err(e) => {
            tracing::warn!("Reply JSON has an unusable shape: {}", e);
            None
        }
    }
}

/// Turn model output into a chat reply, falling back to wrapping the raw text.
pub fn recover_reply(raw: &str) -> ChatReply {
    let candidate = strip_code_fence(raw);

    match parse_lenient(candidate) {
        Ok(value) => match reply_from_value(value) {
            Some(reply) => reply,
            None => {
                tracing::warn!("Reply JSON has no usable messages array; wrapping raw text");
                ChatReply::fallback(raw)
            }
        },
        Err(e) => {
            tracing::warn!("Reply is not valid JSON ({}); wrapping raw text", e);
            ChatReply::fallback(raw)
        }
    }
}

/// Turn model output into a JSON object. Failure is an error, not a fallback.
pub fn recover_object(raw: &str) -> LlmResult<Map<String, Value>> {
    let candidate = strip_code_fence(raw);
    if candidate.is_empty() {
        return Err(LlmError::ParseError {
            message: "response text is empty".to_string(),
        });
    }

    match parse_lenient(candidate) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(LlmError::ParseError {
            message: format!("expected a JSON object, got {}", json_kind(&other)),
        }),
        Err(e) => Err(LlmError::ParseError {
            message: format!("response is not valid JSON: {}", e),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
