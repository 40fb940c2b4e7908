//! LLM Types
//!
//! Provider-agnostic prompt and result types shared by every adapter.

use persona_chat_core::ProxyConfig;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Instruction used when a character must speak first and there is no
/// conversation to respond to.
pub const PROACTIVE_START_PROMPT: &str =
    "(The conversation has not started yet. Begin the conversation now by sending the first message.)";

/// Supported LLM provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    Gemini,
    Claude,
    #[serde(rename = "openai")]
    OpenAI,
    Grok,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "custom_openai")]
    CustomOpenAI,
}

impl ProviderType {
    /// All providers, in display order.
    pub const ALL: [ProviderType; 6] = [
        ProviderType::Gemini,
        ProviderType::Claude,
        ProviderType::OpenAI,
        ProviderType::Grok,
        ProviderType::OpenRouter,
        ProviderType::CustomOpenAI,
    ];

    /// Whether the provider speaks the OpenAI chat/completions protocol.
    pub fn is_openai_compatible(&self) -> bool {
        matches!(
            self,
            ProviderType::OpenAI
                | ProviderType::Grok
                | ProviderType::OpenRouter
                | ProviderType::CustomOpenAI
        )
    }

    /// Model used when the user has not picked one.
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderType::Gemini => "gemini-2.5-flash",
            ProviderType::Claude => "claude-sonnet-4-20250514",
            ProviderType::OpenAI => "gpt-4o",
            ProviderType::Grok => "grok-3",
            ProviderType::OpenRouter => "openrouter/auto",
            ProviderType::CustomOpenAI => "",
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderType::Gemini => write!(f, "gemini"),
            ProviderType::Claude => write!(f, "claude"),
            ProviderType::OpenAI => write!(f, "openai"),
            ProviderType::Grok => write!(f, "grok"),
            ProviderType::OpenRouter => write!(f, "openrouter"),
            ProviderType::CustomOpenAI => write!(f, "custom_openai"),
        }
    }
}

/// Configuration for an LLM provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// The provider type
    pub provider: ProviderType,
    /// API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL override (required for custom OpenAI endpoints)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Model name to use
    pub model: String,
    /// Maximum tokens for chat replies
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Temperature for chat replies
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens for profile and character-sheet generation
    #[serde(default = "default_profile_max_tokens")]
    pub profile_max_tokens: u32,
    /// Temperature for profile and character-sheet generation
    #[serde(default = "default_profile_temperature")]
    pub profile_temperature: f32,
    /// Outbound proxy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
    /// Request timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Provider-specific options
    #[serde(default)]
    pub options: HashMap<String, Value>,
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.8
}

fn default_profile_max_tokens() -> u32 {
    1024
}

fn default_profile_temperature() -> f32 {
    1.2
}

impl ProviderConfig {
    /// Configuration with default budgets for `provider`.
    pub fn new(provider: ProviderType, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            ..Self::default()
        }
    }

    /// Read a string-valued entry from `options`.
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: ProviderType::Gemini,
            api_key: None,
            base_url: None,
            model: ProviderType::Gemini.default_model().to_string(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            profile_max_tokens: default_profile_max_tokens(),
            profile_temperature: default_profile_temperature(),
            proxy: None,
            timeout_secs: None,
            options: HashMap::new(),
        }
    }
}

/// Author of a canonical conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

/// Base64 media embedded in a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineMedia {
    pub mime_type: String,
    #[serde(rename = "base64Data")]
    pub data: String,
    /// URL the media was stored under, for providers that accept links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl InlineMedia {
    /// `data:` URI for providers that take images as URLs.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// One piece of a turn: text or inline media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    Media {
        #[serde(rename = "inlineMedia")]
        inline_media: InlineMedia,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn media(inline_media: InlineMedia) -> Self {
        Part::Media { inline_media }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            Part::Media { .. } => None,
        }
    }
}

/// A canonical conversation turn. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTurn {
    pub role: TurnRole,
    parts: Vec<Part>,
}

impl ContentTurn {
    /// Build a turn, or `None` when there is nothing to send.
    pub fn new(role: TurnRole, parts: Vec<Part>) -> Option<Self> {
        if parts.is_empty() {
            None
        } else {
            Some(Self { role, parts })
        }
    }

    /// Single text part turn.
    pub fn text(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part::text(text)],
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::text(TurnRole::User, text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::text(TurnRole::Model, text)
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn has_media(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, Part::Media { .. }))
    }

    /// Text parts joined with newlines.
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Provider-agnostic prompt: system text plus ordered turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalPrompt {
    pub system_prompt: String,
    pub contents: Vec<ContentTurn>,
}

/// What a request is for; selects budgets and output constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// In-character chat reply (canonical result shape).
    Chat,
    /// Free-form JSON object (profile or character sheet).
    Profile,
}

/// Everything an adapter needs to shape one HTTP request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: CanonicalPrompt,
    pub kind: RequestKind,
    pub is_proactive: bool,
}

impl GenerationRequest {
    pub fn chat(prompt: CanonicalPrompt, is_proactive: bool) -> Self {
        Self {
            prompt,
            kind: RequestKind::Chat,
            is_proactive,
        }
    }

    pub fn profile(prompt: CanonicalPrompt) -> Self {
        Self {
            prompt,
            kind: RequestKind::Profile,
            is_proactive: false,
        }
    }

    /// Turns to send, with a starter turn when a proactive request has none.
    pub fn turns(&self) -> Vec<ContentTurn> {
        if self.is_proactive && self.prompt.contents.is_empty() {
            vec![ContentTurn::user(PROACTIVE_START_PROMPT)]
        } else {
            self.prompt.contents.clone()
        }
    }

    /// `(max_tokens, temperature)` for this request.
    pub fn budget(&self, config: &ProviderConfig) -> (u32, f32) {
        match self.kind {
            RequestKind::Chat => (config.max_tokens, config.temperature),
            RequestKind::Profile => (config.profile_max_tokens, config.profile_temperature),
        }
    }
}

/// Numbers and numeric strings; models are not consistent about either.
fn lenient_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

fn deserialize_clamped_delay<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(lenient_number)
        .filter(|v| *v > 0.0)
        .map(|v| v.round() as u64)
        .unwrap_or(0))
}

fn deserialize_lenient_delay<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(lenient_number)
        .map(|v| v.round() as i64)
        .unwrap_or(0))
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(value_to_text).unwrap_or_default())
}

fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(value_to_text))
}

/// A single chat bubble in a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyMessage {
    /// Milliseconds to wait before showing this message.
    #[serde(default, deserialize_with = "deserialize_lenient_delay")]
    pub delay: i64,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub content: String,
    /// Sticker id to attach.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_text"
    )]
    pub sticker: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ReplyMessage {
    pub fn new(delay: i64, content: impl Into<String>) -> Self {
        Self {
            delay,
            content: content.into(),
            sticker: None,
            extra: Map::new(),
        }
    }
}

/// Successful chat generation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    /// Milliseconds before the character starts typing. Never negative.
    #[serde(default, deserialize_with = "deserialize_clamped_delay")]
    pub reaction_delay: u64,
    pub messages: Vec<ReplyMessage>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_text"
    )]
    pub new_memory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_state: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatReply {
    /// Wrap raw text as a single message.
    pub fn fallback(raw: impl Into<String>) -> Self {
        Self {
            reaction_delay: 1000,
            messages: vec![ReplyMessage::new(1000, raw)],
            new_memory: None,
            character_state: None,
            extra: Map::new(),
        }
    }

    /// Remove sticker ids that `is_known` rejects. Returns how many were dropped.
    pub fn drop_unknown_stickers<F>(&mut self, is_known: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let mut dropped = 0;
        for message in &mut self.messages {
            if let Some(sticker) = &message.sticker {
                if !is_known(sticker) {
                    message.sticker = None;
                    dropped += 1;
                }
            }
        }
        dropped
    }
}

/// The only shape returned to callers of chat generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatOutcome {
    Reply(ChatReply),
    Failure { error: String },
}

impl ChatOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, ChatOutcome::Failure { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ChatOutcome::Failure { error } => Some(error),
            ChatOutcome::Reply(_) => None,
        }
    }

    pub fn reply(&self) -> Option<&ChatReply> {
        match self {
            ChatOutcome::Reply(reply) => Some(reply),
            ChatOutcome::Failure { .. } => None,
        }
    }
}

impl From<LlmError> for ChatOutcome {
    fn from(err: LlmError) -> Self {
        ChatOutcome::Failure {
            error: err.to_string(),
        }
    }
}

/// Result of profile or character-sheet generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileOutcome {
    Failure { error: String },
    Profile(Map<String, Value>),
}

impl ProfileOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, ProfileOutcome::Failure { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ProfileOutcome::Failure { error } => Some(error),
            ProfileOutcome::Profile(_) => None,
        }
    }

    pub fn profile(&self) -> Option<&Map<String, Value>> {
        match self {
            ProfileOutcome::Profile(profile) => Some(profile),
            ProfileOutcome::Failure { .. } => None,
        }
    }
}

impl From<LlmError> for ProfileOutcome {
    fn from(err: LlmError) -> Self {
        ProfileOutcome::Failure {
            error: err.to_string(),
        }
    }
}

/// Error types for LLM operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LlmError {
    /// Provider misconfigured (missing key, missing base URL)
    Configuration { message: String },
    /// Authentication failed (invalid API key)
    AuthenticationFailed { message: String },
    /// Rate limit exceeded
    RateLimited {
        message: String,
        retry_after: Option<u32>,
    },
    /// Model not found or not available
    ModelNotFound { model: String },
    /// Invalid request (bad parameters)
    InvalidRequest { message: String },
    /// Server error from the provider
    ServerError {
        message: String,
        status: Option<u16>,
    },
    /// Network/connection error
    NetworkError { message: String },
    /// 2xx response without the expected payload field
    EmptyResponse { reason: String },
    /// Response parsing error
    ParseError { message: String },
    /// Provider refused the prompt or reply on policy grounds
    ContentBlocked { reason: String },
    /// Other error
    Other { message: String },
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmError::Configuration { message } => {
                write!(f, "Configuration error: {}", message)
            }
            LlmError::AuthenticationFailed { message } => {
                write!(f, "Authentication failed: {}", message)
            }
            LlmError::RateLimited { message, .. } => {
                write!(f, "Rate limited: {}", message)
            }
            LlmError::ModelNotFound { model } => {
                write!(f, "Model not found: {}", model)
            }
            LlmError::InvalidRequest { message } => {
                write!(f, "Invalid request: {}", message)
            }
            LlmError::ServerError { message, status } => {
                if let Some(s) = status {
                    write!(f, "Server error ({}): {}", s, message)
                } else {
                    write!(f, "Server error: {}", message)
                }
            }
            LlmError::NetworkError { message } => {
                write!(f, "Network error: {}", message)
            }
            LlmError::EmptyResponse { reason } => {
                write!(f, "No response content: {}", reason)
            }
            LlmError::ParseError { message } => {
                write!(f, "Parse error: {}", message)
            }
            LlmError::ContentBlocked { reason } => {
                write!(f, "Response blocked by provider: {}", reason)
            }
            LlmError::Other { message } => {
                write!(f, "Error: {}", message)
            }
        }
    }
}

impl std::error::Error for LlmError {}

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;
