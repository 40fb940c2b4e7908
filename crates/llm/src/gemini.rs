//! Google Gemini Provider
//!
//! Gemini consumes the canonical `contents`/`parts` shape almost directly and
//! can be constrained to the reply schema with `responseSchema`, so chat
//! replies arrive as JSON without relying on recovery heuristics.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::provider::{reason_or_unknown, require_api_key, LlmProvider, PreparedRequest};
use super::types::{
    ContentTurn, GenerationRequest, LlmError, LlmResult, Part, ProviderConfig, RequestKind,
    TurnRole,
};
use crate::http_client::build_http_client;

/// Default Gemini API base
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Harm categories relaxed to `BLOCK_NONE` on every request.
const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Finish reasons that mean the candidate was withheld on policy grounds.
const POLICY_FINISH_REASONS: [&str; 4] = ["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

/// Google Gemini provider
pub struct GeminiProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider with the given configuration
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let client = build_http_client(config.proxy.as_ref(), config.timeout_secs)?;
        tracing::info!("Gemini provider initialized: model={}", config.model);
        Ok(Self { config, client })
    }

    /// Get the API base URL
    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(GEMINI_API_BASE)
            .trim_end_matches('/')
    }

    fn endpoint(&self, api_key: &str) -> LlmResult<String> {
        let raw = format!("{}/models/{}:generateContent", self.base_url(), self.config.model);
        let mut url = url::Url::parse(&raw).map_err(|e| LlmError::Configuration {
            message: format!("invalid Gemini endpoint {}: {}", raw, e),
        })?;
        url.query_pairs_mut().append_pair("key", api_key);
        Ok(url.to_string())
    }

    /// JSON schema the chat reply must follow.
    pub fn reply_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "reactionDelay": { "type": "INTEGER" },
                "messages": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "delay": { "type": "INTEGER" },
                            "content": { "type": "STRING" },
                            "sticker": { "type": "STRING" }
                        },
                        "required": ["delay", "content"]
                    }
                },
                "newMemory": { "type": "STRING" },
                "characterState": {
                    "type": "OBJECT",
                    "properties": {
                        "affection": { "type": "NUMBER" },
                        "intimacy": { "type": "NUMBER" },
                        "trust": { "type": "NUMBER" },
                        "romantic_interest": { "type": "NUMBER" },
                        "reason": { "type": "STRING" }
                    }
                }
            },
            "required": ["reactionDelay", "messages"]
        })
    }

    fn safety_settings() -> Vec<Value> {
        SAFETY_CATEGORIES
            .iter()
            .map(|category| {
                json!({
                    "category": category,
                    "threshold": "BLOCK_NONE"
                })
            })
            .collect()
    }

    /// Convert a canonical turn to Gemini `contents` format
    fn turn_to_gemini(turn: &ContentTurn) -> Value {
        let role = match turn.role {
            TurnRole::User => "user",
            TurnRole::Model => "model",
        };
        let parts: Vec<Value> = turn
            .parts()
            .iter()
            .map(|part| match part {
                Part::Text { text } => json!({ "text": text }),
                Part::Media { inline_media } => json!({
                    "inlineData": {
                        "mimeType": inline_media.mime_type,
                        "data": inline_media.data
                    }
                }),
            })
            .collect();
        json!({ "role": role, "parts": parts })
    }

    /// Build the request body for the API
    fn build_request_body(&self, request: &GenerationRequest) -> Value {
        let (max_tokens, temperature) = request.budget(&self.config);
        let contents: Vec<Value> = request.turns().iter().map(Self::turn_to_gemini).collect();

        let mut generation_config = json!({
            "temperature": temperature,
            "maxOutputTokens": max_tokens,
            "responseMimeType": "application/json"
        });
        if request.kind == RequestKind::Chat {
            generation_config["responseSchema"] = Self::reply_schema();
        }

        let mut body = json!({
            "contents": contents,
            "generationConfig": generation_config,
            "safetySettings": Self::safety_settings()
        });

        if !request.prompt.system_prompt.is_empty() {
            body["systemInstruction"] = json!({
                "parts": [{ "text": request.prompt.system_prompt }]
            });
        }

        body
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn http_client(&self) -> &reqwest::Client {
        &self.client
    }

    fn supports_response_schema(&self) -> bool {
        true
    }

    fn build_request(&self, request: &GenerationRequest) -> LlmResult<PreparedRequest> {
        let api_key = require_api_key(&self.config, self.name())?;
        Ok(PreparedRequest {
            url: self.endpoint(api_key)?,
            headers: Vec::new(),
            body: self.build_request_body(request),
        })
    }

    fn parse_response(&self, body: &Value) -> LlmResult<String> {
        let candidate = body.pointer("/candidates/0");

        if let Some(text) = candidate
            .and_then(|c| c.pointer("/content/parts/0/text"))
            .and_then(Value::as_str)
        {
            return Ok(text.to_string());
        }

        if let Some(block_reason) = body
            .pointer("/promptFeedback/blockReason")
            .and_then(Value::as_str)
        {
            return Err(LlmError::ContentBlocked {
                reason: block_reason.to_string(),
            });
        }

        let finish_reason = candidate
            .and_then(|c| c.get("finishReason"))
            .and_then(Value::as_str);
        if let Some(reason) = finish_reason.filter(|r| POLICY_FINISH_REASONS.contains(r)) {
            return Err(LlmError::ContentBlocked {
                reason: reason.to_string(),
            });
        }

        Err(LlmError::EmptyResponse {
            reason: reason_or_unknown(finish_reason),
        })
    }
}
