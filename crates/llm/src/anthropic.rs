//! Anthropic Claude Provider
//!
//! Implementation of the LlmProvider trait for Anthropic's Messages API.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::provider::{reason_or_unknown, require_api_key, LlmProvider, PreparedRequest};
use super::types::{
    ContentTurn, GenerationRequest, LlmError, LlmResult, Part, ProviderConfig, TurnRole,
};
use crate::http_client::build_http_client;

/// Default Anthropic API endpoint
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Current API version
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude provider
pub struct AnthropicProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider with the given configuration
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let client = build_http_client(config.proxy.as_ref(), config.timeout_secs)?;
        tracing::info!("Claude provider initialized: model={}", config.model);
        Ok(Self { config, client })
    }

    /// Get the API base URL
    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(ANTHROPIC_API_URL)
    }

    /// Convert a canonical turn to Claude message format.
    ///
    /// Text-only turns are sent as a plain string; turns carrying media use
    /// content blocks with images ahead of the text.
    fn turn_to_claude(turn: &ContentTurn) -> Value {
        let role = match turn.role {
            TurnRole::User => "user",
            TurnRole::Model => "assistant",
        };

        if !turn.has_media() {
            return json!({ "role": role, "content": turn.joined_text() });
        }

        let mut images = Vec::new();
        let mut texts = Vec::new();
        for part in turn.parts() {
            match part {
                Part::Media { inline_media } => images.push(json!({
                    "type": "image",
                    "source": {
                        "type": "base64",
                        "media_type": inline_media.mime_type,
                        "data": inline_media.data
                    }
                })),
                Part::Text { text } => texts.push(json!({ "type": "text", "text": text })),
            }
        }
        images.extend(texts);

        json!({ "role": role, "content": images })
    }

    /// Build the request body for the API
    fn build_request_body(&self, request: &GenerationRequest) -> Value {
        let (max_tokens, temperature) = request.budget(&self.config);
        let messages: Vec<Value> = request.turns().iter().map(Self::turn_to_claude).collect();

        let mut body = json!({
            "model": self.config.model,
            "max_tokens": max_tokens,
            "temperature": temperature,
            "messages": messages
        });

        if !request.prompt.system_prompt.is_empty() {
            body["system"] = json!(request.prompt.system_prompt);
        }

        body
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "claude"
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn http_client(&self) -> &reqwest::Client {
        &self.client
    }

    fn build_request(&self, request: &GenerationRequest) -> LlmResult<PreparedRequest> {
        let api_key = require_api_key(&self.config, self.name())?;
        Ok(PreparedRequest {
            url: self.base_url().to_string(),
            headers: vec![
                ("x-api-key", api_key.to_string()),
                ("anthropic-version", ANTHROPIC_VERSION.to_string()),
            ],
            body: self.build_request_body(request),
        })
    }

    fn parse_response(&self, body: &Value) -> LlmResult<String> {
        let text = body
            .get("content")
            .and_then(Value::as_array)
            .and_then(|blocks| {
                blocks
                    .iter()
                    .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
                    .find_map(|b| b.get("text").and_then(Value::as_str))
            });

        match text {
            Some(text) => Ok(text.to_string()),
            None => {
                let stop_reason = body.get("stop_reason").and_then(Value::as_str);
                if stop_reason == Some("refusal") {
                    return Err(LlmError::ContentBlocked {
                        reason: "refusal".to_string(),
                    });
                }
                Err(LlmError::EmptyResponse {
                    reason: reason_or_unknown(stop_reason),
                })
            }
        }
    }
}
