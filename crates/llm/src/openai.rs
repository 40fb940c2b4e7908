//! OpenAI-Compatible Provider
//!
//! One adapter for every backend that speaks the chat/completions protocol:
//! OpenAI itself, xAI Grok, OpenRouter and user-supplied endpoints. The
//! flavors differ only in endpoint, attribution headers and how images are
//! referenced.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::provider::{reason_or_unknown, require_api_key, LlmProvider, PreparedRequest};
use super::types::{
    ContentTurn, GenerationRequest, LlmError, LlmResult, Part, ProviderConfig, ProviderType,
    TurnRole,
};
use crate::http_client::build_http_client;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const GROK_API_URL: &str = "https://api.x.ai/v1/chat/completions";
const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Which chat/completions backend an [`OpenAICompatibleProvider`] talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAIFlavor {
    OpenAI,
    Grok,
    OpenRouter,
    Custom,
}

impl OpenAIFlavor {
    /// Flavor for a provider type, or `None` for non-OpenAI protocols.
    pub fn from_provider(provider: ProviderType) -> Option<Self> {
        match provider {
            ProviderType::OpenAI => Some(Self::OpenAI),
            ProviderType::Grok => Some(Self::Grok),
            ProviderType::OpenRouter => Some(Self::OpenRouter),
            ProviderType::CustomOpenAI => Some(Self::Custom),
            ProviderType::Gemini | ProviderType::Claude => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Grok => "grok",
            Self::OpenRouter => "openrouter",
            Self::Custom => "custom_openai",
        }
    }

    fn default_endpoint(self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some(OPENAI_API_URL),
            Self::Grok => Some(GROK_API_URL),
            Self::OpenRouter => Some(OPENROUTER_API_URL),
            Self::Custom => None,
        }
    }

    /// Whether images may be referenced by their original URL.
    fn accepts_image_links(self) -> bool {
        !matches!(self, Self::OpenAI)
    }
}

/// Provider for OpenAI-compatible chat/completions endpoints
pub struct OpenAICompatibleProvider {
    flavor: OpenAIFlavor,
    config: ProviderConfig,
    client: reqwest::Client,
    endpoint: String,
}

impl OpenAICompatibleProvider {
    /// Create a provider for `config.provider`.
    ///
    /// Fails for non-OpenAI provider types and for a custom endpoint without
    /// a base URL.
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let flavor =
            OpenAIFlavor::from_provider(config.provider).ok_or_else(|| LlmError::Configuration {
                message: format!("{} is not an OpenAI-compatible provider", config.provider),
            })?;
        let endpoint = resolve_endpoint(flavor, config.base_url.as_deref())?;
        let client = build_http_client(config.proxy.as_ref(), config.timeout_secs)?;
        tracing::info!(
            "{} provider initialized: model={}, endpoint={}",
            flavor.name(),
            config.model,
            endpoint
        );
        Ok(Self {
            flavor,
            config,
            client,
            endpoint,
        })
    }

    pub fn flavor(&self) -> OpenAIFlavor {
        self.flavor
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn image_url(&self, part: &Part) -> Option<String> {
        let Part::Media { inline_media } = part else {
            return None;
        };
        let linked = inline_media
            .source_url
            .as_ref()
            .filter(|_| self.flavor.accepts_image_links());
        Some(match linked {
            Some(url) => url.clone(),
            None => inline_media.data_uri(),
        })
    }

    /// Convert a canonical turn to an OpenAI chat message
    fn turn_to_openai(&self, turn: &ContentTurn) -> Value {
        let role = match turn.role {
            TurnRole::User => "user",
            TurnRole::Model => "assistant",
        };

        if !turn.has_media() {
            return json!({ "role": role, "content": turn.joined_text() });
        }

        let blocks: Vec<Value> = turn
            .parts()
            .iter()
            .map(|part| match part {
                Part::Text { text } => json!({ "type": "text", "text": text }),
                Part::Media { .. } => json!({
                    "type": "image_url",
                    "image_url": { "url": self.image_url(part) }
                }),
            })
            .collect();
        json!({ "role": role, "content": blocks })
    }

    /// Build the request body for the API
    fn build_request_body(&self, request: &GenerationRequest) -> Value {
        let (max_tokens, temperature) = request.budget(&self.config);

        let mut messages = Vec::new();
        if !request.prompt.system_prompt.is_empty() {
            messages.push(json!({
                "role": "system",
                "content": request.prompt.system_prompt
            }));
        }
        messages.extend(request.turns().iter().map(|t| self.turn_to_openai(t)));

        json!({
            "model": self.config.model,
            "messages": messages,
            "max_tokens": max_tokens,
            "temperature": temperature
        })
    }

    fn attribution_headers(&self) -> Vec<(&'static str, String)> {
        if self.flavor != OpenAIFlavor::OpenRouter {
            return Vec::new();
        }
        [("HTTP-Referer", "http_referer"), ("X-Title", "app_title")]
            .into_iter()
            .filter_map(|(header, option)| {
                self.config
                    .option_str(option)
                    .map(|value| (header, value.to_string()))
            })
            .collect()
    }
}

/// Endpoint for a flavor, normalizing custom base URLs.
fn resolve_endpoint(flavor: OpenAIFlavor, base_url: Option<&str>) -> LlmResult<String> {
    let base_url = base_url.map(str::trim).filter(|u| !u.is_empty());
    match (base_url, flavor.default_endpoint()) {
        (Some(url), _) => Ok(normalize_chat_endpoint(url)),
        (None, Some(default)) => Ok(default.to_string()),
        (None, None) => Err(LlmError::Configuration {
            message: "custom OpenAI provider requires a base URL".to_string(),
        }),
    }
}

/// `https://host/v1` -> `https://host/v1/chat/completions`; a full endpoint is kept.
pub fn normalize_chat_endpoint(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with(CHAT_COMPLETIONS_PATH) {
        trimmed.to_string()
    } else {
        format!("{}{}", trimmed, CHAT_COMPLETIONS_PATH)
    }
}

#[async_trait]
impl LlmProvider for OpenAICompatibleProvider {
    fn name(&self) -> &'static str {
        self.flavor.name()
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn http_client(&self) -> &reqwest::Client {
        &self.client
    }

    fn build_request(&self, request: &GenerationRequest) -> LlmResult<PreparedRequest> {
        let api_key = require_api_key(&self.config, self.name())?;
        let mut headers = vec![("Authorization", format!("Bearer {}", api_key))];
        headers.extend(self.attribution_headers());
        Ok(PreparedRequest {
            url: self.endpoint.clone(),
            headers,
            body: self.build_request_body(request),
        })
    }

    fn parse_response(&self, body: &Value) -> LlmResult<String> {
        let choice = body.pointer("/choices/0");
        let content = choice.and_then(|c| c.pointer("/message/content"));

        let text = match content {
            Some(Value::String(text)) => Some(text.clone()),
            // Some gateways return content as an array of typed parts.
            Some(Value::Array(parts)) => {
                let joined: Vec<&str> = parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(Value::as_str))
                    .collect();
                (!joined.is_empty()).then(|| joined.concat())
            }
            _ => None,
        };

        match text {
            Some(text) => Ok(text),
            None => {
                let finish_reason = choice
                    .and_then(|c| c.get("finish_reason"))
                    .and_then(Value::as_str);
                if finish_reason == Some("content_filter") {
                    return Err(LlmError::ContentBlocked {
                        reason: "content_filter".to_string(),
                    });
                }
                Err(LlmError::EmptyResponse {
                    reason: reason_or_unknown(finish_reason),
                })
            }
        }
    }
}
