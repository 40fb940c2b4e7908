//! LLM Provider Trait
//!
//! Defines the common interface for all provider adapters. An adapter only
//! has to shape the HTTP request (`build_request`) and pull the text payload
//! out of the response envelope (`parse_response`); transport, recovery and
//! error conversion are shared by the default methods.

use async_trait::async_trait;
use serde_json::Value;

use super::recovery::{recover_object, recover_reply};
use super::types::{
    CanonicalPrompt, ChatOutcome, GenerationRequest, LlmError, LlmResult, ProfileOutcome,
    ProviderConfig,
};

/// Reason reported when a provider gives none.
pub const UNKNOWN_REASON: &str = "unknown reason";

/// A fully shaped outbound request.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Value,
}

/// Trait that all LLM providers must implement.
///
/// `generate_content` and `generate_profile` are the only entry points
/// callers use; both always return a value and never an `Err`.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Returns the provider name for identification.
    fn name(&self) -> &'static str;

    /// Get the configuration for this provider.
    fn config(&self) -> &ProviderConfig;

    /// Client used for every request of this adapter.
    fn http_client(&self) -> &reqwest::Client;

    /// Returns the current model being used.
    fn model(&self) -> &str {
        &self.config().model
    }

    /// Whether the provider can be constrained to the reply schema natively.
    fn supports_response_schema(&self) -> bool {
        false
    }

    /// Shape the provider-specific HTTP request.
    fn build_request(&self, request: &GenerationRequest) -> LlmResult<PreparedRequest>;

    /// Extract the first text payload from a 2xx response body.
    fn parse_response(&self, body: &Value) -> LlmResult<String>;

    /// Build, send and unwrap one request.
    async fn execute(&self, request: &GenerationRequest) -> LlmResult<String> {
        let prepared = self.build_request(request)?;
        let body = send_request(self.http_client(), self.name(), prepared).await?;
        self.parse_response(&body)
    }

    /// Generate an in-character reply.
    ///
    /// Unparseable text is wrapped as a single message rather than reported
    /// as an error.
    async fn generate_content(&self, prompt: CanonicalPrompt, is_proactive: bool) -> ChatOutcome {
        let request = GenerationRequest::chat(prompt, is_proactive);
        match self.execute(&request).await {
            Ok(text) => ChatOutcome::Reply(recover_reply(&text)),
            Err(e) => {
                tracing::warn!(provider = self.name(), model = self.model(), "Chat generation failed: {}", e);
                e.into()
            }
        }
    }

    /// Generate a JSON object (user profile or character sheet).
    ///
    /// Unlike chat replies, a missing or malformed object is an error.
    async fn generate_profile(&self, prompt: CanonicalPrompt) -> ProfileOutcome {
        let request = GenerationRequest::profile(prompt);
        let result = self
            .execute(&request)
            .await
            .and_then(|text| recover_object(&text));
        match result {
            Ok(profile) => ProfileOutcome::Profile(profile),
            Err(e) => {
                tracing::warn!(provider = self.name(), model = self.model(), "Profile generation failed: {}", e);
                e.into()
            }
        }
    }
}

/// POST a prepared request and decode the JSON body of a 2xx response.
pub async fn send_request(
    client: &reqwest::Client,
    provider: &str,
    prepared: PreparedRequest,
) -> LlmResult<Value> {
    tracing::debug!("{} POST {}", provider, redact_url(&prepared.url));

    let mut builder = client
        .post(&prepared.url)
        .header("Content-Type", "application/json")
        .json(&prepared.body);
    for (name, value) in &prepared.headers {
        builder = builder.header(*name, value);
    }

    let response = builder.send().await.map_err(|e| LlmError::NetworkError {
        message: e.to_string(),
    })?;

    let status = response.status().as_u16();
    let body_text = response.text().await.map_err(|e| LlmError::NetworkError {
        message: e.to_string(),
    })?;

    if !(200..300).contains(&status) {
        tracing::warn!("{} returned HTTP {}", provider, status);
        return Err(parse_http_error(status, &body_text, provider));
    }

    serde_json::from_str(&body_text).map_err(|e| LlmError::ParseError {
        message: format!("Failed to parse response: {}", e),
    })
}

/// Drop the query string (which may carry an API key) for logging.
fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.to_string()
        }
        Err(_) => "<invalid url>".to_string(),
    }
}

/// The API key, or an authentication error naming the provider.
pub fn require_api_key<'a>(config: &'a ProviderConfig, provider: &str) -> LlmResult<&'a str> {
    config
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| missing_api_key_error(provider))
}

/// Helper function to create an error for missing API key
pub fn missing_api_key_error(provider: &str) -> LlmError {
    LlmError::AuthenticationFailed {
        message: format!("API key not configured for {}", provider),
    }
}

/// Pull a human-readable message out of a provider error body.
///
/// Every supported vendor reports `{"error": {"message": ...}}`; some
/// OpenAI-compatible gateways use `{"error": "..."}` instead.
pub fn extract_error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let from_json = parsed.as_ref().and_then(|v| {
        let error = v.get("error")?;
        error
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| error.as_str())
            .map(str::to_string)
    });

    from_json.unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            "empty response body".to_string()
        } else {
            trimmed.chars().take(500).collect()
        }
    })
}

/// Helper function to parse HTTP error status codes
pub fn parse_http_error(status: u16, body: &str, provider: &str) -> LlmError {
    let detail = extract_error_message(body);
    match status {
        401 => LlmError::AuthenticationFailed {
            message: format!("{}: Invalid API key ({})", provider, detail),
        },
        403 => LlmError::AuthenticationFailed {
            message: format!("{}: Access denied ({})", provider, detail),
        },
        404 => LlmError::ModelNotFound { model: detail },
        429 => LlmError::RateLimited {
            message: detail,
            retry_after: None,
        },
        400 => LlmError::InvalidRequest { message: detail },
        500..=599 => LlmError::ServerError {
            message: detail,
            status: Some(status),
        },
        _ => LlmError::Other {
            message: format!("HTTP {}: {}", status, detail),
        },
    }
}

/// Provider-reported reason, or [`UNKNOWN_REASON`].
pub fn reason_or_unknown(reason: Option<&str>) -> String {
    reason
        .filter(|r| !r.is_empty())
        .unwrap_or(UNKNOWN_REASON)
        .to_string()
}
