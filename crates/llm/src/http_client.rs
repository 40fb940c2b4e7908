//! HTTP Client Factory
//!
//! Provides a factory function for building reqwest clients with proxy and
//! timeout support.

use std::time::Duration;

use persona_chat_core::ProxyConfig;

use crate::types::{LlmError, LlmResult};

/// Default request timeout when the provider config does not set one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Build a `reqwest::Client` with the resolved proxy configuration.
///
/// - `Some(proxy)` -> configure proxy on the client
/// - `None` -> explicitly disable proxy (`no_proxy`), ignoring env vars
pub fn build_http_client(
    proxy: Option<&ProxyConfig>,
    timeout_secs: Option<u64>,
) -> LlmResult<reqwest::Client> {
    let timeout = Duration::from_secs(timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
    let mut builder = reqwest::Client::builder().timeout(timeout);

    match proxy {
        Some(cfg) => {
            cfg.validate().map_err(|e| LlmError::Configuration {
                message: e.to_string(),
            })?;
            let mut p = reqwest::Proxy::all(cfg.url()).map_err(|e| LlmError::Configuration {
                message: format!("invalid proxy URL: {}", e),
            })?;
            if let Some((user, password)) = cfg.credentials() {
                p = p.basic_auth(user, password);
            }
            builder = builder.proxy(p);
        }
        None => {
            builder = builder.no_proxy();
        }
    }

    builder.build().map_err(|e| LlmError::Configuration {
        message: format!("failed to build HTTP client: {}", e),
    })
}
