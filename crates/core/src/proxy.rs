//! Outbound Proxy Settings
//!
//! Stored alongside provider settings and handed to the HTTP client factory
//! in `persona-chat-llm`. Only the shape and sanity checks live here.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Supported proxy schemes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProxyProtocol {
    Http,
    Https,
    Socks5,
}

impl ProxyProtocol {
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Socks5 => "socks5",
        }
    }
}

/// A proxy every provider request is routed through.
///
/// Credentials are optional; a password without a username is rejected by
/// [`ProxyConfig::validate`]. The password is accepted on input but never
/// serialized, so it has to be persisted separately.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxyConfig {
    pub protocol: ProxyProtocol,
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Held in memory only; never written out with the rest of the settings.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

impl ProxyConfig {
    /// `scheme://host:port`. Credentials are never part of the URL.
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol.scheme(), self.host.trim(), self.port)
    }

    /// Username and password, when both are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(password)) => Some((user.as_str(), password.as_str())),
            _ => None,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.host.trim().is_empty() {
            return Err(CoreError::config("proxy host is empty"));
        }
        if self.port == 0 {
            return Err(CoreError::config("proxy port must be non-zero"));
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(CoreError::config("proxy password set without a username"));
        }
        Ok(())
    }
}
