//! Client configuration

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CONTENT_TYPE_XML, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY,
};
use crate::errors::{PayRunError, Result};

/// Consumer credentials for two-legged OAuth1.
///
/// `Debug` never prints the secret and serialization skips it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub consumer_key: String,
    #[serde(skip_serializing)]
    pub consumer_secret: String,
}

impl Credentials {
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self { consumer_key: consumer_key.into(), consumer_secret: consumer_secret.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .finish()
    }
}

/// Where requests go and which wire formats are negotiated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base address every request path is appended to
    /// (e.g. `https://api.test.payrun.io`).
    pub base_url: String,
    /// `Content-Type` sent with payloads; also selects the payload encoding.
    #[serde(default = "default_media_type")]
    pub content_type: String,
    /// `Accept` header sent with every request.
    #[serde(default = "default_media_type")]
    pub accept: String,
    /// Optional API version token sent as the `Api-Version` header.
    #[serde(default)]
    pub api_version: Option<String>,
}

impl EndpointConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            content_type: default_media_type(),
            accept: default_media_type(),
            api_version: None,
        }
    }
}

/// Backoff settings for refused connections. Omitted fields take their
/// defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY.as_millis() as u64,
            max_delay_ms: DEFAULT_MAX_DELAY.as_millis() as u64,
        }
    }
}

/// Complete client configuration
///
/// The per-request timeout is not configurable; every request uses
/// [`REQUEST_TIMEOUT`](crate::constants::REQUEST_TIMEOUT).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub credentials: Credentials,
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl ClientConfig {
    pub fn new(credentials: Credentials, endpoint: EndpointConfig) -> Self {
        Self { credentials, endpoint, retry: RetryConfig::default() }
    }

    /// Structural validation; wire-format support is checked when the
    /// client is built.
    ///
    /// # Errors
    /// Returns `PayRunError::Config` for empty credentials, a base URL that is
    /// not absolute http(s), a zero attempt ceiling or an inverted backoff
    /// range.
    pub fn validate(&self) -> Result<()> {
        if self.credentials.consumer_key.trim().is_empty() {
            return Err(PayRunError::Config("consumer key must not be empty".into()));
        }
        if self.credentials.consumer_secret.is_empty() {
            return Err(PayRunError::Config("consumer secret must not be empty".into()));
        }

        let base = self.endpoint.base_url.to_ascii_lowercase();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(PayRunError::Config(format!(
                "base url must be absolute http(s): {}",
                self.endpoint.base_url
            )));
        }

        if self.retry.max_attempts == 0 {
            return Err(PayRunError::Config("retry.max_attempts must be at least 1".into()));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(PayRunError::Config(format!(
                "retry.base_delay_ms ({}) cannot exceed retry.max_delay_ms ({})",
                self.retry.base_delay_ms, self.retry.max_delay_ms
            )));
        }

        Ok(())
    }
}

fn default_media_type() -> String {
    CONTENT_TYPE_XML.to_string()
}
