//! Client configuration.
//!
//! [`ClientConfig`] can be built through [`ClientBuilder`](crate::ClientBuilder)
//! or deserialized from a host application's config file. Every field except
//! `api_key` has a default.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::{Error, Result};

/// The production collector.
pub const DEFAULT_ENDPOINT: &str = "https://api.amplitude.com";

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default per-attempt timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Which event upload API `track` uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventApi {
    /// `POST /2/httpapi` with a JSON body `{api_key, events, options}`.
    #[default]
    V2,
    /// `POST /httpapi` with a form body `{api_key, event}`, the event JSON
    /// encoded into a single field.
    Legacy,
}

impl EventApi {
    pub fn path(&self) -> &'static str {
        match self {
            EventApi::V2 => "/2/httpapi",
            EventApi::Legacy => "/httpapi",
        }
    }
}

/// Immutable settings of a [`Client`](crate::Client).
///
/// # Examples
///
/// ```
/// use amplitude_http::ClientConfig;
///
/// let config: ClientConfig = serde_json::from_str(
///     r#"{"api_key": "xxx", "max_retries": 5, "set_time": true}"#,
/// ).unwrap();
///
/// assert!(config.enabled);
/// assert_eq!(config.max_retries, 5);
/// assert_eq!(config.timeout_ms, 5000);
/// assert_eq!(config.endpoint, "https://api.amplitude.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_key: String,

    /// When `false`, no requests are made and every call reports success
    /// with status 0.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Stamped onto every tracked event, replacing the caller's value.
    #[serde(default)]
    pub app_version: Option<String>,

    /// Stamp the current time onto every tracked event, replacing the
    /// caller's value.
    #[serde(default)]
    pub set_time: bool,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Base URL of the collector. Only scheme, host and port are used.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub event_api: EventApi,
}

fn default_enabled() -> bool {
    true
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl ClientConfig {
    /// A configuration with every default applied.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            enabled: default_enabled(),
            app_version: None,
            set_time: false,
            max_retries: default_max_retries(),
            timeout_ms: default_timeout_ms(),
            endpoint: default_endpoint(),
            event_api: EventApi::default(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Checks the configuration and parses the endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero timeout or an endpoint that is not an
    /// `http`/`https` URL with a host. An empty API key is only rejected when
    /// the client is enabled.
    pub fn validate(&self) -> Result<Url> {
        if self.enabled && self.api_key.trim().is_empty() {
            return Err(Error::Configuration("API key is required".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(Error::Configuration(
                "Timeout must be a positive number of milliseconds".to_string(),
            ));
        }

        let endpoint = Url::parse(&self.endpoint)?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::Configuration(format!(
                "Unsupported endpoint scheme: {}",
                endpoint.scheme()
            )));
        }
        if endpoint.host_str().is_none() {
            return Err(Error::Configuration(format!(
                "Endpoint has no host: {}",
                self.endpoint
            )));
        }
        Ok(endpoint)
    }
}
