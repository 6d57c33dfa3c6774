//! The seam between the dispatcher and the network.
//!
//! The dispatcher only ever calls [`Transport::send`]. [`HttpTransport`] talks
//! to the collector over HTTP or HTTPS; [`DisabledTransport`] answers every
//! request locally so a disabled client runs through the exact same dispatch
//! loop without touching the network.

use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, Method};
use url::Url;

use crate::{Error, Result};

/// A fully encoded request, ready to go on the wire.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    /// Includes `Content-Type` and `Content-Length`.
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Upper bound for this attempt, covering connect and body drain.
    pub timeout: Duration,
    pub accept_invalid_certs: bool,
}

/// What came back from one attempt.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Set when no request was made and the response was produced locally.
    pub synthetic: bool,
}

impl RawResponse {
    /// The response a disabled client reports: status 0, nothing else.
    pub fn synthetic() -> Self {
        Self {
            status: 0,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            synthetic: true,
        }
    }
}

/// Sends one request and reads the whole response.
///
/// Implementations must not retry; that is the dispatcher's job. Failures
/// below HTTP (connect, DNS, reset, timeout) are returned as errors, any HTTP
/// status is returned as a response.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &TransportRequest) -> Result<RawResponse>;
}

/// Transport backed by `reqwest`. The URL scheme selects HTTP or HTTPS.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    insecure_client: reqwest::Client,
}

impl HttpTransport {
    /// Builds the underlying connection pools.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the TLS backend cannot be
    /// initialized.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().build().map_err(|e| {
            Error::Configuration(format!("Failed to build HTTP client: {}", e))
        })?;
        let insecure_client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            insecure_client,
        })
    }

    fn map_error(error: reqwest::Error, request: &TransportRequest) -> Error {
        if error.is_timeout() {
            Error::Timeout {
                url: request.url.to_string(),
                timeout: request.timeout,
            }
        } else {
            Error::Transport(error)
        }
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &TransportRequest) -> Result<RawResponse> {
        let client = if request.accept_invalid_certs {
            &self.insecure_client
        } else {
            &self.client
        };

        let response = client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .timeout(request.timeout)
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| Self::map_error(e, request))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| Self::map_error(e, request))?;

        Ok(RawResponse {
            status,
            headers,
            body,
            synthetic: false,
        })
    }
}

/// Transport used when the client is disabled. Never performs I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledTransport;

#[async_trait::async_trait]
impl Transport for DisabledTransport {
    async fn send(&self, request: &TransportRequest) -> Result<RawResponse> {
        tracing::trace!(url = %request.url, "client disabled; skipping request");
        Ok(RawResponse::synthetic())
    }
}
