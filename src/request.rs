//! Per-request description handed to the dispatcher.

use http::{header::CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, Method};

use crate::payload::ContentType;

/// Caller-supplied transport overrides for a single call.
///
/// Overrides are merged into the outgoing request. They never change the
/// method, path or `Content-Type` chosen by the client.
///
/// # Examples
///
/// ```
/// use amplitude_http::RequestOptions;
///
/// let options = RequestOptions::new()
///     .with_header("x-request-source", "batch-import")
///     .unwrap()
///     .accept_invalid_certs(true);
///
/// assert!(options.accept_invalid_certs);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Additional headers for this request.
    pub headers: HeaderMap,

    /// Skip TLS certificate verification, e.g. for a self-signed collector in
    /// a test environment.
    pub accept_invalid_certs: bool,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header to the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, crate::Error> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| crate::Error::Configuration(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| crate::Error::Configuration(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}

/// Method, path and headers of one logical request.
///
/// The dispatcher resolves `path` against the configured endpoint and reads
/// the body encoding from the `Content-Type` header.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    /// The HTTP method.
    pub method: Method,

    /// The request path, replacing any path on the configured endpoint.
    pub path: String,

    /// Request headers, including `Content-Type`.
    pub headers: HeaderMap,

    /// Transport-level switches.
    pub accept_invalid_certs: bool,
}

impl RequestSpec {
    /// A `POST` to `path` with the given overrides and body encoding.
    ///
    /// Caller headers are applied first, so the client's `Content-Type` wins.
    pub fn post(path: impl Into<String>, content_type: ContentType, options: RequestOptions) -> Self {
        let mut headers = options.headers;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type.as_str()));
        Self {
            method: Method::POST,
            path: path.into(),
            headers,
            accept_invalid_certs: options.accept_invalid_certs,
        }
    }

    /// The raw `Content-Type` header, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE)?.to_str().ok()
    }
}
