//! The outcome of one dispatch.
//!
//! A [`ResponseRecord`] is returned on success and embedded in
//! [`Error::Api`](crate::Error::Api) on failure, so callers can always inspect
//! the collector's answer, timing and the exact payload that was sent.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::HeaderMap;
use std::time::Duration;
use url::Url;

use crate::payload::OutboundPayload;

/// Status, body and timing of the final attempt of a dispatch.
///
/// # Examples
///
/// ```no_run
/// use amplitude_http::{Client, Event};
///
/// # async fn example() -> Result<(), amplitude_http::Error> {
/// let client = Client::new("api-key")?;
/// let record = client.track(Event::new("page view").device_id("device-9")).await?;
///
/// println!("status {} in {:?}", record.status, record.elapsed());
/// println!("retries: {}", record.retry_count);
/// println!("collector body: {}", record.text());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ResponseRecord {
    /// The HTTP status code. `0` when the client is disabled and no request
    /// was made.
    pub status: u16,

    /// The raw response body. Usually `"success"` for accepted uploads, an
    /// error message or an HTML error page otherwise.
    pub body: Bytes,

    /// The response headers.
    pub headers: HeaderMap,

    /// When the final attempt started.
    pub start: DateTime<Utc>,

    /// When the final attempt finished, after the body was fully read.
    pub end: DateTime<Utc>,

    /// `true` iff the status is 200, or the response was synthesized by a
    /// disabled client.
    pub succeeded: bool,

    /// The number of retries performed before this outcome.
    pub retry_count: u32,

    /// The URL the request was sent to.
    pub url: Url,

    /// The payload that produced this outcome.
    pub request_data: OutboundPayload,
}

impl ResponseRecord {
    /// Wall-clock duration of the final attempt.
    pub fn elapsed(&self) -> Duration {
        (self.end - self.start).to_std().unwrap_or_default()
    }

    /// The body decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Returns a response header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Returns `true` if the dispatch needed at least one retry.
    pub fn was_retried(&self) -> bool {
        self.retry_count > 0
    }
}
