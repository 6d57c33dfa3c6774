//! Error types for Amplitude API calls.
//!
//! Transport failures, configuration mistakes and API rejections are kept in
//! separate variants. Only [`Error::Api`] carries a [`ResponseRecord`], since it
//! is the only case where the collector actually answered.

use std::time::Duration;

use crate::ResponseRecord;

/// The main error type for Amplitude API calls.
///
/// # Examples
///
/// ```no_run
/// use amplitude_http::{Client, Error, Event};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::new("api-key")?;
///
/// match client.track(Event::new("signup").user_id("user-1")).await {
///     Ok(record) => println!("accepted after {} retries", record.retry_count),
///     Err(Error::Api { message, response }) => {
///         eprintln!("{message}");
///         eprintln!("collector said: {}", response.text());
///     }
///     Err(e) if e.is_transport() => eprintln!("could not reach collector: {e}"),
///     Err(e) => eprintln!("other error: {e}"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error occurred (connection refused, DNS lookup failed,
    /// socket reset mid-response, etc.).
    ///
    /// These are never retried by the dispatcher.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A single attempt exceeded the configured per-attempt timeout.
    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout {
        /// The URL that was being called
        url: String,
        /// The configured per-attempt timeout
        timeout: Duration,
    },

    /// The collector answered with a status other than 200, either because the
    /// status is not retryable or because retries were exhausted.
    ///
    /// The message names the target URL, the final status and the number of
    /// retries performed. The full response record is attached.
    #[error("{message}")]
    Api {
        /// Human readable description of the failure
        message: String,
        /// The final response, including timing and the payload that was sent
        response: Box<ResponseRecord>,
    },

    /// Invalid configuration was provided.
    ///
    /// This covers client options, header values and unrecognized request
    /// content types. Raised before any network I/O.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Failed to serialize a payload into its wire form.
    #[error("Failed to serialize payload: {0}")]
    Serialization(String),

    /// The configured endpoint is not a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Returns `true` for failures below the HTTP layer (including timeouts).
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Timeout { .. })
    }

    /// Returns the final HTTP status code for API errors.
    pub fn status(&self) -> Option<u16> {
        self.response().map(|response| response.status)
    }

    /// Returns the response record attached to an API error.
    pub fn response(&self) -> Option<&ResponseRecord> {
        match self {
            Error::Api { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Returns the number of retries that were performed before an API error
    /// was raised.
    pub fn retry_count(&self) -> Option<u32> {
        self.response().map(|response| response.retry_count)
    }
}

/// A specialized `Result` type for Amplitude API calls.
pub type Result<T> = std::result::Result<T, Error>;
