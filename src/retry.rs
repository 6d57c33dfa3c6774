//! Status classification for the dispatch loop.
//!
//! Retries depend only on the status code: the transient server statuses
//! 500, 502, 503 and 504 are retried immediately, up to `max_retries` times.
//! Response bodies and headers are never consulted.

/// Statuses the collector documents as transient.
pub const RETRYABLE_STATUSES: [u16; 4] = [500, 502, 503, 504];

/// Returns `true` if `status` is one of [`RETRYABLE_STATUSES`].
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// What the dispatcher should do with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Return the response to the caller.
    Succeed,
    /// Send the identical request again.
    Retry,
    /// Raise an API error carrying the response.
    Fail,
}

/// Bounded retry policy.
///
/// # Examples
///
/// ```
/// use amplitude_http::retry::{Decision, RetryPolicy};
///
/// let policy = RetryPolicy::new(2);
///
/// assert_eq!(policy.decide(200, false, 0), Decision::Succeed);
/// assert_eq!(policy.decide(503, false, 1), Decision::Retry);
/// assert_eq!(policy.decide(503, false, 2), Decision::Fail);
/// assert_eq!(policy.decide(429, false, 0), Decision::Fail);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Classifies one attempt.
    ///
    /// # Arguments
    ///
    /// * `status` - The HTTP status of the attempt
    /// * `synthetic` - Whether the response was synthesized without I/O
    /// * `retry_count` - Retries already performed (0 on the first attempt)
    pub fn decide(&self, status: u16, synthetic: bool, retry_count: u32) -> Decision {
        if synthetic || status == 200 {
            Decision::Succeed
        } else if is_retryable_status(status) && retry_count < self.max_retries {
            Decision::Retry
        } else {
            Decision::Fail
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2)
    }
}
