//! Optional log sink for host applications that do not use `tracing`.
//!
//! The client always emits `tracing` events. A [`LogSink`] additionally
//! receives a plain-text line at the same points. A sink that panics is
//! ignored: the call it was logging for carries on unchanged.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Severity of a sink message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives one line per dispatch milestone: request sent (debug), success
/// (info), retry (warn) and terminal failure (error).
///
/// Closures taking `(LogLevel, &str)` implement this trait.
///
/// ```
/// use amplitude_http::{Client, LogLevel};
///
/// let client = Client::builder("api-key")
///     .logger(|level: LogLevel, message: &str| eprintln!("[{level}] {message}"))
///     .build()
///     .unwrap();
/// ```
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
}

impl<F> LogSink for F
where
    F: Fn(LogLevel, &str) + Send + Sync,
{
    fn log(&self, level: LogLevel, message: &str) {
        self(level, message)
    }
}

/// The default sink. Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn log(&self, _level: LogLevel, _message: &str) {}
}

/// Forwards to `sink`, swallowing any panic it raises.
pub(crate) fn emit(sink: &dyn LogSink, level: LogLevel, message: &str) {
    if catch_unwind(AssertUnwindSafe(|| sink.log(level, message))).is_err() {
        tracing::trace!(level = %level, "log sink panicked; message dropped");
    }
}
