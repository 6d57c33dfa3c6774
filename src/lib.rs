//! # amplitude-http - Amplitude HTTP API client
//!
//! Sends analytics events, user identifications and group identifications to
//! the Amplitude HTTP API. Transient server failures (500, 502, 503, 504) are
//! retried a bounded number of times; everything else is reported straight
//! back with the full response attached.
//!
//! ## Quick Start
//!
//! ```no_run
//! use amplitude_http::{Client, Event};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), amplitude_http::Error> {
//!     let client = Client::builder("api-key")
//!         .app_version("2.1.0")
//!         .max_retries(3)
//!         .build()?;
//!
//!     let record = client
//!         .track(
//!             Event::new("song played")
//!                 .user_id("user-42")
//!                 .event_property("genre", json!("jazz")),
//!         )
//!         .await?;
//!
//!     println!("status {} after {} retries", record.status, record.retry_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! ```no_run
//! use amplitude_http::{Client, Error, UserIdentification};
//!
//! # async fn example() -> Result<(), Error> {
//! # let client = Client::new("api-key")?;
//! match client.identify(&UserIdentification::user("user-42")).await {
//!     Ok(record) => println!("identified in {:?}", record.elapsed()),
//!     Err(Error::Api { message, response }) => {
//!         eprintln!("{message}");
//!         eprintln!("  body: {}", response.text());
//!     }
//!     Err(e) if e.is_transport() => eprintln!("collector unreachable: {e}"),
//!     Err(e) => eprintln!("other error: {e}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Disabled Clients
//!
//! A client built with `.enabled(false)` never touches the network. Every call
//! resolves successfully with status 0, which lets non-production environments
//! keep their tracking calls in place.

mod client;
pub mod config;
mod dispatcher;
mod error;
pub mod event;
pub mod logging;
pub mod payload;
mod request;
mod response;
pub mod retry;
pub mod transport;

pub use client::{Client, ClientBuilder};
pub use config::{ClientConfig, EventApi};
pub use error::{Error, Result};
pub use event::{
    CommonProperties, Event, GroupValue, Groups, Identity, Paying, PropertyOperations,
    UploadOptions, UserIdentification,
};
pub use logging::{LogLevel, LogSink};
pub use payload::{ContentType, OutboundPayload};
pub use request::{RequestOptions, RequestSpec};
pub use response::ResponseRecord;
pub use transport::Transport;
