//! The Amplitude client.
//!
//! [`Client`] builds payloads for `track`, `identify` and `group_identify` and
//! hands them to the dispatcher. Use [`ClientBuilder`] to configure it.

use crate::{
    config::{ClientConfig, EventApi},
    dispatcher::Dispatcher,
    event::{Event, GroupIdentification, UploadOptions, UserIdentification},
    logging::{LogSink, NoopSink},
    payload::{ContentType, EventPayload, EventsPayload, IdentificationPayload, OutboundPayload},
    request::{RequestOptions, RequestSpec},
    retry::RetryPolicy,
    transport::{DisabledTransport, HttpTransport, Transport},
    Error, ResponseRecord, Result,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const IDENTIFY_PATH: &str = "/identify";
const GROUP_IDENTIFY_PATH: &str = "/groupidentify";

/// A client for the Amplitude HTTP API.
///
/// The client is cheap to clone and safe to share between tasks. Each call
/// builds its own request; retries of one call are sequential.
///
/// # Examples
///
/// ```no_run
/// use amplitude_http::{Client, Event, UserIdentification};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), amplitude_http::Error> {
/// let client = Client::builder("api-key")
///     .app_version("1.4.0")
///     .max_retries(3)
///     .build()?;
///
/// client
///     .track(Event::new("checkout").user_id("user-1").event_property("items", json!(3)))
///     .await?;
///
/// client
///     .identify(&UserIdentification::user("user-1").user_properties(json!({"plan": "pro"})))
///     .await?;
///
/// client
///     .group_identify("org", "acme", &json!({"seats": 40}))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    dispatcher: Dispatcher,
}

impl Client {
    /// Creates a client with default options.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty or the HTTP client cannot be
    /// initialized.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder(api_key).build()
    }

    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder(api_key: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(api_key)
    }

    /// Creates a client from a deserialized configuration.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        ClientBuilder::from_config(config).build()
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Sends `payload` as described by `spec`, retrying transient failures.
    ///
    /// This is the primitive the other calls are built on. The body encoding
    /// is taken from the spec's `Content-Type` header.
    ///
    /// # Errors
    ///
    /// * [`Error::Configuration`] if the content type is not form or JSON.
    /// * [`Error::Transport`] / [`Error::Timeout`] if an attempt fails below HTTP.
    /// * [`Error::Api`] if the final status is not 200.
    pub async fn send(&self, spec: &RequestSpec, payload: OutboundPayload) -> Result<ResponseRecord> {
        self.inner.dispatcher.dispatch(spec, payload).await
    }

    /// Tracks one event.
    ///
    /// Before sending, the client stamps `time` (if `set_time` is on) and
    /// `app_version` (if configured), overwriting caller values, and generates
    /// an `insert_id` if the event has none. The stamped event is available in
    /// the returned record's `request_data`.
    pub async fn track(&self, event: Event) -> Result<ResponseRecord> {
        self.track_with(event, UploadOptions::default(), RequestOptions::default())
            .await
    }

    /// Tracks one event with upload options and transport overrides.
    ///
    /// `upload` only applies to [`EventApi::V2`]; the legacy API has no
    /// options field.
    pub async fn track_with(
        &self,
        mut event: Event,
        upload: UploadOptions,
        options: RequestOptions,
    ) -> Result<ResponseRecord> {
        let config = &self.inner.config;
        event.stamp(
            config.set_time,
            config.app_version.as_deref(),
            Utc::now().timestamp_millis(),
        );

        let (content_type, payload) = match config.event_api {
            EventApi::V2 => (
                ContentType::Json,
                OutboundPayload::Events(EventsPayload {
                    api_key: config.api_key.clone(),
                    events: vec![event],
                    options: upload,
                }),
            ),
            EventApi::Legacy => (
                ContentType::FormUrlEncoded,
                OutboundPayload::Event(EventPayload {
                    api_key: config.api_key.clone(),
                    event: to_json_string(&event)?,
                }),
            ),
        };

        let spec = RequestSpec::post(config.event_api.path(), content_type, options);
        self.send(&spec, payload).await
    }

    /// Identifies a user or device.
    pub async fn identify(&self, identification: &UserIdentification) -> Result<ResponseRecord> {
        self.identify_with(identification, RequestOptions::default())
            .await
    }

    /// Identifies a user or device with transport overrides.
    pub async fn identify_with(
        &self,
        identification: &UserIdentification,
        options: RequestOptions,
    ) -> Result<ResponseRecord> {
        let payload = OutboundPayload::Identify(IdentificationPayload {
            api_key: self.inner.config.api_key.clone(),
            identification: to_json_string(identification)?,
        });

        let spec = RequestSpec::post(IDENTIFY_PATH, ContentType::FormUrlEncoded, options);
        self.send(&spec, payload).await
    }

    /// Sets properties on a group.
    ///
    /// `group_properties` may be any serializable map, or a
    /// [`PropertyOperations`](crate::PropertyOperations).
    pub async fn group_identify<P>(
        &self,
        group_type: &str,
        group_value: &str,
        group_properties: &P,
    ) -> Result<ResponseRecord>
    where
        P: Serialize + ?Sized,
    {
        self.group_identify_with(
            group_type,
            group_value,
            group_properties,
            RequestOptions::default(),
        )
        .await
    }

    /// Sets properties on a group with transport overrides.
    pub async fn group_identify_with<P>(
        &self,
        group_type: &str,
        group_value: &str,
        group_properties: &P,
        options: RequestOptions,
    ) -> Result<ResponseRecord>
    where
        P: Serialize + ?Sized,
    {
        let identification = GroupIdentification {
            group_type,
            group_value,
            group_properties,
        };
        let payload = OutboundPayload::GroupIdentify(IdentificationPayload {
            api_key: self.inner.config.api_key.clone(),
            identification: to_json_string(&identification)?,
        });

        let spec = RequestSpec::post(GROUP_IDENTIFY_PATH, ContentType::FormUrlEncoded, options);
        self.send(&spec, payload).await
    }
}

fn to_json_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::Serialization(e.to_string()))
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use amplitude_http::{ClientBuilder, EventApi};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), amplitude_http::Error> {
/// let client = ClientBuilder::new("api-key")
///     .endpoint("https://api.eu.amplitude.com")?
///     .timeout(Duration::from_secs(2))
///     .max_retries(4)
///     .set_time(true)
///     .event_api(EventApi::V2)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    logger: Option<Arc<dyn LogSink>>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_config(ClientConfig::new(api_key))
    }

    /// Starts from an existing configuration.
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
            logger: None,
        }
    }

    /// Sets the collector base URL. Only scheme, host and port are used.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn endpoint(mut self, url: impl AsRef<str>) -> Result<Self> {
        url::Url::parse(url.as_ref())?;
        self.config.endpoint = url.as_ref().to_string();
        Ok(self)
    }

    /// Disables all network I/O. Calls report success with status 0.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn app_version(mut self, app_version: impl Into<String>) -> Self {
        self.config.app_version = Some(app_version.into());
        self
    }

    pub fn set_time(mut self, set_time: bool) -> Self {
        self.config.set_time = set_time;
        self
    }

    /// Sets how many times a retryable status is retried.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Sets the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn event_api(mut self, event_api: EventApi) -> Self {
        self.config.event_api = event_api;
        self
    }

    /// Replaces the HTTP transport. Ignored when the client is disabled.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Installs a log sink in addition to the `tracing` events.
    pub fn logger(mut self, logger: impl LogSink + 'static) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn build(self) -> Result<Client> {
        let endpoint = self.config.validate()?;

        let transport: Arc<dyn Transport> = if !self.config.enabled {
            Arc::new(DisabledTransport)
        } else {
            match self.transport {
                Some(transport) => transport,
                None => Arc::new(HttpTransport::new()?),
            }
        };
        let logger = self.logger.unwrap_or_else(|| Arc::new(NoopSink));

        let dispatcher = Dispatcher::new(
            endpoint,
            self.config.timeout(),
            RetryPolicy::new(self.config.max_retries),
            transport,
            logger,
        );

        Ok(Client {
            inner: Arc::new(ClientInner {
                config: self.config,
                dispatcher,
            }),
        })
    }
}
