//! Send-with-retry for one logical request.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use http::header::{HeaderValue, CONTENT_LENGTH};
use url::Url;

use crate::logging::{self, LogLevel, LogSink};
use crate::payload::{ContentType, OutboundPayload};
use crate::request::RequestSpec;
use crate::retry::{Decision, RetryPolicy};
use crate::transport::{Transport, TransportRequest};
use crate::{Error, ResponseRecord, Result};

pub(crate) struct Dispatcher {
    endpoint: Url,
    timeout: Duration,
    policy: RetryPolicy,
    transport: Arc<dyn Transport>,
    logger: Arc<dyn LogSink>,
}

impl Dispatcher {
    pub(crate) fn new(
        endpoint: Url,
        timeout: Duration,
        policy: RetryPolicy,
        transport: Arc<dyn Transport>,
        logger: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            endpoint,
            timeout,
            policy,
            transport,
            logger,
        }
    }

    /// Encodes `payload` once, then sends it until the policy says stop.
    ///
    /// Every retry resends the identical request. Transport errors end the
    /// loop immediately.
    pub(crate) async fn dispatch(
        &self,
        spec: &RequestSpec,
        payload: OutboundPayload,
    ) -> Result<ResponseRecord> {
        let request = self.prepare(spec, &payload)?;
        let url = request.url.clone();
        let bytes = request.body.len();

        let mut retry_count: u32 = 0;
        loop {
            tracing::debug!(
                method = %request.method,
                url = %url,
                bytes = bytes,
                retry_count = retry_count,
                "Sending request"
            );
            self.log(
                LogLevel::Debug,
                &format!("sending request to Amplitude API {url} ({bytes} bytes)"),
            );

            let start = Utc::now();
            let raw = match self.transport.send(&request).await {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::error!(error = %e, url = %url, retry_count = retry_count, "Transport failure");
                    self.log(
                        LogLevel::Error,
                        &format!("Amplitude API call to {url} failed: {e}"),
                    );
                    return Err(e);
                }
            };
            let end = Utc::now();
            let elapsed_ms = (end - start).num_milliseconds();

            match self.policy.decide(raw.status, raw.synthetic, retry_count) {
                Decision::Retry => {
                    tracing::warn!(
                        status = raw.status,
                        url = %url,
                        retry_count = retry_count,
                        "Retryable status; retrying"
                    );
                    self.log(
                        LogLevel::Warn,
                        &format!(
                            "retrying Amplitude request to {url} (status code: {}, retries: {retry_count})",
                            raw.status
                        ),
                    );
                    retry_count += 1;
                }
                Decision::Succeed => {
                    tracing::info!(
                        status = raw.status,
                        url = %url,
                        retry_count = retry_count,
                        elapsed_ms = elapsed_ms,
                        "Request succeeded"
                    );
                    self.log(
                        LogLevel::Info,
                        &format!(
                            "successful Amplitude API call to {url} after {retry_count} retries ({elapsed_ms}ms)"
                        ),
                    );
                    return Ok(ResponseRecord {
                        status: raw.status,
                        body: raw.body,
                        headers: raw.headers,
                        start,
                        end,
                        succeeded: true,
                        retry_count,
                        url,
                        request_data: payload,
                    });
                }
                Decision::Fail => {
                    let message = format!(
                        "Amplitude API call to {url} failed with status {} after {retry_count} retries",
                        raw.status
                    );
                    tracing::error!(
                        status = raw.status,
                        url = %url,
                        retry_count = retry_count,
                        elapsed_ms = elapsed_ms,
                        response = %String::from_utf8_lossy(&raw.body),
                        "Request failed"
                    );
                    self.log(LogLevel::Error, &format!("{message} ({elapsed_ms}ms)"));
                    return Err(Error::Api {
                        message,
                        response: Box::new(ResponseRecord {
                            status: raw.status,
                            body: raw.body,
                            headers: raw.headers,
                            start,
                            end,
                            succeeded: false,
                            retry_count,
                            url,
                            request_data: payload,
                        }),
                    });
                }
            }
        }
    }

    /// Resolves the URL and encodes the body. Fails before any I/O.
    fn prepare(&self, spec: &RequestSpec, payload: &OutboundPayload) -> Result<TransportRequest> {
        let mut url = self.endpoint.clone();
        url.set_path(&spec.path);
        url.set_query(None);
        url.set_fragment(None);

        let content_type = spec
            .content_type()
            .ok_or_else(|| Error::Configuration("Missing Content-Type header".to_string()))?;
        let content_type = ContentType::from_header(content_type)?;
        let body = Bytes::from(content_type.encode(payload)?);

        let mut headers = spec.headers.clone();
        headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));

        Ok(TransportRequest {
            method: spec.method.clone(),
            url,
            headers,
            body,
            timeout: self.timeout,
            accept_invalid_certs: spec.accept_invalid_certs,
        })
    }

    fn log(&self, level: LogLevel, message: &str) {
        logging::emit(self.logger.as_ref(), level, message);
    }
}
