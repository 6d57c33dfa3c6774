//! Request bodies and their wire encodings.

use serde::Serialize;
use serde_json::Value;

use crate::event::{Event, UploadOptions};
use crate::{Error, Result};

/// The body of one logical request, before encoding.
///
/// Serializes to the flat object the collector expects; the variant only
/// records which endpoint the body was built for.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutboundPayload {
    /// Batch event upload, JSON encoded.
    Events(EventsPayload),
    /// Single event upload with the event as a JSON string, form encoded.
    Event(EventPayload),
    /// User identification, form encoded.
    Identify(IdentificationPayload),
    /// Group identification, form encoded.
    GroupIdentify(IdentificationPayload),
}

impl OutboundPayload {
    pub fn api_key(&self) -> &str {
        match self {
            OutboundPayload::Events(payload) => &payload.api_key,
            OutboundPayload::Event(payload) => &payload.api_key,
            OutboundPayload::Identify(payload) | OutboundPayload::GroupIdentify(payload) => {
                &payload.api_key
            }
        }
    }

    /// The events carried by a batch upload. Empty for other payloads.
    pub fn events(&self) -> &[Event] {
        match self {
            OutboundPayload::Events(payload) => &payload.events,
            _ => &[],
        }
    }

    /// The JSON-encoded `identification` field of identify payloads.
    pub fn identification(&self) -> Option<&str> {
        match self {
            OutboundPayload::Identify(payload) | OutboundPayload::GroupIdentify(payload) => {
                Some(&payload.identification)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventsPayload {
    pub api_key: String,
    pub events: Vec<Event>,
    pub options: UploadOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventPayload {
    pub api_key: String,
    /// The event, JSON encoded.
    pub event: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentificationPayload {
    pub api_key: String,
    /// The identification object, JSON encoded.
    pub identification: String,
}

/// Body encodings understood by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    FormUrlEncoded,
    Json,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::FormUrlEncoded => "application/x-www-form-urlencoded",
            ContentType::Json => "application/json",
        }
    }

    /// Parses a `Content-Type` header value. Media type parameters such as
    /// `charset` are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for any other media type.
    pub fn from_header(value: &str) -> Result<Self> {
        let essence = value.split(';').next().unwrap_or_default().trim();
        if essence.eq_ignore_ascii_case(ContentType::FormUrlEncoded.as_str()) {
            Ok(ContentType::FormUrlEncoded)
        } else if essence.eq_ignore_ascii_case(ContentType::Json.as_str()) {
            Ok(ContentType::Json)
        } else {
            Err(Error::Configuration(format!(
                "Unknown Content-Type header: \"{value}\""
            )))
        }
    }

    /// Encodes `payload` into a request body.
    ///
    /// Form encoding requires a flat object: strings, numbers, booleans, nulls
    /// and arrays of those. Nested objects must be JSON encoded into a string
    /// field by the caller.
    pub fn encode<T: Serialize>(&self, payload: &T) -> Result<Vec<u8>> {
        match self {
            ContentType::Json => {
                serde_json::to_vec(payload).map_err(|e| Error::Serialization(e.to_string()))
            }
            ContentType::FormUrlEncoded => encode_form(payload),
        }
    }
}

fn encode_form<T: Serialize>(payload: &T) -> Result<Vec<u8>> {
    let value = serde_json::to_value(payload).map_err(|e| Error::Serialization(e.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(Error::Serialization(
            "form bodies must serialize to an object".to_string(),
        ));
    };

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in &fields {
        match value {
            Value::Array(items) => {
                for item in items {
                    serializer.append_pair(key, &form_scalar(key, item)?);
                }
            }
            other => {
                serializer.append_pair(key, &form_scalar(key, other)?);
            }
        }
    }
    Ok(serializer.finish().into_bytes())
}

fn form_scalar(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err(Error::Serialization(format!(
            "field `{key}` is nested and cannot be form encoded"
        ))),
    }
}
