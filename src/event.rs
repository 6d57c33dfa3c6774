//! Data shapes accepted by the collector.
//!
//! These are plain serde types. Unset optional fields are omitted from the wire
//! form, and [`Event::extra`] carries anything the typed fields do not cover.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Device, platform and location fields shared by events and identifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommonProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dma: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Group memberships, keyed by group type. A value is one group name or a list.
pub type Groups = BTreeMap<String, GroupValue>;

/// One or many group names for a group type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupValue {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for GroupValue {
    fn from(value: &str) -> Self {
        GroupValue::One(value.to_string())
    }
}

impl From<String> for GroupValue {
    fn from(value: String) -> Self {
        GroupValue::One(value)
    }
}

impl From<Vec<String>> for GroupValue {
    fn from(values: Vec<String>) -> Self {
        GroupValue::Many(values)
    }
}

/// Property update operations for user or group properties.
///
/// Plain maps are also accepted wherever properties are, this type only exists
/// to spell the operation keys correctly.
///
/// ```
/// use amplitude_http::PropertyOperations;
/// use serde_json::json;
///
/// let ops = PropertyOperations::default()
///     .set("plan", json!("pro"))
///     .add("logins", json!(1));
///
/// assert_eq!(
///     serde_json::to_value(&ops).unwrap(),
///     json!({"$set": {"plan": "pro"}, "$add": {"logins": 1}})
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyOperations {
    #[serde(rename = "$set", skip_serializing_if = "Option::is_none")]
    pub set: Option<Map<String, Value>>,
    #[serde(rename = "$unset", skip_serializing_if = "Option::is_none")]
    pub unset: Option<Map<String, Value>>,
    #[serde(rename = "$setOnce", skip_serializing_if = "Option::is_none")]
    pub set_once: Option<Map<String, Value>>,
    #[serde(rename = "$append", skip_serializing_if = "Option::is_none")]
    pub append: Option<Map<String, Value>>,
    #[serde(rename = "$prepend", skip_serializing_if = "Option::is_none")]
    pub prepend: Option<Map<String, Value>>,
    #[serde(rename = "$add", skip_serializing_if = "Option::is_none")]
    pub add: Option<Map<String, Value>>,
}

impl PropertyOperations {
    pub fn set(mut self, key: impl Into<String>, value: Value) -> Self {
        insert_op(&mut self.set, key, value);
        self
    }

    pub fn unset(mut self, key: impl Into<String>) -> Self {
        insert_op(&mut self.unset, key, Value::String("-".to_string()));
        self
    }

    pub fn set_once(mut self, key: impl Into<String>, value: Value) -> Self {
        insert_op(&mut self.set_once, key, value);
        self
    }

    pub fn append(mut self, key: impl Into<String>, value: Value) -> Self {
        insert_op(&mut self.append, key, value);
        self
    }

    pub fn prepend(mut self, key: impl Into<String>, value: Value) -> Self {
        insert_op(&mut self.prepend, key, value);
        self
    }

    pub fn add(mut self, key: impl Into<String>, value: Value) -> Self {
        insert_op(&mut self.add, key, value);
        self
    }
}

impl From<PropertyOperations> for Value {
    fn from(ops: PropertyOperations) -> Self {
        // string-keyed maps of values always serialize
        serde_json::to_value(ops).unwrap_or_default()
    }
}

fn insert_op(slot: &mut Option<Map<String, Value>>, key: impl Into<String>, value: Value) {
    slot.get_or_insert_with(Map::new).insert(key.into(), value);
}

/// An analytics event.
///
/// `event_type` and one of `user_id` / `device_id` are expected by the
/// collector. The client does not validate the rest of the payload.
///
/// ```
/// use amplitude_http::Event;
/// use serde_json::json;
///
/// let event = Event::new("song played")
///     .user_id("user-42")
///     .event_property("genre", json!("jazz"));
///
/// assert_eq!(event.event_type, "song played");
/// assert!(event.insert_id.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Milliseconds since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_properties: Option<Map<String, Value>>,
    /// Either a plain map or a [`PropertyOperations`] object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_properties: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Groups>,
    #[serde(flatten)]
    pub common: CommonProperties,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue: Option<f64>,
    #[serde(rename = "productId", skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(rename = "revenueType", skip_serializing_if = "Option::is_none")]
    pub revenue_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_lng: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idfa: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idfv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<i64>,
    /// Deduplication key. Generated by [`Client::track`](crate::Client::track)
    /// when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_id: Option<String>,
    /// Fields not covered above, sent as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Event {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            ..Default::default()
        }
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn time(mut self, millis: i64) -> Self {
        self.time = Some(millis);
        self
    }

    pub fn insert_id(mut self, insert_id: impl Into<String>) -> Self {
        self.insert_id = Some(insert_id.into());
        self
    }

    pub fn ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn event_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.event_properties
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    pub fn user_properties(mut self, properties: impl Into<Value>) -> Self {
        self.user_properties = Some(properties.into());
        self
    }

    pub fn group(mut self, group_type: impl Into<String>, value: impl Into<GroupValue>) -> Self {
        self.groups
            .get_or_insert_with(Groups::new)
            .insert(group_type.into(), value.into());
        self
    }

    /// Sets an arbitrary top-level field.
    ///
    /// `time`, `app_version` and `insert_id` go to their typed fields when the
    /// value has the matching JSON type.
    pub fn field(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        if !self.set_stamped(&key, &value) {
            self.extra.insert(key, value);
        }
        self
    }

    fn set_stamped(&mut self, key: &str, value: &Value) -> bool {
        match (key, value) {
            ("time", Value::Number(n)) if n.is_i64() => self.time = n.as_i64(),
            ("app_version", Value::String(v)) => self.common.app_version = Some(v.clone()),
            ("insert_id", Value::String(v)) => self.insert_id = Some(v.clone()),
            _ => return false,
        }
        true
    }

    /// Moves stamped keys out of `extra` so each is serialized once. A typed
    /// value already present wins.
    fn absorb_stamped_extras(&mut self) {
        if let Some(value) = self.extra.remove("time") {
            self.time = self.time.or(value.as_i64());
        }
        if let Some(value) = self.extra.remove("app_version") {
            if self.common.app_version.is_none() {
                self.common.app_version = value.as_str().map(str::to_string);
            }
        }
        if let Some(value) = self.extra.remove("insert_id") {
            if self.insert_id.is_none() {
                self.insert_id = value.as_str().map(str::to_string);
            }
        }
    }

    /// Stamps client-level defaults onto the event.
    ///
    /// `time` and `app_version` are overwritten whenever the client is
    /// configured to set them. `insert_id` is only filled in when missing or
    /// empty.
    pub(crate) fn stamp(&mut self, set_time: bool, app_version: Option<&str>, now_ms: i64) {
        self.absorb_stamped_extras();
        if set_time {
            self.time = Some(now_ms);
        }
        if let Some(app_version) = app_version {
            self.common.app_version = Some(app_version.to_string());
        }
        if self.insert_id.as_deref().map_or(true, str::is_empty) {
            self.insert_id = Some(generate_insert_id(now_ms));
        }
    }
}

/// Builds an insert id of the form `<epoch-ms>_<random digits>`.
pub(crate) fn generate_insert_id(now_ms: i64) -> String {
    let fraction: f64 = rand::thread_rng().gen();
    let fraction = fraction.to_string();
    let digits = fraction.strip_prefix("0.").unwrap_or(&fraction);
    format!("{now_ms}_{digits}")
}

/// Who an identification is about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Identity {
    UserId(String),
    DeviceId(String),
}

/// A user identification, sent to the identify endpoint.
///
/// Exactly one of `user_id` or `device_id` is carried, via [`Identity`].
///
/// ```
/// use amplitude_http::UserIdentification;
/// use serde_json::json;
///
/// let mut identification = UserIdentification::user("12345");
/// identification.common.city = Some("Beantown".to_string());
///
/// assert_eq!(
///     serde_json::to_value(&identification).unwrap(),
///     json!({"user_id": "12345", "city": "Beantown"})
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentification {
    #[serde(flatten)]
    pub identity: Identity,
    /// Either a plain map or a [`PropertyOperations`] object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_properties: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Groups>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paying: Option<Paying>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_version: Option<String>,
    #[serde(flatten)]
    pub common: CommonProperties,
}

impl UserIdentification {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            user_properties: None,
            groups: None,
            paying: None,
            start_version: None,
            common: CommonProperties::default(),
        }
    }

    /// Identifies by user id.
    pub fn user(user_id: impl Into<String>) -> Self {
        Self::new(Identity::UserId(user_id.into()))
    }

    /// Identifies by device id.
    pub fn device(device_id: impl Into<String>) -> Self {
        Self::new(Identity::DeviceId(device_id.into()))
    }

    pub fn user_properties(mut self, properties: impl Into<Value>) -> Self {
        self.user_properties = Some(properties.into());
        self
    }

    pub fn group(mut self, group_type: impl Into<String>, value: impl Into<GroupValue>) -> Self {
        self.groups
            .get_or_insert_with(Groups::new)
            .insert(group_type.into(), value.into());
        self
    }
}

/// Paying status, encoded as the strings `"true"` / `"false"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Paying {
    #[serde(rename = "true")]
    Yes,
    #[serde(rename = "false")]
    No,
}

/// The object serialized into the `identification` field of a group identify.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct GroupIdentification<'a, P: Serialize + ?Sized> {
    pub group_type: &'a str,
    pub group_value: &'a str,
    pub group_properties: &'a P,
}

/// Body-level options of the batch event upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOptions {
    /// Minimum length accepted for `user_id` and `device_id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_id_length: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_stamp_overwrites_time_and_app_version() {
        let mut event = Event::new("my event").user_id("12345").time(1);
        event.common.app_version = Some("0.0.1".to_string());

        event.stamp(true, Some("7.6.8"), 1_700_000_000_000);

        assert_eq!(event.time, Some(1_700_000_000_000));
        assert_eq!(event.common.app_version.as_deref(), Some("7.6.8"));
    }

    #[test]
    fn test_stamp_leaves_fields_when_not_configured() {
        let mut event = Event::new("my event").user_id("12345").time(1);

        event.stamp(false, None, 1_700_000_000_000);

        assert_eq!(event.time, Some(1));
        assert!(event.common.app_version.is_none());
    }

    #[test]
    fn test_stamp_keeps_caller_insert_id() {
        let mut event = Event::new("my event").insert_id("mine");
        event.stamp(false, None, 5);
        assert_eq!(event.insert_id.as_deref(), Some("mine"));
    }

    #[test]
    fn test_stamp_replaces_empty_insert_id() {
        let mut event = Event::new("my event").insert_id("");
        event.stamp(false, None, 5);
        assert!(event.insert_id.unwrap().starts_with("5_"));
    }

    #[test]
    fn test_field_routes_stamped_keys_to_typed_fields() {
        let event = Event::new("my event")
            .field("time", json!(1))
            .field("app_version", json!("old"))
            .field("insert_id", json!("dup"))
            .field("custom", json!(true));

        assert_eq!(event.time, Some(1));
        assert_eq!(event.common.app_version.as_deref(), Some("old"));
        assert_eq!(event.insert_id.as_deref(), Some("dup"));
        assert_eq!(event.extra.len(), 1);
        assert_eq!(event.extra["custom"], json!(true));
    }

    #[test]
    fn test_stamped_keys_serialized_once() {
        let mut event = Event::new("my event").user_id("12345").insert_id("mine");
        event.extra.insert("time".to_string(), json!(1));
        event.extra.insert("app_version".to_string(), json!("old"));
        event.extra.insert("insert_id".to_string(), json!("dup"));

        event.stamp(true, Some("7.6.8"), 1_700_000_000_000);

        let wire = serde_json::to_string(&event).unwrap();
        for key in ["\"time\":", "\"app_version\":", "\"insert_id\":"] {
            assert_eq!(wire.matches(key).count(), 1, "{key} in {wire}");
        }
        assert!(event.extra.is_empty());
        assert_eq!(event.time, Some(1_700_000_000_000));
        assert_eq!(event.common.app_version.as_deref(), Some("7.6.8"));
        assert_eq!(event.insert_id.as_deref(), Some("mine"));
    }

    #[test]
    fn test_generated_insert_id_shape() {
        let id = generate_insert_id(1_700_000_000_000);
        let (millis, digits) = id.split_once('_').unwrap();
        assert_eq!(millis, "1700000000000");
        assert!(!digits.is_empty());
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_insert_ids_unique_within_same_millisecond() {
        let ids: HashSet<_> = (0..1000).map(|_| generate_insert_id(42)).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_event_omits_unset_fields() {
        let event = Event::new("my event")
            .user_id("12345")
            .ip("1.2.3.4")
            .field("custom", json!(true));

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"event_type": "my event", "user_id": "12345", "ip": "1.2.3.4", "custom": true})
        );
    }

    #[test]
    fn test_revenue_field_names() {
        let mut event = Event::new("purchase").device_id("d");
        event.product_id = Some("sku-1".to_string());
        event.revenue_type = Some("income".to_string());

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["productId"], "sku-1");
        assert_eq!(value["revenueType"], "income");
    }

    #[test]
    fn test_identification_by_device() {
        let identification = UserIdentification::device("device-1")
            .group("Team ID", "34567")
            .user_properties(json!({"plan": "pro"}));

        assert_eq!(
            serde_json::to_value(&identification).unwrap(),
            json!({
                "device_id": "device-1",
                "user_properties": {"plan": "pro"},
                "groups": {"Team ID": "34567"}
            })
        );
    }

    #[test]
    fn test_paying_encoding() {
        let mut identification = UserIdentification::user("u");
        identification.paying = Some(Paying::Yes);
        let value = serde_json::to_value(&identification).unwrap();
        assert_eq!(value["paying"], "true");
    }

    #[test]
    fn test_group_identification_field_order() {
        let properties = json!({"hello": "world"});
        let group = GroupIdentification {
            group_type: "team id",
            group_value: "12345",
            group_properties: &properties,
        };

        assert_eq!(
            serde_json::to_string(&group).unwrap(),
            r#"{"group_type":"team id","group_value":"12345","group_properties":{"hello":"world"}}"#
        );
    }

    #[test]
    fn test_upload_options_default_is_empty_object() {
        assert_eq!(
            serde_json::to_value(UploadOptions::default()).unwrap(),
            json!({})
        );
    }
}
