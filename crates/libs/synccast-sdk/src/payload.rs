//! Event envelopes posted to the broker-fronting API.

use crate::error::SyncCastError;
use crate::scope::ScopeRef;
use crate::types::{EventType, Priority, QosLevel};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::fmt::Display;

pub type JsonMap = serde_json::Map<String, JsonValue>;

pub const USER_SENDER_ROLE: &str = "user";
pub const SYSTEM_SENDER_ROLE: &str = "system";
pub const UNKNOWN_METADATA: &str = "unknown";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SenderInfo {
    pub id: String,
    pub name: String,
    pub role: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Metadata {
    pub platform: String,
    pub device: String,
    pub location: String,
}

impl Metadata {
    /// `None` when all three are absent; otherwise missing fields become `"unknown"`.
    pub fn from_parts(
        platform: Option<&str>,
        device: Option<&str>,
        location: Option<&str>,
    ) -> Option<Self> {
        if platform.is_none() && device.is_none() && location.is_none() {
            return None;
        }
        Some(Self {
            platform: platform.unwrap_or(UNKNOWN_METADATA).to_owned(),
            device: device.unwrap_or(UNKNOWN_METADATA).to_owned(),
            location: location.unwrap_or(UNKNOWN_METADATA).to_owned(),
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: String,
    pub url: String,
}

/// Wire shape of one event. `sender`, `metadata` and `action` serialize as `{}` when unset.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct EventEnvelope {
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub priority: Priority,
    pub qos: QosLevel,
    pub scope: Option<String>,
    pub topic: String,
    pub data: JsonMap,
    #[serde(serialize_with = "object_or_empty")]
    pub sender: Option<SenderInfo>,
    #[serde(serialize_with = "object_or_empty")]
    pub metadata: Option<Metadata>,
    #[serde(serialize_with = "object_or_empty")]
    pub action: Option<Action>,
}

fn object_or_empty<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    match value {
        Some(inner) => inner.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}

impl EventEnvelope {
    pub fn to_value(&self) -> Result<JsonValue, SyncCastError> {
        serde_json::to_value(self).map_err(|err| {
            SyncCastError::payload(format!("failed to serialize payload: {err}"))
                .with_detail("topic", self.topic.clone())
                .with_source(err)
        })
    }
}

#[derive(Clone, Debug)]
pub struct PayloadBuilder {
    user_id: Option<String>,
    event_type: EventType,
    priority: Priority,
    qos: QosLevel,
    scope: Option<String>,
    topic: Option<String>,
    data: JsonMap,
    sender: Option<SenderInfo>,
    metadata: Option<Metadata>,
    action: Option<Action>,
    default_sender_role: String,
}

impl Default for PayloadBuilder {
    fn default() -> Self {
        Self {
            user_id: None,
            event_type: EventType::default(),
            priority: Priority::default(),
            qos: QosLevel::default(),
            scope: None,
            topic: None,
            data: JsonMap::new(),
            sender: None,
            metadata: None,
            action: None,
            default_sender_role: USER_SENDER_ROLE.to_owned(),
        }
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(number) if number.is_f64() => "float",
        JsonValue::Number(_) => "integer",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_event(user_id: Option<&str>, event_type: EventType) -> Self {
        Self {
            user_id: user_id.map(str::to_owned),
            event_type,
            ..Self::default()
        }
    }

    pub fn with_user(mut self, user_id: impl Display) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    pub fn with_event_type(mut self, event_type: EventType) -> Self {
        self.event_type = event_type;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_qos(mut self, qos: QosLevel) -> Self {
        self.qos = qos;
        self
    }

    /// Role used by `set_sender_info` when the caller passes none.
    pub fn with_default_sender_role(mut self, role: impl Into<String>) -> Self {
        self.default_sender_role = role.into();
        self
    }

    pub fn set_sender_info(
        &mut self,
        sender_id: impl Into<String>,
        sender_name: impl Into<String>,
        sender_role: Option<&str>,
    ) -> &mut Self {
        let role = sender_role
            .filter(|role| !role.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| self.default_sender_role.clone());
        self.sender = Some(SenderInfo { id: sender_id.into(), name: sender_name.into(), role });
        self
    }

    pub fn set_data(&mut self, data: Option<JsonMap>) -> &mut Self {
        self.data = data.unwrap_or_default();
        self
    }

    /// Accepts an object, or `null` for an empty map.
    pub fn set_data_value(&mut self, data: JsonValue) -> Result<&mut Self, SyncCastError> {
        match data {
            JsonValue::Null => self.data = JsonMap::new(),
            JsonValue::Object(map) => self.data = map,
            other => {
                return Err(SyncCastError::payload("payload data must be a JSON object")
                    .with_detail("field", "data")
                    .with_detail("provided_type", json_type_name(&other)))
            }
        }
        Ok(self)
    }

    pub fn set_topic(&mut self, topic: impl Into<String>) -> Result<&mut Self, SyncCastError> {
        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err(SyncCastError::payload("invalid topic format")
                .with_detail("field", "topic")
                .with_detail("provided", topic));
        }
        self.topic = Some(topic);
        Ok(self)
    }

    pub fn set_scope(&mut self, scope: impl Into<ScopeRef>) -> &mut Self {
        let scope: ScopeRef = scope.into();
        self.scope = Some(scope.name().to_owned());
        self
    }

    /// Accepts a scope name or a scope object carrying a string `name`.
    pub fn set_scope_value(&mut self, scope: &JsonValue) -> Result<&mut Self, SyncCastError> {
        let name = match scope {
            JsonValue::String(name) => Some(name.as_str()),
            JsonValue::Object(object) => object.get("name").and_then(JsonValue::as_str),
            _ => None,
        };
        let Some(name) = name else {
            return Err(SyncCastError::payload(
                "scope must be a string or a scope object with a name",
            )
            .with_detail("field", "scope")
            .with_detail("provided_type", json_type_name(scope)));
        };
        self.scope = Some(name.to_owned());
        Ok(self)
    }

    pub fn set_metadata(
        &mut self,
        platform: impl Into<String>,
        device: impl Into<String>,
        location: impl Into<String>,
    ) -> &mut Self {
        self.metadata = Some(Metadata {
            platform: platform.into(),
            device: device.into(),
            location: location.into(),
        });
        self
    }

    pub fn set_action(&mut self, action_type: impl Into<String>, url: impl Into<String>) -> &mut Self {
        self.action = Some(Action { action_type: action_type.into(), url: url.into() });
        self
    }

    pub fn build(&self) -> Result<EventEnvelope, SyncCastError> {
        let Some(topic) = self.topic.clone() else {
            return Err(SyncCastError::payload("payload missing required 'topic'")
                .with_detail("field", "topic")
                .with_detail("scope", self.scope.clone())
                .with_detail("user", self.user_id.clone()));
        };
        Ok(EventEnvelope {
            user_id: self.user_id.clone(),
            event_type: self.event_type,
            priority: self.priority,
            qos: self.qos,
            scope: self.scope.clone(),
            topic,
            data: self.data.clone(),
            sender: self.sender.clone(),
            metadata: self.metadata.clone(),
            action: self.action.clone(),
        })
    }
}
