use crate::error::SyncCastError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum EventType {
    #[default]
    PushAlert,
    ChatMessage,
    UserTyping,
    UserPresence,
    SystemEvent,
    UiDataSync,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PushAlert => "push_alert",
            Self::ChatMessage => "chat_message",
            Self::UserTyping => "user_typing",
            Self::UserPresence => "user_presence",
            Self::SystemEvent => "system_event",
            Self::UiDataSync => "ui_data_sync",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = SyncCastError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "push_alert" => Ok(Self::PushAlert),
            "chat_message" => Ok(Self::ChatMessage),
            "user_typing" => Ok(Self::UserTyping),
            "user_presence" => Ok(Self::UserPresence),
            "system_event" => Ok(Self::SystemEvent),
            "ui_data_sync" => Ok(Self::UiDataSync),
            _ => Err(SyncCastError::validation(format!("unknown event type '{raw}'"))
                .with_detail("field", "type")
                .with_detail("provided", raw)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = SyncCastError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "normal" | "medium" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            _ => Err(SyncCastError::validation(format!("unknown priority '{raw}'"))
                .with_detail("field", "priority")
                .with_detail("provided", raw)),
        }
    }
}

/// MQTT delivery guarantee. Travels on the wire as its integer level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QosLevel {
    AtMostOnce,
    #[default]
    AtLeastOnce,
    ExactlyOnce,
}

impl QosLevel {
    pub fn level(self) -> u8 {
        match self {
            Self::AtMostOnce => 0,
            Self::AtLeastOnce => 1,
            Self::ExactlyOnce => 2,
        }
    }
}

impl TryFrom<u8> for QosLevel {
    type Error = SyncCastError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Self::AtMostOnce),
            1 => Ok(Self::AtLeastOnce),
            2 => Ok(Self::ExactlyOnce),
            _ => Err(SyncCastError::validation(format!("qos level must be 0, 1 or 2, got {level}"))
                .with_detail("field", "qos")
                .with_detail("provided", level)),
        }
    }
}

impl Serialize for QosLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.level())
    }
}

impl<'de> Deserialize<'de> for QosLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let level = u8::deserialize(deserializer)?;
        Self::try_from(level).map_err(serde::de::Error::custom)
    }
}
