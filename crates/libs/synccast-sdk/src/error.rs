use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use thiserror::Error;

pub mod code {
    pub const CONFIG_ERROR: &str = "config_error";
    pub const TOPIC_ERROR: &str = "topic_error";
    pub const PAYLOAD_ERROR: &str = "payload_error";
    pub const DISPATCH_ERROR: &str = "dispatch_error";
    pub const API_ERROR: &str = "api_error";
    pub const VALIDATION_ERROR: &str = "validation_error";
    pub const PRESENCE_ERROR: &str = "presence_error";
    pub const NOTIFICATION_ERROR: &str = "notification_error";
    pub const MESSAGE_ERROR: &str = "message_error";
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorKind {
    Config,
    Topic,
    Payload,
    Dispatch,
    Api,
    Validation,
    Presence,
    Notification,
    Message,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::Config => code::CONFIG_ERROR,
            Self::Topic => code::TOPIC_ERROR,
            Self::Payload => code::PAYLOAD_ERROR,
            Self::Dispatch => code::DISPATCH_ERROR,
            Self::Api => code::API_ERROR,
            Self::Validation => code::VALIDATION_ERROR,
            Self::Presence => code::PRESENCE_ERROR,
            Self::Notification => code::NOTIFICATION_ERROR,
            Self::Message => code::MESSAGE_ERROR,
        }
    }
}

pub type ErrorDetails = BTreeMap<String, JsonValue>;

type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every fault raised by the SDK.
///
/// The `kind` selects the machine code, `details` carries structured context
/// for logs and API boundaries, and `source` keeps the wrapped cause when an
/// error was re-raised with extra context.
#[derive(Debug, Error)]
#[error("[{}] {}", .kind.code(), .message)]
#[non_exhaustive]
pub struct SyncCastError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: ErrorDetails,
    #[source]
    source: Option<BoxedCause>,
}

/// Serializable view of an error: `{"error": code, "message": ..., "details": {...}}`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorReport {
    pub error: String,
    pub message: String,
    #[serde(default)]
    pub details: ErrorDetails,
}

impl SyncCastError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), details: ErrorDetails::new(), source: None }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn topic(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Topic, message)
    }

    pub fn payload(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Payload, message)
    }

    pub fn dispatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Dispatch, message)
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Api, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.details.extend(details);
        self
    }

    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Re-raises this error under `kind` with a new message.
    ///
    /// The context map carries over so callers further up still see the
    /// offending scope/channel/topic, and the original becomes the `source`.
    pub fn rewrap(self, kind: ErrorKind, message: impl Into<String>) -> Self {
        let details = self.details.clone();
        Self::new(kind, message).with_details(details).with_source(self)
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn detail(&self, key: &str) -> Option<&JsonValue> {
        self.details.get(key)
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            error: self.code().to_owned(),
            message: self.message.clone(),
            details: self.details.clone(),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        serde_json::json!({
            "error": self.code(),
            "message": self.message,
            "details": self.details,
        })
    }
}
