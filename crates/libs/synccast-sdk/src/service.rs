//! Event family services layered over the topic builder, payload builder and dispatcher.

mod families;

pub use families::{
    MessageService, NotificationService, PresenceService, StreamService, TypingService,
};

use crate::dispatcher::{DispatchResponse, Dispatcher};
use crate::endpoints;
use crate::error::{ErrorKind, SyncCastError};
use crate::payload::{
    Action, EventEnvelope, JsonMap, Metadata, PayloadBuilder, SYSTEM_SENDER_ROLE,
    USER_SENDER_ROLE,
};
use crate::scope::{ScopeProvider, ScopeRef};
use crate::topic::TopicBuilder;
use crate::types::{EventType, Priority, QosLevel};
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventFamily {
    Message,
    Typing,
    Presence,
    Notification,
    Stream,
}

impl EventFamily {
    pub fn name(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Typing => "typing",
            Self::Presence => "presence",
            Self::Notification => "notification",
            Self::Stream => "sync",
        }
    }

    pub fn default_scope(self) -> &'static str {
        match self {
            Self::Message | Self::Typing | Self::Presence => "chat",
            Self::Notification => "system",
            Self::Stream => "ui",
        }
    }

    pub fn default_channel(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Typing => "typing",
            Self::Presence => "presence",
            Self::Notification => "notification",
            Self::Stream => "sync",
        }
    }

    pub fn event_type(self) -> EventType {
        match self {
            Self::Message => EventType::ChatMessage,
            Self::Typing => EventType::UserTyping,
            Self::Presence => EventType::UserPresence,
            Self::Notification => EventType::SystemEvent,
            Self::Stream => EventType::UiDataSync,
        }
    }

    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Message => endpoints::push::MESSAGE,
            Self::Typing => endpoints::push::TYPING,
            Self::Presence => endpoints::push::PRESENCE,
            Self::Notification => endpoints::push::SYSTEM,
            Self::Stream => endpoints::data::SYNC,
        }
    }

    pub fn sender_role(self) -> &'static str {
        match self {
            Self::Notification => SYSTEM_SENDER_ROLE,
            _ => USER_SENDER_ROLE,
        }
    }

    /// Kind used for failures that are neither topic, payload nor transport faults.
    pub fn error_kind(self) -> ErrorKind {
        match self {
            Self::Message | Self::Typing => ErrorKind::Message,
            Self::Presence => ErrorKind::Presence,
            Self::Notification => ErrorKind::Notification,
            Self::Stream => ErrorKind::Api,
        }
    }

    /// Only system notifications may go out without a user.
    pub fn requires_user(self) -> bool {
        !matches!(self, Self::Notification)
    }

    /// Whether the event type may be overridden per request.
    pub fn accepts_event_type(self) -> bool {
        matches!(self, Self::Stream)
    }
}

impl fmt::Display for EventFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One event to publish. Unset fields fall back to the family defaults.
#[derive(Clone, Debug, Default)]
pub struct EventRequest {
    pub user_id: Option<String>,
    pub data: Option<JsonMap>,
    pub scope: Option<ScopeRef>,
    pub channel: Option<String>,
    pub topic: Option<String>,
    /// Room or target id, rendered as an extra topic segment.
    pub target: Option<String>,
    pub sender_name: Option<String>,
    pub sender_role: Option<String>,
    pub platform: Option<String>,
    pub device: Option<String>,
    pub location: Option<String>,
    pub priority: Option<Priority>,
    pub qos: Option<QosLevel>,
    pub action: Option<Action>,
    pub event_type: Option<EventType>,
}

impl EventRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: impl fmt::Display) -> Self {
        Self { user_id: Some(user_id.to_string()), ..Self::default() }
    }

    pub fn with_data(mut self, data: JsonMap) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_scope(mut self, scope: impl Into<ScopeRef>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_target(mut self, target: impl fmt::Display) -> Self {
        self.target = Some(target.to_string());
        self
    }

    pub fn with_sender(mut self, name: impl Into<String>, role: Option<&str>) -> Self {
        self.sender_name = Some(name.into());
        self.sender_role = role.map(str::to_owned);
        self
    }

    pub fn with_device(
        mut self,
        platform: Option<&str>,
        device: Option<&str>,
        location: Option<&str>,
    ) -> Self {
        self.platform = platform.map(str::to_owned);
        self.device = device.map(str::to_owned);
        self.location = location.map(str::to_owned);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_qos(mut self, qos: QosLevel) -> Self {
        self.qos = Some(qos);
        self
    }

    pub fn with_action(mut self, action_type: impl Into<String>, url: impl Into<String>) -> Self {
        self.action = Some(Action { action_type: action_type.into(), url: url.into() });
        self
    }

    pub fn with_event_type(mut self, event_type: EventType) -> Self {
        self.event_type = Some(event_type);
        self
    }
}

/// Shared publish routine behind every family service.
#[derive(Clone)]
pub struct EventPublisher {
    family: EventFamily,
    dispatcher: Arc<Dispatcher>,
    app_id: String,
    provider: Option<Arc<dyn ScopeProvider>>,
}

impl fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventPublisher")
            .field("family", &self.family)
            .field("app_id", &self.app_id)
            .field("base_url", &self.dispatcher.base_url())
            .field("has_provider", &self.provider.is_some())
            .finish()
    }
}

impl EventPublisher {
    pub fn new(
        family: EventFamily,
        dispatcher: Arc<Dispatcher>,
        app_id: impl Into<String>,
        provider: Option<Arc<dyn ScopeProvider>>,
    ) -> Self {
        Self { family, dispatcher, app_id: app_id.into(), provider }
    }

    pub fn family(&self) -> EventFamily {
        self.family
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Builds the envelope and posts it to the family endpoint.
    pub fn publish(&self, request: &EventRequest) -> Result<DispatchResponse, SyncCastError> {
        let envelope = self.prepare(request)?;
        let body = envelope.to_value().map_err(|err| {
            SyncCastError::new(
                self.family.error_kind(),
                format!("failed to publish {} event", self.family),
            )
            .with_detail("error", err.message.clone())
            .with_detail("topic", envelope.topic.clone())
            .with_source(err)
        })?;
        log::debug!("service: publishing {} event to {}", self.family, envelope.topic);
        self.dispatcher.post(self.family.endpoint(), Some(&body), None)
    }

    /// Resolves topic and payload without touching the network.
    pub fn prepare(&self, request: &EventRequest) -> Result<EventEnvelope, SyncCastError> {
        let family = self.family;
        if family.requires_user() && request.user_id.as_deref().map_or(true, str::is_empty) {
            return Err(SyncCastError::validation(format!(
                "user_id is required for {family} events"
            ))
            .with_detail("field", "user_id"));
        }
        let scope = request
            .scope
            .clone()
            .unwrap_or_else(|| ScopeRef::from(family.default_scope()));
        let scope_name = scope.name().to_owned();
        let channel = request.channel.as_deref().unwrap_or(family.default_channel());

        let topic = match request.topic.as_deref() {
            Some(topic) if !topic.is_empty() => topic.to_owned(),
            _ => self.build_topic(scope.clone(), channel, request).map_err(|err| {
                err.rewrap(ErrorKind::Topic, format!("invalid topic for {family} event"))
                    .with_detail("scope", scope_name.clone())
                    .with_detail("channel", channel)
                    .with_detail("target", request.target.clone())
            })?,
        };

        self.build_payload(scope, &topic, request).map_err(|err| {
            err.rewrap(ErrorKind::Payload, format!("invalid {family} payload"))
                .with_detail("user_id", request.user_id.clone())
                .with_detail("topic", topic.clone())
        })
    }

    fn build_topic(
        &self,
        scope: ScopeRef,
        channel: &str,
        request: &EventRequest,
    ) -> Result<String, SyncCastError> {
        let mut builder = TopicBuilder::new(self.app_id.as_str(), scope, self.provider.as_deref())?;
        builder.channel(channel)?;
        if let Some(target) = request.target.as_deref().filter(|target| !target.is_empty()) {
            builder.extra([target]);
        }
        if let Some(user_id) = request.user_id.as_deref().filter(|user| !user.is_empty()) {
            builder.for_user(user_id);
        }
        builder.build()
    }

    fn build_payload(
        &self,
        scope: ScopeRef,
        topic: &str,
        request: &EventRequest,
    ) -> Result<EventEnvelope, SyncCastError> {
        let event_type = request
            .event_type
            .filter(|_| self.family.accepts_event_type())
            .unwrap_or(self.family.event_type());
        let mut builder = PayloadBuilder::for_event(request.user_id.as_deref(), event_type)
            .with_priority(request.priority.unwrap_or_default())
            .with_qos(request.qos.unwrap_or_default())
            .with_default_sender_role(self.family.sender_role());
        builder.set_scope(scope).set_topic(topic)?.set_data(request.data.clone());

        if let (Some(name), Some(user_id)) =
            (request.sender_name.as_deref(), request.user_id.as_deref())
        {
            if !name.is_empty() {
                builder.set_sender_info(user_id, name, request.sender_role.as_deref());
            }
        }
        if let Some(metadata) = Metadata::from_parts(
            request.platform.as_deref(),
            request.device.as_deref(),
            request.location.as_deref(),
        ) {
            builder.set_metadata(metadata.platform, metadata.device, metadata.location);
        }
        if let Some(action) = &request.action {
            builder.set_action(action.action_type.clone(), action.url.clone());
        }
        builder.build()
    }
}
