use super::{EventFamily, EventPublisher, EventRequest};
use crate::dispatcher::{DispatchResponse, Dispatcher};
use crate::error::SyncCastError;
use crate::scope::ScopeProvider;
use std::sync::Arc;

/// Chat messages, posted to `/push/message`.
#[derive(Clone, Debug)]
pub struct MessageService {
    publisher: EventPublisher,
}

impl MessageService {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        app_id: impl Into<String>,
        provider: Option<Arc<dyn ScopeProvider>>,
    ) -> Self {
        Self { publisher: EventPublisher::new(EventFamily::Message, dispatcher, app_id, provider) }
    }

    pub fn send_message(&self, request: &EventRequest) -> Result<DispatchResponse, SyncCastError> {
        self.publisher.publish(request)
    }

    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }
}

/// Typing indicators, posted to `/push/typing`.
#[derive(Clone, Debug)]
pub struct TypingService {
    publisher: EventPublisher,
}

impl TypingService {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        app_id: impl Into<String>,
        provider: Option<Arc<dyn ScopeProvider>>,
    ) -> Self {
        Self { publisher: EventPublisher::new(EventFamily::Typing, dispatcher, app_id, provider) }
    }

    pub fn send_typing(&self, request: &EventRequest) -> Result<DispatchResponse, SyncCastError> {
        self.publisher.publish(request)
    }

    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }
}

#[derive(Clone, Debug)]
pub struct PresenceService {
    publisher: EventPublisher,
}

impl PresenceService {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        app_id: impl Into<String>,
        provider: Option<Arc<dyn ScopeProvider>>,
    ) -> Self {
        Self { publisher: EventPublisher::new(EventFamily::Presence, dispatcher, app_id, provider) }
    }

    pub fn send_presence(&self, request: &EventRequest) -> Result<DispatchResponse, SyncCastError> {
        self.publisher.publish(request)
    }

    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }
}

/// System notices. The user is optional; sender info needs one.
#[derive(Clone, Debug)]
pub struct NotificationService {
    publisher: EventPublisher,
}

impl NotificationService {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        app_id: impl Into<String>,
        provider: Option<Arc<dyn ScopeProvider>>,
    ) -> Self {
        Self {
            publisher: EventPublisher::new(EventFamily::Notification, dispatcher, app_id, provider),
        }
    }

    pub fn send_notification(
        &self,
        request: &EventRequest,
    ) -> Result<DispatchResponse, SyncCastError> {
        self.publisher.publish(request)
    }

    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }
}

/// UI data sync updates, posted to `/data/sync`.
#[derive(Clone, Debug)]
pub struct StreamService {
    publisher: EventPublisher,
}

impl StreamService {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        app_id: impl Into<String>,
        provider: Option<Arc<dyn ScopeProvider>>,
    ) -> Self {
        Self { publisher: EventPublisher::new(EventFamily::Stream, dispatcher, app_id, provider) }
    }

    pub fn send_update(&self, request: &EventRequest) -> Result<DispatchResponse, SyncCastError> {
        self.publisher.publish(request)
    }

    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }
}
