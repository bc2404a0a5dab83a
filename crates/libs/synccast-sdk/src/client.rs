use crate::dispatcher::Dispatcher;
use crate::error::SyncCastError;
use crate::payload::PayloadBuilder;
use crate::scope::{InMemoryScopeRegistry, ScopeProvider, ScopeRef};
use crate::service::{
    MessageService, NotificationService, PresenceService, StreamService, TypingService,
};
use crate::topic::{TopicBuilder, DEFAULT_APP_ID};
use crate::types::{EventType, SyncCastConfig};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// SDK entry point. Owns the configuration and the scope provider, and
/// builds the shared dispatcher and the family services on first use.
pub struct SyncCast {
    config: SyncCastConfig,
    provider: Arc<dyn ScopeProvider>,
    dispatcher: OnceLock<Arc<Dispatcher>>,
    message: OnceLock<MessageService>,
    typing: OnceLock<TypingService>,
    presence: OnceLock<PresenceService>,
    notification: OnceLock<NotificationService>,
    stream: OnceLock<StreamService>,
}

impl fmt::Debug for SyncCast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncCast")
            .field("api_base", &self.config.api_base)
            .field("app_id", &self.config.app_id)
            .field("dispatcher_ready", &self.dispatcher.get().is_some())
            .finish()
    }
}

impl SyncCast {
    /// Validates `config` and registers its scopes in an in-memory registry.
    pub fn new(config: SyncCastConfig) -> Result<Self, SyncCastError> {
        config.validate()?;
        let registry = InMemoryScopeRegistry::from_config(&config.scopes)?;
        Ok(Self::assemble(config, Arc::new(registry)))
    }

    /// Like [`SyncCast::new`], but resolves scope names through `provider`.
    pub fn with_provider(
        config: SyncCastConfig,
        provider: Arc<dyn ScopeProvider>,
    ) -> Result<Self, SyncCastError> {
        config.validate()?;
        Ok(Self::assemble(config, provider))
    }

    fn assemble(config: SyncCastConfig, provider: Arc<dyn ScopeProvider>) -> Self {
        Self {
            config,
            provider,
            dispatcher: OnceLock::new(),
            message: OnceLock::new(),
            typing: OnceLock::new(),
            presence: OnceLock::new(),
            notification: OnceLock::new(),
            stream: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &SyncCastConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<dyn ScopeProvider> {
        &self.provider
    }

    pub fn app_id(&self) -> &str {
        self.config.app_id.as_deref().filter(|id| !id.is_empty()).unwrap_or(DEFAULT_APP_ID)
    }

    /// Replaces the credentials and drops every cached dispatcher and service.
    pub fn set_credentials(
        &mut self,
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
    ) -> Result<(), SyncCastError> {
        let mut config = self.config.clone();
        config.app_id = Some(app_id.into());
        config.app_secret = Some(app_secret.into());
        config.validate()?;
        self.config = config;
        self.dispatcher = OnceLock::new();
        self.message = OnceLock::new();
        self.typing = OnceLock::new();
        self.presence = OnceLock::new();
        self.notification = OnceLock::new();
        self.stream = OnceLock::new();
        log::debug!("sdk: credentials replaced for app {}", self.app_id());
        Ok(())
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        self.dispatcher.get_or_init(|| Arc::new(Dispatcher::new(&self.config))).clone()
    }

    fn service_parts(&self) -> (Arc<Dispatcher>, String, Option<Arc<dyn ScopeProvider>>) {
        (self.dispatcher(), self.app_id().to_owned(), Some(self.provider.clone()))
    }

    pub fn message(&self) -> &MessageService {
        self.message.get_or_init(|| {
            let (dispatcher, app_id, provider) = self.service_parts();
            MessageService::new(dispatcher, app_id, provider)
        })
    }

    pub fn typing(&self) -> &TypingService {
        self.typing.get_or_init(|| {
            let (dispatcher, app_id, provider) = self.service_parts();
            TypingService::new(dispatcher, app_id, provider)
        })
    }

    pub fn presence(&self) -> &PresenceService {
        self.presence.get_or_init(|| {
            let (dispatcher, app_id, provider) = self.service_parts();
            PresenceService::new(dispatcher, app_id, provider)
        })
    }

    pub fn notification(&self) -> &NotificationService {
        self.notification.get_or_init(|| {
            let (dispatcher, app_id, provider) = self.service_parts();
            NotificationService::new(dispatcher, app_id, provider)
        })
    }

    pub fn stream(&self) -> &StreamService {
        self.stream.get_or_init(|| {
            let (dispatcher, app_id, provider) = self.service_parts();
            StreamService::new(dispatcher, app_id, provider)
        })
    }

    pub fn topic_builder(&self, scope: impl Into<ScopeRef>) -> Result<TopicBuilder, SyncCastError> {
        TopicBuilder::new(self.app_id(), scope, Some(self.provider.as_ref()))
    }

    pub fn payload_builder(&self, user_id: Option<&str>, event_type: EventType) -> PayloadBuilder {
        PayloadBuilder::for_event(user_id, event_type)
    }
}
